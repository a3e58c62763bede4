use bevy::prelude::*;

/// Plane `normal · p + distance = 0`, stored normalized so distances are in
/// world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        let normal = Vec3::new(a, b, c);
        let length = normal.length();
        if length > 0.0 {
            Self {
                normal: normal / length,
                distance: d / length,
            }
        } else {
            Self {
                normal: Vec3::ZERO,
                distance: 0.0,
            }
        }
    }

    /// Signed distance, positive on the side the normal points to.
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FrustumPlane {
    Left = 0,
    Right = 1,
    Bottom = 2,
    Top = 3,
    Near = 4,
    Far = 5,
}

/// View frustum with inward facing planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Gribb-Hartmann plane extraction from a combined view-projection matrix.
    pub fn from_view_projection_matrix(view_projection: &Mat4) -> Self {
        let m = view_projection.to_cols_array();
        let mut planes = [Plane::new(0.0, 0.0, 0.0, 0.0); 6];

        planes[FrustumPlane::Left as usize] =
            Plane::new(m[3] + m[0], m[7] + m[4], m[11] + m[8], m[15] + m[12]);
        planes[FrustumPlane::Right as usize] =
            Plane::new(m[3] - m[0], m[7] - m[4], m[11] - m[8], m[15] - m[12]);
        planes[FrustumPlane::Bottom as usize] =
            Plane::new(m[3] + m[1], m[7] + m[5], m[11] + m[9], m[15] + m[13]);
        planes[FrustumPlane::Top as usize] =
            Plane::new(m[3] - m[1], m[7] - m[5], m[11] - m[9], m[15] - m[13]);
        // Reverse z: depth is w at the near plane and 0 at the far plane.
        // With an infinite projection the far plane degenerates and never culls.
        planes[FrustumPlane::Near as usize] =
            Plane::new(m[3] - m[2], m[7] - m[6], m[11] - m[10], m[15] - m[14]);
        planes[FrustumPlane::Far as usize] = Plane::new(m[2], m[6], m[10], m[14]);

        Self { planes }
    }

    /// Builds the frustum of a camera from its transform and projection.
    pub fn from_camera(transform: &GlobalTransform, clip_from_view: Mat4) -> Self {
        let view_projection = clip_from_view * transform.compute_matrix().inverse();
        Self::from_view_projection_matrix(&view_projection)
    }

    /// Returns 0 when the sphere is completely outside, otherwise its
    /// distance from the near plane plus `radius` (always positive).
    pub fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> f32 {
        for plane in &self.planes {
            if plane.distance_to_point(center) <= -radius {
                return 0.0;
            }
        }
        self.planes[FrustumPlane::Near as usize].distance_to_point(center) + radius
    }

    /// P-vertex test: a box is rejected as soon as its corner furthest along
    /// a plane normal lies behind that plane.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            let p_vertex = Vec3::new(
                if plane.normal.x >= 0.0 { max.x } else { min.x },
                if plane.normal.y >= 0.0 { max.y } else { min.y },
                if plane.normal.z >= 0.0 { max.z } else { min.z },
            );
            if plane.distance_to_point(p_vertex) < 0.0 {
                return false;
            }
        }
        true
    }
}
