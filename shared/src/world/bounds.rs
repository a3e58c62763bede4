//! Inclusive rectangles over the height map corner grid.

use bevy::math::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::CORNER_SPACING;

/// Rectangle of grid corners, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CornerRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl CornerRect {
    pub fn new(min: IVec2, max: IVec2) -> Self {
        Self { min, max }
    }

    /// Creates a rectangle covering a single corner.
    pub fn from_point(pos: IVec2) -> Self {
        Self { min: pos, max: pos }
    }

    /// Expands the rectangle to include the given corner.
    pub fn expand(&mut self, pos: IVec2) {
        self.min = self.min.min(pos);
        self.max = self.max.max(pos);
    }

    /// A rectangle whose min exceeds its max on either axis covers nothing.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    #[inline]
    pub fn contains(&self, pos: IVec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Returns true if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &CornerRect) -> bool {
        other.is_valid() && self.contains(other.min) && self.contains(other.max)
    }

    /// Number of corners along x.
    #[inline]
    pub fn width(&self) -> i32 {
        (self.max.x - self.min.x + 1).max(0)
    }

    /// Number of corners along y.
    #[inline]
    pub fn height(&self) -> i32 {
        (self.max.y - self.min.y + 1).max(0)
    }

    pub fn corner_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Number of grid cells (quads) enclosed by the corners.
    pub fn cell_count(&self) -> usize {
        (self.width() - 1).max(0) as usize * (self.height() - 1).max(0) as usize
    }

    /// Grows the rectangle by `amount` corners on every side.
    pub fn grown(&self, amount: i32) -> Self {
        Self {
            min: self.min - IVec2::splat(amount),
            max: self.max + IVec2::splat(amount),
        }
    }

    /// Intersection of both rectangles, `None` when they are disjoint.
    pub fn intersection(&self, other: &CornerRect) -> Option<Self> {
        let rect = Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        };
        rect.is_valid().then_some(rect)
    }

    /// Row-major index of a corner inside this rectangle.
    #[inline]
    pub fn index_of(&self, pos: IVec2) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let local = pos - self.min;
        Some(local.y as usize * self.width() as usize + local.x as usize)
    }

    /// Iterates over every corner in row-major order.
    pub fn corners(&self) -> impl Iterator<Item = IVec2> {
        let rect = *self;
        (rect.min.y..=rect.max.y)
            .flat_map(move |y| (rect.min.x..=rect.max.x).map(move |x| IVec2::new(x, y)))
    }

    /// Midpoint in world units on the horizontal plane.
    pub fn world_center(&self) -> Vec2 {
        (self.min.as_vec2() + self.max.as_vec2()) * 0.5 * CORNER_SPACING
    }

    /// Half the diagonal, in world units.
    pub fn world_half_diagonal(&self) -> f32 {
        (self.max - self.min).as_vec2().length() * 0.5 * CORNER_SPACING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_and_extent() {
        let mut rect = CornerRect::from_point(IVec2::new(3, 4));
        rect.expand(IVec2::new(1, 7));
        assert_eq!(rect.min, IVec2::new(1, 4));
        assert_eq!(rect.max, IVec2::new(3, 7));
        assert_eq!(rect.width(), 3);
        assert_eq!(rect.height(), 4);
        assert_eq!(rect.corner_count(), 12);
        assert_eq!(rect.cell_count(), 6);
    }

    #[test]
    fn test_intersection() {
        let a = CornerRect::new(IVec2::ZERO, IVec2::new(4, 4));
        let b = CornerRect::new(IVec2::new(3, -2), IVec2::new(9, 2));
        assert_eq!(
            a.intersection(&b),
            Some(CornerRect::new(IVec2::new(3, 0), IVec2::new(4, 2)))
        );

        let far = CornerRect::new(IVec2::new(10, 10), IVec2::new(12, 12));
        assert_eq!(a.intersection(&far), None);
    }

    #[test]
    fn test_index_of_is_row_major() {
        let rect = CornerRect::new(IVec2::new(2, 2), IVec2::new(4, 3));
        assert_eq!(rect.index_of(IVec2::new(2, 2)), Some(0));
        assert_eq!(rect.index_of(IVec2::new(4, 2)), Some(2));
        assert_eq!(rect.index_of(IVec2::new(2, 3)), Some(3));
        assert_eq!(rect.index_of(IVec2::new(5, 3)), None);
        assert_eq!(rect.corners().count(), rect.corner_count());
    }

    #[test]
    fn test_world_sphere() {
        let rect = CornerRect::new(IVec2::ZERO, IVec2::new(6, 8));
        assert_eq!(rect.world_center(), Vec2::new(3.0, 4.0));
        assert!((rect.world_half_diagonal() - 5.0).abs() < 1e-5);
    }
}
