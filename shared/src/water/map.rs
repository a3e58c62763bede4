//! All lakes of a loaded map and the queries built on top of them.

use bevy::math::IVec2;
use bevy_ecs::resource::Resource;
use bevy_log::{debug, info, warn};

use super::{
    CornerOwnership, Lake, LakeFinder, LakeId, LakeRecord, ParsedLakeRecords, WaterError,
};
use crate::world::{CornerRect, Terrain};

/// Outcome of a load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records skipped while parsing, plus lakes that turned out empty.
    pub rejected: usize,
}

/// The lakes of a map, in load order, with the corner ownership they share
/// and a per-cell water map for fast queries.
#[derive(Resource, Debug, Default)]
pub struct WaterMap {
    lakes: Vec<Lake>,
    ownership: CornerOwnership,
    /// One flag per map cell, set when any of its corners is in a lake.
    cell_water: Vec<bool>,
    cell_width: i32,
    cell_height: i32,
    next_id: u32,
}

impl WaterMap {
    pub fn new<T: Terrain + ?Sized>(terrain: &T) -> Self {
        let cell_width = (terrain.width_corners() - 1).max(0);
        let cell_height = (terrain.height_corners() - 1).max(0);
        Self {
            lakes: Vec::new(),
            ownership: CornerOwnership::for_terrain(terrain),
            cell_water: vec![false; (cell_width * cell_height) as usize],
            cell_width,
            cell_height,
            next_id: 0,
        }
    }

    /// Drops every lake and rebuilds them from persisted records, in order.
    pub fn load_records<T: Terrain + ?Sized>(
        &mut self,
        parsed: ParsedLakeRecords,
        terrain: &T,
    ) -> LoadReport {
        *self = Self::new(terrain);
        let mut report = LoadReport {
            loaded: 0,
            rejected: parsed.rejected.len(),
        };
        for record in parsed.records {
            match self.insert_lake(record.origin(), record.search_bounds(), record.level, terrain) {
                Ok(_) => report.loaded += 1,
                Err(e) => {
                    warn!("Could not load lake at {}: {}", record.origin(), e);
                    report.rejected += 1;
                }
            }
        }
        self.rebuild_cell_map();
        info!(
            "Loaded {} lakes ({} rejected)",
            report.loaded, report.rejected
        );
        report
    }

    /// Delineates a new lake, as done while editing a map.
    pub fn add_lake<T: Terrain + ?Sized>(
        &mut self,
        seed: IVec2,
        search_bounds: CornerRect,
        level: f32,
        terrain: &T,
    ) -> Result<LakeId, WaterError> {
        let id = self.insert_lake(seed, search_bounds, level, terrain)?;
        self.rebuild_cell_map();
        Ok(id)
    }

    fn insert_lake<T: Terrain + ?Sized>(
        &mut self,
        seed: IVec2,
        search_bounds: CornerRect,
        level: f32,
        terrain: &T,
    ) -> Result<LakeId, WaterError> {
        let id = LakeId(self.next_id);
        self.next_id += 1;

        let found = LakeFinder::new(terrain, &mut self.ownership)
            .find_water(id, seed, search_bounds, level)
            .and_then(|lake| {
                if lake.is_empty() {
                    Err(WaterError::EmptyLake { id, level })
                } else if lake.chunks.is_empty() {
                    Err(WaterError::NoChunks { id })
                } else {
                    Ok(lake)
                }
            });
        match found {
            Ok(lake) => {
                self.lakes.push(lake);
                Ok(id)
            }
            Err(e) => {
                // Refused lakes must not keep corners other lakes could reach.
                let released = self.ownership.release(id);
                debug!("Released {} corners of refused lake {}", released, id);
                Err(e)
            }
        }
    }

    pub fn lakes(&self) -> &[Lake] {
        &self.lakes
    }

    pub fn lake(&self, id: LakeId) -> Option<&Lake> {
        self.lakes.iter().find(|lake| lake.id == id)
    }

    pub fn ownership(&self) -> &CornerOwnership {
        &self.ownership
    }

    /// Records to persist, in load order.
    pub fn records(&self) -> Vec<LakeRecord> {
        self.lakes.iter().map(Lake::record).collect()
    }

    pub fn is_underwater(&self, x: i32, y: i32) -> bool {
        self.lake_at_corner(x, y).is_some()
    }

    /// Lake containing the corner, if any. Shoreline corners inside a
    /// lake's bounds but outside its mask are dry.
    pub fn lake_at_corner(&self, x: i32, y: i32) -> Option<&Lake> {
        self.lakes.iter().find(|lake| lake.has_corner(x, y))
    }

    /// Water depth above a corner, 0 on dry land.
    pub fn water_depth_at_corner<T: Terrain + ?Sized>(&self, x: i32, y: i32, terrain: &T) -> f32 {
        self.lake_at_corner(x, y).map_or(0.0, |lake| {
            lake.depth_at(terrain.ground_height_at_corner(x, y))
        })
    }

    /// A cell is water when any of its four corners is.
    pub fn is_cell_water(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.cell_width || y >= self.cell_height {
            return false;
        }
        self.cell_water[(y * self.cell_width + x) as usize]
    }

    fn rebuild_cell_map(&mut self) {
        self.cell_water.fill(false);
        for lake in &self.lakes {
            for corner in lake.corners() {
                // Each corner touches up to four cells.
                for (dx, dy) in [(-1, -1), (0, -1), (-1, 0), (0, 0)] {
                    let (cx, cy) = (corner.x + dx, corner.y + dy);
                    if cx >= 0 && cy >= 0 && cx < self.cell_width && cy < self.cell_height {
                        self.cell_water[(cy * self.cell_width + cx) as usize] = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::save::lake_records_from_ron;
    use crate::world::HeightMap;

    /// Two basins split by a ridge at x = 12, and a dry plateau for y >= 16.
    fn two_basins() -> HeightMap {
        HeightMap::from_fn(25, 21, |x, y| {
            if y >= 16 || x == 12 {
                4.0
            } else {
                (x % 3) as f32 * 0.25
            }
        })
    }

    fn record(origin: (i32, i32), level: f32) -> LakeRecord {
        LakeRecord {
            min_x: 0,
            min_y: 0,
            max_x: 24,
            max_y: 20,
            origin_x: origin.0,
            origin_y: origin.1,
            level,
        }
    }

    #[test]
    fn test_load_rejects_empty_lakes() {
        let map = two_basins();
        let mut water = WaterMap::new(&map);
        let parsed = ParsedLakeRecords {
            records: vec![record((2, 2), 1.0), record((4, 18), 1.0), record((20, 3), 1.0)],
            rejected: Vec::new(),
        };

        let report = water.load_records(parsed, &map);

        assert_eq!(
            report,
            LoadReport {
                loaded: 2,
                rejected: 1
            }
        );
        assert_eq!(water.lakes().len(), 2);
        assert!(water.lake(LakeId(0)).is_some());
        assert!(water.lake(LakeId(1)).is_none());
        assert!(water.lake(LakeId(2)).is_some());
    }

    #[test]
    fn test_reload_replaces_previous_lakes() {
        let map = two_basins();
        let mut water = WaterMap::new(&map);
        let parsed = || ParsedLakeRecords {
            records: vec![record((2, 2), 1.0)],
            rejected: Vec::new(),
        };
        water.load_records(parsed(), &map);
        let claimed = water.ownership().claimed_count();

        water.load_records(parsed(), &map);

        assert_eq!(water.lakes().len(), 1);
        assert_eq!(water.ownership().claimed_count(), claimed);
    }

    #[test]
    fn test_corner_and_cell_queries() {
        let map = two_basins();
        let mut water = WaterMap::new(&map);
        let id = water
            .add_lake(IVec2::new(2, 2), map.corner_rect(), 1.0, &map)
            .unwrap();

        assert!(water.is_underwater(0, 0));
        assert!(water.is_underwater(11, 15));
        assert!(!water.is_underwater(12, 3));
        assert!(!water.is_underwater(13, 3));
        assert_eq!(water.lake_at_corner(5, 5).map(|lake| lake.id), Some(id));

        // Ground at x % 3 == 2 sits at 0.5.
        assert!((water.water_depth_at_corner(2, 0, &map) - 0.5).abs() < 1e-6);
        assert!((water.water_depth_at_corner(3, 0, &map) - 1.0).abs() < 1e-6);
        assert_eq!(water.water_depth_at_corner(12, 0, &map), 0.0);

        // West of the ridge the cell touches the lake, east of it nothing does.
        assert!(water.is_cell_water(11, 0));
        assert!(!water.is_cell_water(12, 0));
        assert!(water.is_cell_water(0, 15));
        assert!(!water.is_cell_water(0, 16));
        assert!(!water.is_cell_water(-1, 0));
    }

    #[test]
    fn test_records_round_trip_through_the_map() {
        let map = two_basins();
        let mut water = WaterMap::new(&map);
        water
            .add_lake(IVec2::new(2, 2), map.corner_rect(), 1.0, &map)
            .unwrap();
        water
            .add_lake(IVec2::new(20, 3), map.corner_rect(), 0.6, &map)
            .unwrap();
        assert!(matches!(
            water.add_lake(IVec2::new(5, 19), map.corner_rect(), 1.0, &map),
            Err(WaterError::EmptyLake { .. })
        ));

        let saved = water.records();
        let serialized = crate::water::save::lake_records_to_ron(&saved).unwrap();
        let mut reloaded = WaterMap::new(&map);
        reloaded.load_records(lake_records_from_ron(&serialized).unwrap(), &map);

        assert_eq!(reloaded.records(), saved);
        for (before, after) in water.lakes().iter().zip(reloaded.lakes()) {
            assert_eq!(before.bounds, after.bounds);
            assert_eq!(
                before.corners().collect::<Vec<_>>(),
                after.corners().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_lake_without_chunks_is_rejected() {
        let mut map = HeightMap::flat(8, 8, 2.0);
        map.set_height(3, 3, 0.0);
        map.set_height(4, 3, 0.0);
        let mut water = WaterMap::new(&map);

        let result = water.add_lake(IVec2::new(3, 3), map.corner_rect(), 1.0, &map);

        assert!(matches!(result, Err(WaterError::NoChunks { .. })));
        assert!(water.lakes().is_empty());
        assert_eq!(water.ownership().claimed_count(), 0);
    }

    #[test]
    fn test_refused_lake_leaves_corners_to_later_lakes() {
        let mut map = HeightMap::flat(8, 8, 2.0);
        map.set_height(3, 3, 0.0);
        map.set_height(4, 3, 0.0);
        let mut water = WaterMap::new(&map);

        assert!(water
            .add_lake(IVec2::new(3, 3), map.corner_rect(), 1.0, &map)
            .is_err());
        let id = water
            .add_lake(IVec2::new(0, 0), map.corner_rect(), 3.0, &map)
            .unwrap();

        let lake = water.lake(id).unwrap();
        assert_eq!(lake.corner_count(), 64);
        assert!(lake.has_corner(3, 3));
        assert_eq!(water.ownership().owner(IVec2::new(3, 3)), Some(id));
        assert!(water.is_underwater(3, 3));
        assert_eq!(water.water_depth_at_corner(3, 3, &map), 3.0);
    }
}
