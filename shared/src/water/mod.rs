//! Lake delineation and bookkeeping.
//!
//! A lake is a connected set of height map corners lying below a flat water
//! level. Lakes are never stored corner by corner: only the seed corner, the
//! search rectangle and the level are persisted, and the corner set is
//! recomputed from the terrain every time a map is loaded.
//!
//! ## Pipeline
//!
//! ```text
//!  LakeRecord (water.ron)
//!        │
//!        ▼
//!  LakeFinder::find_water ──► Lake ──► LakeChunk tiles (pruned < 4 corners)
//!        │                      │
//!        ▼                      ▼
//!  CornerOwnership         WaterMap (cell water map, depth queries)
//! ```

pub mod chunk;
pub mod error;
pub mod finder;
pub mod lake;
pub mod map;
pub mod ownership;
pub mod save;

pub use chunk::{decompose_into_chunks, tile_rects, LakeChunk};
pub use error::{RecordError, WaterError};
pub use finder::LakeFinder;
pub use lake::Lake;
pub use map::{LoadReport, WaterMap};
pub use ownership::{CornerOwnership, LakeId};
pub use save::{load_lake_records, save_lake_records, LakeRecord, ParsedLakeRecords};
