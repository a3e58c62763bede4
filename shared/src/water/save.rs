//! Persisted lake records.
//!
//! Only the search rectangle, the origin corner and the level are written.
//! Records are read leniently: a record with a missing or malformed field is
//! skipped on its own and the rest of the file still loads.

use std::{fs, path::Path};

use bevy::math::IVec2;
use bevy_log::{error, info};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use super::{RecordError, WaterError};
use crate::world::CornerRect;

/// What is saved of a lake: where to search, where to start and how high
/// the water stands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LakeRecord {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub level: f32,
}

impl LakeRecord {
    pub fn search_bounds(&self) -> CornerRect {
        CornerRect::new(
            IVec2::new(self.min_x, self.min_y),
            IVec2::new(self.max_x, self.max_y),
        )
    }

    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.origin_x, self.origin_y)
    }
}

#[derive(Serialize)]
struct WaterSaveRef<'a> {
    lakes: &'a [LakeRecord],
}

#[derive(Deserialize)]
struct WaterSaveRaw {
    #[serde(default)]
    lakes: Vec<RawLakeRecord>,
}

/// A field as written in the file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(untagged)]
enum RawField {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(ron::Value),
    #[default]
    #[serde(skip)]
    Missing,
}

impl RawField {
    fn as_i32(&self, field: &'static str) -> Result<i32, RecordError> {
        let value = match self {
            RawField::Integer(value) => *value,
            RawField::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                RecordError::NotNumeric {
                    field,
                    value: text.clone(),
                }
            })?,
            RawField::Missing => return Err(RecordError::Missing { field }),
            other => {
                return Err(RecordError::NotNumeric {
                    field,
                    value: other.describe(),
                })
            }
        };
        i32::try_from(value).map_err(|_| RecordError::OutOfRange { field, value })
    }

    fn as_f32(&self, field: &'static str) -> Result<f32, RecordError> {
        let value = match self {
            RawField::Integer(value) => *value as f64,
            RawField::Float(value) => *value,
            RawField::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                RecordError::NotNumeric {
                    field,
                    value: text.clone(),
                }
            })?,
            RawField::Missing => return Err(RecordError::Missing { field }),
            RawField::Other(_) => {
                return Err(RecordError::NotNumeric {
                    field,
                    value: self.describe(),
                })
            }
        };
        if !value.is_finite() {
            return Err(RecordError::NotNumeric {
                field,
                value: value.to_string(),
            });
        }
        Ok(value as f32)
    }

    fn describe(&self) -> String {
        match self {
            RawField::Integer(value) => value.to_string(),
            RawField::Float(value) => value.to_string(),
            RawField::Text(text) => text.clone(),
            RawField::Other(value) => format!("{value:?}"),
            RawField::Missing => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawLakeRecord {
    min_x: RawField,
    min_y: RawField,
    max_x: RawField,
    max_y: RawField,
    origin_x: RawField,
    origin_y: RawField,
    level: RawField,
}

impl TryFrom<RawLakeRecord> for LakeRecord {
    type Error = RecordError;

    fn try_from(raw: RawLakeRecord) -> Result<Self, Self::Error> {
        Ok(LakeRecord {
            min_x: raw.min_x.as_i32("min_x")?,
            min_y: raw.min_y.as_i32("min_y")?,
            max_x: raw.max_x.as_i32("max_x")?,
            max_y: raw.max_y.as_i32("max_y")?,
            origin_x: raw.origin_x.as_i32("origin_x")?,
            origin_y: raw.origin_y.as_i32("origin_y")?,
            level: raw.level.as_f32("level")?,
        })
    }
}

/// Records read from a file, with the position and reason of each skipped one.
#[derive(Debug, Default)]
pub struct ParsedLakeRecords {
    pub records: Vec<LakeRecord>,
    pub rejected: Vec<(usize, RecordError)>,
}

pub fn lake_records_to_ron(records: &[LakeRecord]) -> Result<String, WaterError> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(true);
    ron::ser::to_string_pretty(&WaterSaveRef { lakes: records }, pretty_config)
        .map_err(|e| WaterError::Serialize(e.to_string()))
}

pub fn lake_records_from_ron(contents: &str) -> Result<ParsedLakeRecords, WaterError> {
    let raw: WaterSaveRaw =
        ron::from_str(contents).map_err(|e| WaterError::Parse(e.to_string()))?;

    let mut parsed = ParsedLakeRecords::default();
    for (index, record) in raw.lakes.into_iter().enumerate() {
        match LakeRecord::try_from(record) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                error!("Skipping lake record {}: {}", index, e);
                parsed.rejected.push((index, e));
            }
        }
    }
    Ok(parsed)
}

pub fn save_lake_records(records: &[LakeRecord], path: &Path) -> Result<(), WaterError> {
    let serialized = lake_records_to_ron(records)?;
    log::debug!("Serialized lakes: {} bytes", serialized.len());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serialized)?;
    info!("Saved {} lakes to {}", records.len(), path.display());
    Ok(())
}

pub fn load_lake_records(path: &Path) -> Result<ParsedLakeRecords, WaterError> {
    let contents = fs::read_to_string(path)?;
    let parsed = lake_records_from_ron(&contents)?;
    info!(
        "Read {} lake records from {} ({} rejected)",
        parsed.records.len(),
        path.display(),
        parsed.rejected.len()
    );
    Ok(parsed)
}
