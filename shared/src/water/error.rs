use super::LakeId;

/// Errors raised while finding, loading or saving lakes.
#[derive(Debug, thiserror::Error)]
pub enum WaterError {
    #[error("lake {id} has no corners below level {level}")]
    EmptyLake { id: LakeId, level: f32 },
    #[error("lake {id} has no chunk with enough corners to render")]
    NoChunks { id: LakeId },
    #[error("lake bounds cover {corners} corners, more than the supported {max}")]
    LakeTooLarge { corners: usize, max: usize },
    #[error("height map holds {actual} samples, expected {expected}")]
    HeightMapSize { expected: usize, actual: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse water data: {0}")]
    Parse(String),
    #[error("could not serialize water data: {0}")]
    Serialize(String),
}

/// Why a single persisted lake record was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("missing `{field}` attribute")]
    Missing { field: &'static str },
    #[error("`{field}` attribute is not a valid number: {value}")]
    NotNumeric { field: &'static str, value: String },
    #[error("`{field}` attribute is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}
