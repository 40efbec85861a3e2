use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or shaping the survey dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read dataset {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dataset {0} has no rows")]
    Empty(PathBuf),

    #[error("row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("target column '{0}' contains a single class")]
    SingleClass(String),

    #[error("failed to reshape dataset: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Failures while fitting or applying a model or transformer.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model has not been fitted")]
    NotFitted,

    #[error("dimension mismatch: expected {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("need at least {needed} minority samples, found {found}")]
    TooFewMinoritySamples { needed: usize, found: usize },

    #[error("training data is empty")]
    EmptyTrainingSet,
}

/// Failures while persisting or restoring the training artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    Missing(PathBuf),

    #[error("failed to access artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported schema version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}
