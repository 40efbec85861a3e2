//! JSON artifacts written by training and read back by the server.
//!
//! Every artifact that depends on the input feature order carries the
//! feature names it was fitted on. [`ArtifactBundle::load`] cross-checks
//! them against the versioned [`FeatureSchema`] so a scaler or model from a
//! different training run is rejected instead of silently misaligned.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array1, ArrayView1};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, ModelError};
use crate::models::RandomForest;
use crate::preprocessing::StandardScaler;

pub const SCHEMA_VERSION: u32 = 1;

pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "cervical_cancer_model.json";
pub const MEDIANS_FILE: &str = "median_values.json";
pub const CLASSIFICATION_REPORT_FILE: &str = "classification_report.txt";

/// Input feature order fixed at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub target: String,
    /// Training profile that produced the artifacts.
    pub profile: String,
    pub feature_names: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FeatureSchema {
    pub fn new(target: &str, profile: &str, feature_names: Vec<String>) -> Self {
        FeatureSchema {
            version: SCHEMA_VERSION,
            target: target.to_string(),
            profile: profile.to_string(),
            feature_names,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    /// Indices into `feature_names` the forest was trained on, in order.
    pub selected_features: Vec<usize>,
    pub forest: RandomForest,
}

/// Everything needed to turn a raw feature vector into a prediction.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub schema: FeatureSchema,
    pub scaler: ScalerArtifact,
    pub model: ModelArtifact,
    pub medians: BTreeMap<String, f64>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and version-check `feature_names.json` in `dir`.
pub fn load_feature_schema<P: AsRef<Path>>(dir: P) -> Result<FeatureSchema, ArtifactError> {
    let schema: FeatureSchema = read_json(&dir.as_ref().join(FEATURE_NAMES_FILE))?;
    if schema.version != SCHEMA_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: schema.version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(schema)
}

/// Read `median_values.json` in `dir`.
pub fn load_medians<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, f64>, ArtifactError> {
    read_json(&dir.as_ref().join(MEDIANS_FILE))
}

/// Write a plain text artifact such as the classification report.
pub fn write_text<P: AsRef<Path>>(dir: P, file_name: &str, text: &str) -> Result<PathBuf, ArtifactError> {
    let path = dir.as_ref().join(file_name);
    fs::write(&path, text).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

impl ArtifactBundle {
    /// Assemble a bundle from freshly fitted parts.
    pub fn new(
        schema: FeatureSchema,
        scaler: StandardScaler,
        selected_features: Vec<usize>,
        forest: RandomForest,
        medians: BTreeMap<String, f64>,
    ) -> Self {
        let feature_names = schema.feature_names.clone();
        ArtifactBundle {
            scaler: ScalerArtifact {
                feature_names: feature_names.clone(),
                scaler,
            },
            model: ModelArtifact {
                feature_names,
                selected_features,
                forest,
            },
            schema,
            medians,
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.schema.feature_names
    }

    /// Training median of `feature`, `0.0` when none was recorded.
    pub fn median(&self, feature: &str) -> f64 {
        self.medians.get(feature).copied().unwrap_or(0.0)
    }

    /// Names of the columns the forest actually consumes.
    pub fn selected_feature_names(&self) -> Vec<&str> {
        self.model
            .selected_features
            .iter()
            .map(|&i| self.schema.feature_names[i].as_str())
            .collect()
    }

    /// Check that the parts agree on the feature order and widths.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::UnsupportedVersion`] or [`ArtifactError::SchemaMismatch`].
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let mismatch = |msg: String| -> Result<(), ArtifactError> { Err(ArtifactError::SchemaMismatch(msg)) };
        if self.schema.version != SCHEMA_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.schema.version,
                supported: SCHEMA_VERSION,
            });
        }
        let n = self.schema.feature_names.len();
        if n == 0 {
            return mismatch("feature schema lists no features".to_string());
        }
        if self.scaler.feature_names != self.schema.feature_names {
            return mismatch(format!("{} feature order differs from {}", SCALER_FILE, FEATURE_NAMES_FILE));
        }
        if self.model.feature_names != self.schema.feature_names {
            return mismatch(format!("{} feature order differs from {}", MODEL_FILE, FEATURE_NAMES_FILE));
        }
        if self.scaler.scaler.n_features() != n || self.scaler.scaler.scale.len() != n {
            return mismatch(format!(
                "scaler was fitted on {} features, schema has {}",
                self.scaler.scaler.n_features(),
                n
            ));
        }
        if let Some(&bad) = self.model.selected_features.iter().find(|&&i| i >= n) {
            return mismatch(format!("selected feature index {} out of range for {} features", bad, n));
        }
        let forest = &self.model.forest;
        if !forest.is_well_formed() {
            return mismatch("model contains no valid trees".to_string());
        }
        if forest.n_features() != self.model.selected_features.len() {
            return mismatch(format!(
                "model expects {} inputs but {} features are selected",
                forest.n_features(),
                self.model.selected_features.len()
            ));
        }
        Ok(())
    }

    /// Write all JSON artifacts into `dir`, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), ArtifactError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_json(&dir.join(MODEL_FILE), &self.model)?;
        write_json(&dir.join(SCALER_FILE), &self.scaler)?;
        write_json(&dir.join(FEATURE_NAMES_FILE), &self.schema)?;
        write_json(&dir.join(MEDIANS_FILE), &self.medians)?;
        log::info!("Artifacts written to {}", dir.display());
        Ok(())
    }

    /// Read and cross-check all JSON artifacts in `dir`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();
        let bundle = ArtifactBundle {
            schema: load_feature_schema(dir)?,
            scaler: read_json(&dir.join(SCALER_FILE))?,
            model: read_json(&dir.join(MODEL_FILE))?,
            medians: load_medians(dir)?,
        };
        bundle.validate()?;
        log::info!(
            "Loaded {} model with {} trees over {} features from {}",
            bundle.schema.profile,
            bundle.model.forest.n_trees(),
            bundle.schema.feature_names.len(),
            dir.display()
        );
        Ok(bundle)
    }

    /// Class probabilities `[p_low, p_high]` for one unscaled feature vector
    /// in schema order.
    ///
    /// # Errors
    ///
    /// [`ModelError::DimensionMismatch`] when `raw` has the wrong width.
    pub fn predict_proba(&self, raw: ArrayView1<f64>) -> Result<Vec<f64>, ModelError> {
        let scaled = self.scaler.scaler.transform_row(raw)?;
        let projected: Array1<f64> = self
            .model
            .selected_features
            .iter()
            .map(|&i| scaled[i])
            .collect();
        self.model.forest.predict_proba_row(projected.view())
    }
}
