use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use cervirisk_classifiers::config::{ForestParams, ParamGrid};
use cervirisk_classifiers::feature_selection::Threshold;

use crate::util::validate_csv_file;

pub const DEFAULT_DATA_FILE: &str = "risk_factors_cervical_cancer.csv";
pub const DEFAULT_TARGET: &str = "Dx:Cancer";

/// Named preset of training options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Screening-result columns dropped, fixed forest.
    #[default]
    Baseline,
    /// Engineered features, importance selection and grid search.
    Tuned,
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(Profile::Baseline),
            "tuned" => Ok(Profile::Tuned),
            _ => Err(format!("Unknown training profile: {}", s)),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Baseline => write!(f, "baseline"),
            Profile::Tuned => write!(f, "tuned"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub version: String,
    pub profile: Profile,
    pub data: String,
    pub output_dir: String,
    pub target: String,
    pub missing_marker: String,
    pub drop_columns: Vec<String>,
    pub engineer_features: bool,
    /// Minority/majority ratio targeted by SMOTE; `None` skips resampling.
    pub smote_ratio: Option<f64>,
    pub smote_k_neighbors: usize,
    pub test_size: f64,
    /// Seed for SMOTE, the split, the probe forest and the final forest.
    pub seed: u64,
    pub feature_selection: bool,
    /// Importance cut-off: `"median"`, `"mean"` or `{"value": x}`.
    pub selection_threshold: Threshold,
    pub selection_probe_trees: usize,
    pub forest: ForestParams,
    /// When set, `forest` only supplies the parameters the grid leaves open.
    pub grid_search: Option<ParamGrid>,
    pub write_report: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::for_profile(Profile::Baseline)
    }
}

impl TrainConfig {
    pub fn for_profile(profile: Profile) -> Self {
        let base = TrainConfig {
            version: clap::crate_version!().to_string(),
            profile,
            data: DEFAULT_DATA_FILE.to_string(),
            output_dir: ".".to_string(),
            target: DEFAULT_TARGET.to_string(),
            missing_marker: "?".to_string(),
            drop_columns: Vec::new(),
            engineer_features: false,
            smote_ratio: Some(0.3),
            smote_k_neighbors: 5,
            test_size: 0.3,
            seed: 42,
            feature_selection: false,
            selection_threshold: Threshold::Median,
            selection_probe_trees: 200,
            forest: ForestParams::new(300, Some(4), 10),
            grid_search: None,
            write_report: true,
        };
        match profile {
            Profile::Baseline => TrainConfig {
                drop_columns: ["Hinselmann", "Schiller", "Citology", "Biopsy", "Dx"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                ..base
            },
            Profile::Tuned => TrainConfig {
                engineer_features: true,
                feature_selection: true,
                grid_search: Some(ParamGrid::default()),
                ..base
            },
        }
    }

    /// Parse a JSON config. Keys absent from `json` take the defaults of the
    /// profile named by `profile_override`, else by the file, else baseline.
    pub fn from_json_str(json: &str, profile_override: Option<Profile>) -> Result<Self> {
        let user: Value = serde_json::from_str(json).context("Config is not valid JSON")?;
        let Value::Object(user) = user else {
            anyhow::bail!("Config must be a JSON object");
        };

        let profile = match (profile_override, user.get("profile")) {
            (Some(p), _) => p,
            (None, Some(v)) => serde_json::from_value(v.clone()).context("Invalid 'profile' in config")?,
            (None, None) => Profile::default(),
        };

        let mut merged = serde_json::to_value(TrainConfig::for_profile(profile))?;
        if let Value::Object(ref mut fields) = merged {
            for (key, value) in user {
                if key == "profile" {
                    continue;
                }
                match fields.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        let config: TrainConfig =
            serde_json::from_value(merged).context("Config does not match the training schema")?;
        Ok(config)
    }

    /// Build the effective config from an optional config file and CLI overrides.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let profile_override = matches
            .get_one::<String>("profile")
            .map(|p| Profile::from_str(p).map_err(anyhow::Error::msg))
            .transpose()?;

        let mut config = match config_path {
            Some(path) => {
                let config_json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                TrainConfig::from_json_str(&config_json, profile_override)?
            }
            None => TrainConfig::for_profile(profile_override.unwrap_or_default()),
        };

        // Apply CLI overrides
        if let Some(data) = matches.get_one::<String>("data") {
            config.data = data.clone();
        }
        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }
        if matches.get_flag("no_report") {
            config.write_report = false;
        }
        config.version = clap::crate_version!().to_string();

        validate_csv_file(&config.data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            anyhow::bail!("test_size must be in (0, 1), got {}", self.test_size);
        }
        if let Some(ratio) = self.smote_ratio {
            if !(ratio > 0.0 && ratio <= 1.0) {
                anyhow::bail!("smote_ratio must be in (0, 1], got {}", ratio);
            }
        }
        if self.forest.n_estimators == 0 {
            anyhow::bail!("forest.n_estimators must be at least 1");
        }
        if self.feature_selection && self.selection_probe_trees == 0 {
            anyhow::bail!("selection_probe_trees must be at least 1");
        }
        if let Threshold::Value(v) = self.selection_threshold {
            if !v.is_finite() || v < 0.0 {
                anyhow::bail!("selection_threshold value must be a non-negative number, got {}", v);
            }
        }
        if let Some(grid) = &self.grid_search {
            if grid.cv_folds < 2 {
                anyhow::bail!("grid_search.cv_folds must be at least 2");
            }
        }
        Ok(())
    }
}

/// Overlay `value` onto `slot`, descending into objects present on both sides
/// so nested blocks keep the keys the overlay leaves out.
fn merge_json(slot: &mut Value, value: Value) {
    match (slot, value) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(inner) => merge_json(inner, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_match_their_presets() {
        let baseline = TrainConfig::for_profile(Profile::Baseline);
        assert_eq!(baseline.drop_columns.len(), 5);
        assert!(baseline.grid_search.is_none());
        assert_eq!(baseline.forest.n_estimators, 300);
        assert_eq!(baseline.forest.max_depth, Some(4));
        assert_eq!(baseline.forest.min_samples_split, 10);

        let tuned = TrainConfig::for_profile(Profile::Tuned);
        assert!(tuned.drop_columns.is_empty());
        assert!(tuned.engineer_features && tuned.feature_selection);
        assert_eq!(tuned.grid_search.unwrap().candidates(&tuned.forest).len(), 8);
    }

    #[test]
    fn file_keys_override_profile_defaults() {
        let config = TrainConfig::from_json_str(
            r#"{"profile": "tuned", "test_size": 0.25, "forest": {"n_estimators": 50}}"#,
            None,
        )
        .unwrap();
        assert_eq!(config.profile, Profile::Tuned);
        assert!(config.engineer_features);
        assert_eq!(config.test_size, 0.25);
        assert_eq!(config.forest.n_estimators, 50);
    }

    #[test]
    fn nested_blocks_merge_key_by_key() {
        let config = TrainConfig::from_json_str(r#"{"forest": {"n_estimators": 50}}"#, None).unwrap();
        assert_eq!(config.profile, Profile::Baseline);
        assert_eq!(config.forest.n_estimators, 50);
        assert_eq!(config.forest.max_depth, Some(4));
        assert_eq!(config.forest.min_samples_split, 10);

        let tuned = TrainConfig::from_json_str(
            r#"{"profile": "tuned", "grid_search": {"cv_folds": 3}}"#,
            None,
        )
        .unwrap();
        let grid = tuned.grid_search.unwrap();
        assert_eq!(grid.cv_folds, 3);
        assert_eq!(grid.n_estimators, vec![200, 300]);
        assert_eq!(grid.min_samples_split, vec![7, 10]);
    }

    #[test]
    fn selection_threshold_is_configurable() {
        let config = TrainConfig::from_json_str(r#"{"profile": "tuned"}"#, None).unwrap();
        assert_eq!(config.selection_threshold, Threshold::Median);

        let config = TrainConfig::from_json_str(r#"{"selection_threshold": "mean"}"#, None).unwrap();
        assert_eq!(config.selection_threshold, Threshold::Mean);

        let config =
            TrainConfig::from_json_str(r#"{"selection_threshold": {"value": 0.02}}"#, None).unwrap();
        assert_eq!(config.selection_threshold, Threshold::Value(0.02));
        assert!(config.validate().is_ok());

        let mut config = TrainConfig::default();
        config.selection_threshold = Threshold::Value(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn null_clears_an_optional_block() {
        let config =
            TrainConfig::from_json_str(r#"{"profile": "tuned", "grid_search": null, "smote_ratio": null}"#, None)
                .unwrap();
        assert!(config.grid_search.is_none());
        assert!(config.smote_ratio.is_none());
    }

    #[test]
    fn cli_profile_wins_over_file_profile() {
        let config = TrainConfig::from_json_str(r#"{"profile": "tuned"}"#, Some(Profile::Baseline)).unwrap();
        assert_eq!(config.profile, Profile::Baseline);
        assert!(!config.engineer_features);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(TrainConfig::from_json_str("[1, 2]", None).is_err());
        assert!(TrainConfig::from_json_str(r#"{"profile": "fancy"}"#, None).is_err());
        assert!(TrainConfig::from_json_str(r#"{"test_size": "big"}"#, None).is_err());
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let mut config = TrainConfig::default();
        config.smote_ratio = Some(1.5);
        assert!(config.validate().is_err());
        config.smote_ratio = None;
        assert!(config.validate().is_ok());
        config.test_size = 1.0;
        assert!(config.validate().is_err());
    }
}
