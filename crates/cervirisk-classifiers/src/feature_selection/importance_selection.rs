//! Importance-threshold feature selection.
//!
//! See: https://scikit-learn.org/stable/modules/feature_selection.html#feature-selection-using-selectfrommodel
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::ModelError;
use crate::models::{ClassifierModel, RandomForest};
use crate::stats::median;

/// Cut-off applied to the feature importances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Median of all importances.
    #[default]
    Median,
    /// Mean of all importances.
    Mean,
    /// Fixed value.
    Value(f64),
}

impl Threshold {
    fn resolve(self, importances: &[f64]) -> f64 {
        match self {
            Threshold::Median => median(importances).unwrap_or(0.0),
            Threshold::Mean => {
                if importances.is_empty() {
                    0.0
                } else {
                    importances.iter().sum::<f64>() / importances.len() as f64
                }
            }
            Threshold::Value(v) => v,
        }
    }
}

/// Keep the features whose importance in a probe forest reaches the threshold.
#[derive(Debug, Clone)]
pub struct SelectFromModel {
    probe: ForestParams,
    threshold: Threshold,
}

/// Outcome of [`SelectFromModel::fit`].
#[derive(Debug, Clone)]
pub struct Selection {
    /// Column indices kept, ascending.
    pub indices: Vec<usize>,
    /// Importance of every input column, in input order.
    pub importances: Vec<f64>,
    pub threshold: f64,
}

impl SelectFromModel {
    pub fn new(probe: ForestParams, threshold: Threshold) -> Self {
        SelectFromModel { probe, threshold }
    }

    /// Fit the probe forest and return the selected column indices.
    ///
    /// # Errors
    ///
    /// Propagates fitting errors from the probe forest.
    pub fn fit(&self, x: &Array2<f64>, y: &[usize]) -> Result<Selection, ModelError> {
        let mut forest = RandomForest::new(self.probe.clone());
        forest.fit(x, y)?;
        let importances = forest.feature_importances()?;
        Ok(Self::select(importances, self.threshold))
    }

    /// Apply `threshold` to precomputed importances.
    pub fn select(importances: Vec<f64>, threshold: Threshold) -> Selection {
        let cut = threshold.resolve(&importances);
        let indices: Vec<usize> = importances
            .iter()
            .enumerate()
            .filter(|(_, &v)| v >= cut)
            .map(|(i, _)| i)
            .collect();
        log::info!(
            "Selected {} of {} features (importance threshold {:.5})",
            indices.len(),
            importances.len(),
            cut
        );
        Selection {
            indices,
            importances,
            threshold: cut,
        }
    }
}

/// Keep only the listed columns of `x`, in the listed order.
pub fn project_columns(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    x.select(Axis(1), indices)
}
