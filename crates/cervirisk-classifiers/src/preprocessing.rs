//! Standardization of the feature matrix.
//!
//! `StandardScaler` stores per-column mean and population standard deviation
//! and is persisted next to the classifier so inference requests are scaled
//! exactly like the training data.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Per-column mean/scale standardization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Number of input columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a single sample.
    ///
    /// # Errors
    ///
    /// [`ModelError::DimensionMismatch`] when `row` has the wrong width.
    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, ModelError> {
        if row.len() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}

/// Fit a `StandardScaler` from a matrix where rows are samples and columns
/// are features. Constant columns get a scale of `1.0`.
///
/// # Errors
///
/// [`ModelError::EmptyTrainingSet`] for a matrix with no rows or columns.
pub fn fit_scaler(x: &Array2<f64>) -> Result<StandardScaler, ModelError> {
    let (nrows, ncols) = x.dim();
    if nrows == 0 || ncols == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }

    let mean = x
        .mean_axis(Axis(0))
        .ok_or(ModelError::EmptyTrainingSet)?;
    let scale = x
        .std_axis(Axis(0), 0.0)
        .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

    Ok(StandardScaler {
        mean: mean.to_vec(),
        scale: scale.to_vec(),
    })
}

/// Transform all rows using the provided `StandardScaler`.
///
/// # Errors
///
/// [`ModelError::DimensionMismatch`] when the column count differs from the
/// fitted width.
pub fn transform_all(x: &Array2<f64>, sc: &StandardScaler) -> Result<Array2<f64>, ModelError> {
    if x.ncols() != sc.n_features() {
        return Err(ModelError::DimensionMismatch {
            expected: sc.n_features(),
            found: x.ncols(),
        });
    }
    let mean = Array1::from(sc.mean.clone());
    let scale = Array1::from(sc.scale.clone());
    Ok((x - &mean) / &scale)
}

/// Fit a scaler and return it together with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(StandardScaler, Array2<f64>), ModelError> {
    let sc = fit_scaler(x)?;
    let transformed = transform_all(x, &sc)?;
    Ok((sc, transformed))
}
