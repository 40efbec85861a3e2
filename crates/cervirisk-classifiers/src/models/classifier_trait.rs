use ndarray::Array2;

use crate::error::ModelError;

/// Contract shared by the classifiers used by the trainer and the server.
///
/// Labels are class indices (`0` negative, `1` positive) and probability
/// matrices have one row per sample and one column per class.
pub trait ClassifierModel {
    /// Fit the model on rows of `x` labelled by `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), ModelError>;

    /// Class probabilities, shape `(n_samples, n_classes)`.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError>;

    /// Most probable class per row (lowest index wins ties).
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| argmax(row.iter().copied()))
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Index of the first maximum.
pub fn argmax<I: IntoIterator<Item = f64>>(values: I) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.into_iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
