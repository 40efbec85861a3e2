//! Synthetic minority oversampling (SMOTE).
//!
//! New minority samples are drawn on the segment between a random minority
//! sample and one of its `k` nearest minority neighbours.
use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Smote {
    /// Desired minority/majority ratio after resampling, in `(0, 1]`.
    pub sampling_strategy: f64,
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Smote {
    fn default() -> Self {
        Self {
            sampling_strategy: 1.0,
            k_neighbors: 5,
            seed: 42,
        }
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Smote {
    pub fn new(sampling_strategy: f64, seed: u64) -> Self {
        Self {
            sampling_strategy,
            seed,
            ..Self::default()
        }
    }

    /// Number of synthetic samples needed for the given class counts.
    pub fn n_synthetic(&self, minority: usize, majority: usize) -> usize {
        let target = (self.sampling_strategy * majority as f64).floor() as usize;
        target.saturating_sub(minority)
    }

    /// Oversample the minority class of a binary problem.
    ///
    /// Returns the original rows followed by the synthetic ones.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidParameter`] for a ratio outside `(0, 1]` or
    /// mismatched lengths, [`ModelError::TooFewMinoritySamples`] when fewer
    /// than two minority samples exist.
    pub fn fit_resample(
        &self,
        x: &Array2<f64>,
        y: &[usize],
    ) -> Result<(Array2<f64>, Vec<usize>), ModelError> {
        if !(self.sampling_strategy > 0.0 && self.sampling_strategy <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "sampling_strategy must be in (0, 1], got {}",
                self.sampling_strategy
            )));
        }
        if x.nrows() != y.len() {
            return Err(ModelError::InvalidParameter(format!(
                "x has {} rows but y has {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let positives = y.iter().filter(|&&v| v == 1).count();
        let negatives = y.len() - positives;
        let (minority_class, minority, majority) = if positives <= negatives {
            (1usize, positives, negatives)
        } else {
            (0usize, negatives, positives)
        };

        let n_new = self.n_synthetic(minority, majority);
        if n_new == 0 {
            log::info!(
                "SMOTE: minority class already at ratio {:.3}; no samples generated",
                minority as f64 / majority.max(1) as f64
            );
            return Ok((x.clone(), y.to_vec()));
        }
        if minority < 2 {
            return Err(ModelError::TooFewMinoritySamples {
                needed: 2,
                found: minority,
            });
        }

        let k = self.k_neighbors.min(minority - 1).max(1);
        let minority_idx: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_class).collect();
        let neighbours = nearest_neighbours(x, &minority_idx, k);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = x.clone();
        for _ in 0..n_new {
            let pick = rng.gen_range(0..minority_idx.len());
            let neighbour = neighbours[pick][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();

            let base = x.row(minority_idx[pick]);
            let other = x.row(neighbour);
            let synthetic: Array1<f64> = &base + &((&other - &base) * gap);
            out.push_row(synthetic.view())
                .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        }

        let mut labels = y.to_vec();
        labels.extend(std::iter::repeat(minority_class).take(n_new));
        log::info!(
            "SMOTE: generated {} synthetic samples for class {} ({} -> {})",
            n_new,
            minority_class,
            minority,
            minority + n_new
        );
        Ok((out, labels))
    }
}

/// For each row in `subset`, the `k` nearest other rows of `subset`
/// (global row indices, nearest first).
fn nearest_neighbours(x: &Array2<f64>, subset: &[usize], k: usize) -> Vec<Vec<usize>> {
    subset
        .iter()
        .map(|&i| {
            let row = x.row(i);
            let mut dists: Vec<(usize, f64)> = subset
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (j, squared_distance(row, x.row(j))))
                .collect();
            dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
            dists.into_iter().take(k).map(|(j, _)| j).collect()
        })
        .collect()
}

/// Count of rows per class after resampling, `[class 0, class 1]`.
pub fn class_balance(y: &[usize]) -> [usize; 2] {
    let ones = y.iter().filter(|&&v| v == 1).count();
    [y.len() - ones, ones]
}
