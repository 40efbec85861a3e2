//! Random forest classifier.
//!
//! Bagged ensemble of [`DecisionTree`]s. Per-tree seeds are drawn up front
//! from the forest seed, so fitting on the rayon pool gives the same forest
//! regardless of thread count. Probabilities are the mean of the per-tree
//! leaf distributions.
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestParams;
use crate::error::ModelError;
use crate::models::classifier_trait::{argmax, ClassifierModel};
use crate::models::decision_tree::{DecisionTree, TreeParams};

const N_CLASSES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        RandomForest {
            params,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Expected number of features per sample.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Average tree depth across the forest.
    pub fn avg_depth(&self) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: usize = self.trees.iter().map(DecisionTree::depth).sum();
        total as f64 / self.trees.len() as f64
    }

    fn validate(&self, x: &Array2<f64>, y: &[usize]) -> Result<(), ModelError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if x.nrows() != y.len() {
            return Err(ModelError::InvalidParameter(format!(
                "x has {} rows but y has {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if let Some(bad) = y.iter().find(|&&c| c >= N_CLASSES) {
            return Err(ModelError::InvalidParameter(format!(
                "label {} is not a binary class index",
                bad
            )));
        }
        if self.params.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.params.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Class probabilities for one sample.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotFitted`] or [`ModelError::DimensionMismatch`].
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> Result<Vec<f64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if row.len() != self.n_features {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        let mut proba = vec![0.0; N_CLASSES];
        for tree in &self.trees {
            for (p, d) in proba.iter_mut().zip(tree.predict_distribution(row)) {
                *p += d;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    /// Mean impurity decrease per feature, normalized to sum to one.
    /// Single-leaf trees do not contribute.
    pub fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        let mut sum = vec![0.0; self.n_features];
        let mut contributing = 0usize;
        for tree in self.trees.iter().filter(|t| t.n_nodes() > 1) {
            contributing += 1;
            for (s, v) in sum.iter_mut().zip(tree.feature_importances()) {
                *s += v;
            }
        }
        if contributing == 0 {
            return Ok(sum);
        }
        let total: f64 = sum.iter().sum();
        if total > 0.0 {
            sum.iter_mut().for_each(|s| *s /= total);
        }
        Ok(sum)
    }

    /// Structural check for forests restored from disk.
    pub fn is_well_formed(&self) -> bool {
        self.is_fitted()
            && self
                .trees
                .iter()
                .all(|t| t.is_well_formed() && t.n_features() == self.n_features)
    }
}

impl ClassifierModel for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<(), ModelError> {
        self.validate(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: self.params.max_features.resolve(n_features),
        };

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| rng.gen()).collect();
        let bootstrap = self.params.bootstrap;

        log::debug!(
            "Fitting {} trees on {} samples x {} features (max_depth={:?}, min_samples_split={}, max_features={})",
            seeds.len(),
            n_samples,
            n_features,
            tree_params.max_depth,
            tree_params.min_samples_split,
            tree_params.max_features
        );

        self.trees = seeds
            .par_iter()
            .map(|&seed| {
                let mut tree_rng = StdRng::seed_from_u64(seed);
                let samples: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| tree_rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                DecisionTree::fit_samples(x, y, samples, N_CLASSES, tree_params, &mut tree_rng)
            })
            .collect();
        self.n_features = n_features;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>, ModelError> {
        let mut out = Array2::zeros((x.nrows(), N_CLASSES));
        for (i, row) in x.rows().into_iter().enumerate() {
            let proba = self.predict_proba_row(row)?;
            for (c, p) in proba.into_iter().enumerate() {
                out[(i, c)] = p;
            }
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}

/// Predicted class for a probability vector (lowest index wins ties).
pub fn class_from_proba(proba: &[f64]) -> usize {
    argmax(proba.iter().copied())
}
