use serde::{Deserialize, Serialize};

/// Hyper-parameters of a random forest.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

/// Number of candidate features examined at each split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` inputs (always at least 1).
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt().floor() as usize,
            MaxFeatures::Log2 => n.log2().floor() as usize,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn new(n_estimators: usize, max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            n_estimators,
            max_depth,
            min_samples_split,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Exhaustive search space for [`crate::model_selection::grid_search`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
    pub cv_folds: usize,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![200, 300],
            max_depth: vec![Some(3), Some(4)],
            min_samples_split: vec![7, 10],
            cv_folds: 5,
        }
    }
}

impl ParamGrid {
    /// Expand the grid into concrete parameter sets, in deterministic order
    /// (`n_estimators` outermost, `min_samples_split` innermost).
    pub fn candidates(&self, base: &ForestParams) -> Vec<ForestParams> {
        let mut out = Vec::new();
        for &n_estimators in &self.n_estimators {
            for &max_depth in &self.max_depth {
                for &min_samples_split in &self.min_samples_split {
                    out.push(ForestParams {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                        ..base.clone()
                    });
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_features_never_zero() {
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(30), 5);
        assert_eq!(MaxFeatures::All.resolve(7), 7);
    }

    #[test]
    fn grid_expands_in_order() {
        let grid = ParamGrid::default();
        let candidates = grid.candidates(&ForestParams::default());
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0].n_estimators, 200);
        assert_eq!(candidates[0].max_depth, Some(3));
        assert_eq!(candidates[0].min_samples_split, 7);
        assert_eq!(candidates[1].min_samples_split, 10);
        assert_eq!(candidates[7].n_estimators, 300);
    }
}
