//! CART decision tree with Gini impurity.
//!
//! Trees are stored as a flat node arena so they serialize compactly and
//! predict without recursion. Training works on a list of sample indices,
//! which lets the forest pass bootstrap draws (with repeats) directly.
use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// A node in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Samples with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class distribution of the training samples that reached this leaf.
    Leaf { distribution: Vec<f64> },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features examined per split (already resolved to a count).
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
    /// Unnormalized impurity decrease per feature, accumulated while growing.
    impurity_decrease: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

struct Grower<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    params: TreeParams,
    n_total: f64,
    rng: &'a mut StdRng,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (repeats allowed).
    pub fn fit_samples(
        x: &Array2<f64>,
        y: &[usize],
        samples: Vec<usize>,
        n_classes: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = DecisionTree {
            nodes: Vec::new(),
            n_features: x.ncols(),
            n_classes,
            impurity_decrease: vec![0.0; x.ncols()],
        };
        let mut grower = Grower {
            x,
            y,
            params,
            n_total: samples.len().max(1) as f64,
            rng,
        };
        tree.grow(&mut grower, samples, 0);
        tree
    }

    fn class_counts(&self, y: &[usize], samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[y[s]] += 1;
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts
            .iter()
            .map(|&c| if n == 0 { 0.0 } else { c as f64 / n as f64 })
            .collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn grow(&mut self, g: &mut Grower<'_>, samples: Vec<usize>, depth: usize) -> usize {
        let n = samples.len();
        let counts = self.class_counts(g.y, &samples);
        let impurity = gini(&counts, n);

        let depth_allows = g.params.max_depth.map_or(true, |d| depth < d);
        if !depth_allows || n < g.params.min_samples_split || impurity <= 0.0 {
            return self.push_leaf(&counts, n);
        }

        let Some(split) = self.best_split(g, &samples, impurity) else {
            return self.push_leaf(&counts, n);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&s| g.x[(s, split.feature)] <= split.threshold);

        self.impurity_decrease[split.feature] +=
            n as f64 / g.n_total * (impurity - split.impurity);

        // reserve the slot so the parent precedes its children
        let idx = self.push_leaf(&counts, n);
        let left_idx = self.grow(g, left, depth + 1);
        let right_idx = self.grow(g, right, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    /// Lowest weighted child impurity over a random subset of features.
    fn best_split(&self, g: &mut Grower<'_>, samples: &[usize], impurity: f64) -> Option<SplitCandidate> {
        let n = samples.len();
        let k = g.params.max_features.clamp(1, self.n_features);
        let features = sample(&mut *g.rng, self.n_features, k);

        let mut best: Option<SplitCandidate> = None;
        let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);
        let total = self.class_counts(g.y, samples);

        for feature in features.iter() {
            column.clear();
            column.extend(samples.iter().map(|&s| (g.x[(s, feature)], g.y[s])));
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            let mut left = vec![0usize; self.n_classes];

            for i in 0..n - 1 {
                left[column[i].1] += 1;
                let (value, next) = (column[i].0, column[i + 1].0);
                if next <= value {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                let improves = weighted < impurity - 1e-12;
                let better = best.as_ref().map_or(true, |b| weighted < b.impurity);
                if improves && better {
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity: weighted,
                    });
                }
            }
        }
        best
    }

    /// Class distribution of the leaf reached by `row`.
    pub fn predict_distribution(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Impurity-based feature importances normalized to sum to one
    /// (all zeros for a single-leaf tree).
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.n_features];
        }
        self.impurity_decrease.iter().map(|v| v / total).collect()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Structural sanity check used after deserialization.
    ///
    /// Nodes are laid out in pre-order, so every child index must be in range
    /// and greater than its parent's. That also rules out cycles.
    pub fn is_well_formed(&self) -> bool {
        let n = self.nodes.len();
        n > 0
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { distribution } => distribution.len() == self.n_classes,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < self.n_features
                        && (idx + 1..n).contains(left)
                        && (idx + 1..n).contains(right)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params(max_depth: Option<usize>) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            max_features: 2,
        }
    }

    #[test]
    fn separable_data_gives_pure_leaves() {
        let x = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [10.0, 5.0], [11.0, 5.0]];
        let y = vec![0, 0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit_samples(&x, &y, (0..5).collect(), 2, params(None), &mut rng);

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_distribution(array![1.5, 5.0].view()), &[1.0, 0.0]);
        assert_eq!(tree.predict_distribution(array![9.0, 5.0].view()), &[0.0, 1.0]);
        let imp = tree.feature_importances();
        assert!((imp[0] - 1.0).abs() < 1e-12);
        assert_eq!(imp[1], 0.0);
    }

    #[test]
    fn depth_zero_is_a_single_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = vec![0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit_samples(&x, &y, (0..4).collect(), 2, params(Some(0)), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_distribution(array![0.0].view()), &[0.5, 0.5]);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn grown_trees_pass_the_structure_check() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let y = vec![0, 1, 0, 1, 1, 0];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit_samples(&x, &y, (0..6).collect(), 2, params(None), &mut rng);
        assert!(tree.n_nodes() > 1);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn backward_or_self_links_are_malformed() {
        let leaf = || Node::Leaf {
            distribution: vec![1.0, 0.0],
        };
        let split = |left, right| Node::Split {
            feature: 0,
            threshold: 0.5,
            left,
            right,
        };
        let tree = |nodes| DecisionTree {
            nodes,
            n_features: 1,
            n_classes: 2,
            impurity_decrease: vec![0.0],
        };

        assert!(tree(vec![split(1, 2), leaf(), leaf()]).is_well_formed());
        assert!(!tree(vec![split(0, 0)]).is_well_formed());
        assert!(!tree(vec![split(1, 2), split(0, 2), leaf()]).is_well_formed());
        assert!(!tree(vec![split(1, 3), leaf(), leaf()]).is_well_formed());
    }
}
