//! Stratified splitting, cross-validation and grid search.
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::{ForestParams, ParamGrid};
use crate::error::ModelError;
use crate::models::{ClassifierModel, RandomForest};
use crate::stats::accuracy;

/// Train/test partition of a labelled matrix.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
}

fn indices_by_class(y: &[usize]) -> [Vec<usize>; 2] {
    let mut by_class = [Vec::new(), Vec::new()];
    for (i, &label) in y.iter().enumerate() {
        by_class[label.min(1)].push(i);
    }
    by_class
}

/// Split rows into train and test sets preserving the class ratio.
///
/// Each class contributes `round(test_size * n_class)` test rows, clamped
/// so a class with at least two rows appears on both sides.
///
/// # Errors
///
/// [`ModelError::InvalidParameter`] for `test_size` outside `(0, 1)` or
/// mismatched lengths.
pub fn stratified_train_test_split(
    x: &Array2<f64>,
    y: &[usize],
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit, ModelError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ModelError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::InvalidParameter(format!(
            "x has {} rows but y has {} labels",
            x.nrows(),
            y.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();

    for mut class_idx in indices_by_class(y) {
        class_idx.shuffle(&mut rng);
        let n = class_idx.len();
        let mut n_test = (test_size * n as f64).round() as usize;
        if n >= 2 {
            n_test = n_test.clamp(1, n - 1);
        }
        test_idx.extend_from_slice(&class_idx[..n_test]);
        train_idx.extend_from_slice(&class_idx[n_test..]);
    }
    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_idx),
        x_test: x.select(Axis(0), &test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}

/// Stratified k-fold indices without shuffling: the j-th row of each class
/// lands in fold `j % k`. Returns `(train, test)` index pairs.
///
/// # Errors
///
/// [`ModelError::InvalidParameter`] when `k < 2` or `k` exceeds the number
/// of rows.
pub fn stratified_kfold(y: &[usize], k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, ModelError> {
    if k < 2 || k > y.len() {
        return Err(ModelError::InvalidParameter(format!(
            "cannot build {} folds from {} samples",
            k,
            y.len()
        )));
    }
    let mut fold_of = vec![0usize; y.len()];
    for class_idx in indices_by_class(y) {
        for (j, &i) in class_idx.iter().enumerate() {
            fold_of[i] = j % k;
        }
    }
    Ok((0..k)
        .map(|fold| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..y.len()).partition(|&i| fold_of[i] == fold);
            (train, test)
        })
        .collect())
}

/// Accuracy of a freshly built model on each stratified fold.
pub fn cross_val_score<M, F>(
    make_model: F,
    x: &Array2<f64>,
    y: &[usize],
    folds: usize,
) -> Result<Vec<f64>, ModelError>
where
    M: ClassifierModel,
    F: Fn() -> M,
{
    stratified_kfold(y, folds)?
        .into_iter()
        .map(|(train, test)| {
            let mut model = make_model();
            let y_train: Vec<usize> = train.iter().map(|&i| y[i]).collect();
            let y_test: Vec<usize> = test.iter().map(|&i| y[i]).collect();
            model.fit(&x.select(Axis(0), &train), &y_train)?;
            let pred = model.predict(&x.select(Axis(0), &test))?;
            Ok(accuracy(&y_test, &pred))
        })
        .collect()
}

/// Mean CV accuracy of one grid candidate.
#[derive(Debug, Clone)]
pub struct CandidateScore {
    pub params: ForestParams,
    pub mean_accuracy: f64,
    pub fold_accuracies: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
    /// Best candidate refit on all of `x`.
    pub best_model: RandomForest,
}

/// Exhaustive search over `grid`, scored by mean stratified k-fold accuracy.
/// The first candidate in grid order wins ties. The winner is refit on the
/// full input.
///
/// # Errors
///
/// [`ModelError::InvalidParameter`] for an empty grid; fitting errors are
/// propagated.
pub fn grid_search(
    x: &Array2<f64>,
    y: &[usize],
    grid: &ParamGrid,
    base: &ForestParams,
) -> Result<GridSearchResult, ModelError> {
    let candidates = grid.candidates(base);
    if candidates.is_empty() {
        return Err(ModelError::InvalidParameter("parameter grid is empty".to_string()));
    }
    log::info!(
        "Grid search over {} candidates with {}-fold CV",
        candidates.len(),
        grid.cv_folds
    );

    let scored: Vec<CandidateScore> = candidates
        .into_par_iter()
        .map(|params| {
            let fold_accuracies =
                cross_val_score(|| RandomForest::new(params.clone()), x, y, grid.cv_folds)?;
            let mean_accuracy = fold_accuracies.iter().sum::<f64>() / fold_accuracies.len() as f64;
            Ok(CandidateScore {
                params,
                mean_accuracy,
                fold_accuracies,
            })
        })
        .collect::<Result<_, ModelError>>()?;

    let mut best = &scored[0];
    for candidate in &scored[1..] {
        if candidate.mean_accuracy > best.mean_accuracy {
            best = candidate;
        }
    }
    for c in &scored {
        log::debug!(
            "n_estimators={} max_depth={:?} min_samples_split={} -> {:.4}",
            c.params.n_estimators,
            c.params.max_depth,
            c.params.min_samples_split,
            c.mean_accuracy
        );
    }
    log::info!(
        "Best parameters: n_estimators={} max_depth={:?} min_samples_split={} (cv accuracy {:.4})",
        best.params.n_estimators,
        best.params.max_depth,
        best.params.min_samples_split,
        best.mean_accuracy
    );

    let best_params = best.params.clone();
    let best_score = best.mean_accuracy;
    let mut best_model = RandomForest::new(best_params.clone());
    best_model.fit(x, y)?;

    Ok(GridSearchResult {
        best_params,
        best_score,
        candidates: scored,
        best_model,
    })
}
