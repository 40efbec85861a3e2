//! Descriptive statistics and binary-classification metrics.
//!
//! Labels are `usize` class indices (`0` = negative, `1` = positive) and
//! scores are positive-class probabilities.
use std::cmp::Ordering;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median};

use crate::error::ModelError;

/// Median of the finite values in `values`, or `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    Some(Data::new(finite).median())
}

/// Fraction of predictions equal to the true label.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    assert_eq!(y_true.len(), y_pred.len(), "labels and predictions must have equal lengths");
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(a, b)| a == b).count();
    correct as f64 / y_true.len() as f64
}

/// Area under the ROC curve via the Mann-Whitney U statistic.
///
/// Tied scores receive their average rank, which matches the trapezoidal
/// ROC integration.
///
/// # Errors
///
/// Returns [`ModelError::InvalidParameter`] when `y_true` does not contain
/// both classes or the lengths differ.
pub fn roc_auc(y_true: &[usize], scores: &[f64]) -> Result<f64, ModelError> {
    if y_true.len() != scores.len() {
        return Err(ModelError::InvalidParameter(format!(
            "roc_auc got {} labels and {} scores",
            y_true.len(),
            scores.len()
        )));
    }
    let n_pos = y_true.iter().filter(|&&y| y == 1).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(ModelError::InvalidParameter(
            "roc_auc requires both classes in y_true".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(&y, _)| y == 1)
        .map(|(_, &r)| r)
        .sum();
    let n_pos_f = n_pos as f64;
    let u = pos_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Ok(u / (n_pos_f * n_neg as f64))
}

/// 2x2 confusion matrix laid out as `[[tn, fp], [fn, tp]]`.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize]) -> [[usize; 2]; 2] {
    assert_eq!(y_true.len(), y_pred.len(), "labels and predictions must have equal lengths");
    let mut matrix = [[0usize; 2]; 2];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        matrix[t.min(1)][p.min(1)] += 1;
    }
    matrix
}

/// Precision, recall, F1 and support for one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class scores derived from a confusion matrix. Zero divisions yield 0.
pub fn class_scores(matrix: &[[usize; 2]; 2]) -> [ClassScores; 2] {
    let mut out = [ClassScores {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
        support: 0,
    }; 2];
    for (class, scores) in out.iter_mut().enumerate() {
        let other = 1 - class;
        let tp = matrix[class][class];
        let fp = matrix[other][class];
        let fn_ = matrix[class][other];
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        *scores = ClassScores {
            precision,
            recall,
            f1,
            support: tp + fn_,
        };
    }
    out
}

/// Render a text classification report (per class, accuracy, macro and
/// weighted averages), two decimals per score.
pub fn classification_report(y_true: &[usize], y_pred: &[usize]) -> String {
    let matrix = confusion_matrix(y_true, y_pred);
    let scores = class_scores(&matrix);
    let total: usize = scores.iter().map(|s| s.support).sum();
    let width = "weighted avg".len();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9} {:>9}\n",
        "", "precision", "recall", "f1-score", "support"
    );
    for (class, s) in scores.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            class, s.precision, s.recall, s.f1, s.support
        );
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
        "accuracy",
        "",
        "",
        accuracy(y_true, y_pred),
        total
    );

    let macro_avg = |f: fn(&ClassScores) -> f64| scores.iter().map(f).sum::<f64>() / 2.0;
    let weighted_avg = |f: fn(&ClassScores) -> f64| {
        if total == 0 {
            0.0
        } else {
            scores.iter().map(|s| f(s) * s.support as f64).sum::<f64>() / total as f64
        }
    };
    let _ = writeln!(
        out,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        "macro avg",
        macro_avg(|s| s.precision),
        macro_avg(|s| s.recall),
        macro_avg(|s| s.f1),
        total
    );
    let _ = writeln!(
        out,
        "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        "weighted avg",
        weighted_avg(|s| s.precision),
        weighted_avg(|s| s.recall),
        weighted_avg(|s| s.f1),
        total
    );
    out
}

/// Held-out evaluation summary printed and persisted by the trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub auc_roc: f64,
    pub confusion_matrix: [[usize; 2]; 2],
    pub classification_report: String,
}

impl EvaluationMetrics {
    /// # Errors
    ///
    /// Propagates [`roc_auc`] failures (single-class evaluation split).
    pub fn compute(y_true: &[usize], y_pred: &[usize], scores: &[f64]) -> Result<Self, ModelError> {
        Ok(Self {
            accuracy: accuracy(y_true, y_pred),
            auc_roc: roc_auc(y_true, scores)?,
            confusion_matrix: confusion_matrix(y_true, y_pred),
            classification_report: classification_report(y_true, y_pred),
        })
    }
}

/// Points of the ROC curve (false positive rate, true positive rate), one per
/// distinct score threshold, starting at (0, 0).
pub fn roc_curve(y_true: &[usize], scores: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n_pos = y_true.iter().filter(|&&y| y == 1).count().max(1) as f64;
    let n_neg = y_true.iter().filter(|&&y| y != 1).count().max(1) as f64;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &idx) in order.iter().enumerate() {
        if y_true[idx] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_threshold = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_threshold {
            fpr.push(fp as f64 / n_neg);
            tpr.push(tp as f64 / n_pos);
        }
    }
    (fpr, tpr)
}
