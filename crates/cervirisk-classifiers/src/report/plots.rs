use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter};

use crate::stats::roc_curve;

/// ROC curve of the positive-class scores with the chance diagonal.
pub fn plot_roc_curve(y_true: &[usize], scores: &[f64], auc: f64) -> Plot {
    let (fpr, tpr) = roc_curve(y_true, scores);

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(fpr, tpr)
            .mode(Mode::Lines)
            .name(&format!("ROC (AUC = {:.3})", auc)),
    );
    plot.add_trace(
        Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
            .mode(Mode::Lines)
            .name("Chance")
            .line(Line::new().color("grey").dash(DashType::Dash)),
    );
    plot.set_layout(
        Layout::new()
            .title("ROC Curve (held-out split)")
            .x_axis(Axis::new().title("False Positive Rate"))
            .y_axis(Axis::new().title("True Positive Rate")),
    );
    plot
}

/// Horizontal bar chart of feature importances, most important on top.
pub fn plot_feature_importances(names: &[String], importances: &[f64]) -> Plot {
    let mut pairs: Vec<(&String, f64)> = names.iter().zip(importances.iter().copied()).collect();
    pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let (labels, values): (Vec<String>, Vec<f64>) =
        pairs.into_iter().map(|(n, v)| (n.clone(), v)).unzip();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(values, labels)
            .orientation(plotly::common::Orientation::Horizontal)
            .name("Importance"),
    );
    plot.set_layout(
        Layout::new()
            .title("Feature Importances")
            .height(300 + 18 * names.len())
            .x_axis(Axis::new().title("Mean impurity decrease")),
    );
    plot
}
