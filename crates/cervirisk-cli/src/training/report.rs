use anyhow::{Context, Result};
use maud::html;
use std::path::Path;

use cervirisk_classifiers::report::plots::{plot_feature_importances, plot_roc_curve};
use cervirisk_classifiers::report::{Report, ReportSection};
use cervirisk_classifiers::stats::{class_scores, EvaluationMetrics};

use super::input::TrainConfig;

/// Everything the HTML training report shows.
pub struct TrainingReportData<'a> {
    pub config: &'a TrainConfig,
    pub metrics: &'a EvaluationMetrics,
    pub y_test: &'a [usize],
    pub scores: &'a [f64],
    pub model_features: &'a [String],
    pub importances: &'a [f64],
    pub all_features: &'a [String],
    pub probe_importances: Option<&'a [f64]>,
    pub cv_accuracy: Option<f64>,
}

pub fn write_training_report(data: &TrainingReportData<'_>, path: &Path) -> Result<()> {
    let config = data.config;
    let metrics = data.metrics;

    let mut report = Report::new(
        "cervirisk",
        &config.version,
        None,
        &format!("Cervical Cancer Risk Model Report ({} profile)", config.profile),
    );

    /* Section 1: Evaluation */
    {
        let mut section = ReportSection::new("Evaluation");
        let [[tn, fp], [fn_, tp]] = metrics.confusion_matrix;
        let per_class = class_scores(&metrics.confusion_matrix);

        section.add_content(html! {
            p {
                "Metrics are computed on the held-out stratified split ("
                (data.y_test.len()) " samples, "
                (format!("{:.0}", config.test_size * 100.0)) "% of the resampled data)."
            }
            table {
                tr { th { "Accuracy" } td { (format!("{:.4}", metrics.accuracy)) } }
                tr { th { "AUC-ROC" } td { (format!("{:.4}", metrics.auc_roc)) } }
                @if let Some(cv) = data.cv_accuracy {
                    tr { th { "Best CV accuracy" } td { (format!("{:.4}", cv)) } }
                }
            }
            h3 { "Confusion matrix" }
            table {
                tr { th {} th { "Predicted Low Risk" } th { "Predicted High Risk" } }
                tr { th { "Actual Low Risk" } td { (tn) } td { (fp) } }
                tr { th { "Actual High Risk" } td { (fn_) } td { (tp) } }
            }
            h3 { "Per-class scores" }
            table {
                tr { th { "Class" } th { "Precision" } th { "Recall" } th { "F1" } th { "Support" } }
                @for (label, s) in ["Low Risk", "High Risk"].iter().zip(per_class.iter()) {
                    tr {
                        th { (label) }
                        td { (format!("{:.2}", s.precision)) }
                        td { (format!("{:.2}", s.recall)) }
                        td { (format!("{:.2}", s.f1)) }
                        td { (s.support) }
                    }
                }
            }
        });
        section.add_plot(plot_roc_curve(data.y_test, data.scores, metrics.auc_roc));
        report.add_section(section);
    }

    /* Section 2: Features */
    {
        let mut section = ReportSection::new("Features");
        section.add_content(html! {
            p {
                "The model consumes " (data.model_features.len()) " of "
                (data.all_features.len()) " input features."
            }
        });
        section.add_plot(plot_feature_importances(data.model_features, data.importances));
        if let Some(probe) = data.probe_importances {
            section.add_content(html! {
                p { "Importances from the selection probe forest over all input features:" }
            });
            section.add_plot(plot_feature_importances(data.all_features, probe));
        }
        report.add_section(section);
    }

    /* Section 3: Configuration */
    {
        let mut config_section = ReportSection::new("Configuration");
        config_section.add_content(html! {
            style {
                ".code-container {
                    background-color: #f5f5f5;
                    padding: 10px;
                    border-radius: 5px;
                    overflow-x: auto;
                    font-family: monospace;
                    white-space: pre-wrap;
                }"
            }
            div class="code-container" {
                pre {
                    code { (serde_json::to_string_pretty(config)?) }
                }
            }
        });
        report.add_section(config_section);
    }

    report
        .save_to_file(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
}
