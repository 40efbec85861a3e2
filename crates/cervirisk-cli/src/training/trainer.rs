use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cervirisk_classifiers::config::ForestParams;
use cervirisk_classifiers::data_handling::read_raw_table;
use cervirisk_classifiers::feature_selection::{project_columns, SelectFromModel};
use cervirisk_classifiers::io::artifacts::{write_text, CLASSIFICATION_REPORT_FILE};
use cervirisk_classifiers::io::{ArtifactBundle, FeatureSchema};
use cervirisk_classifiers::model_selection::{grid_search, stratified_train_test_split};
use cervirisk_classifiers::models::random_forest::class_from_proba;
use cervirisk_classifiers::models::{ClassifierModel, RandomForest};
use cervirisk_classifiers::preprocessing::fit_transform;
use cervirisk_classifiers::sampling::{class_balance, Smote};
use cervirisk_classifiers::stats::EvaluationMetrics;

use super::input::TrainConfig;
use super::report::{write_training_report, TrainingReportData};
use crate::util::write_bytes_to_file;

pub const REPORT_FILE: &str = "cervirisk_training_report.html";
pub const CONFIG_FILE: &str = "cervirisk_trainer_config.json";

/// What a training run produced, for callers that want more than the files.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub metrics: EvaluationMetrics,
    pub feature_names: Vec<String>,
    pub selected_features: Vec<usize>,
    pub params: ForestParams,
    /// Mean CV accuracy of the winning candidate when grid search ran.
    pub cv_accuracy: Option<f64>,
    pub output_dir: PathBuf,
}

pub fn run_training(config: &TrainConfig) -> Result<TrainingOutcome> {
    let start_time = Instant::now();
    log::info!(
        "Training profile '{}' on {} (seed {})",
        config.profile,
        config.data,
        config.seed
    );
    log::info!("Effective configuration:\n{}", serde_json::to_string_pretty(config)?);

    // Load, impute and shape the data
    let table = read_raw_table(&config.data, &config.missing_marker)
        .with_context(|| format!("Failed to load training data: {}", config.data))?;
    let missing: usize = table.missing_counts().iter().sum();
    log::info!("{} missing cells will be imputed with column medians", missing);

    let mut dataset = table.impute_median();
    if config.engineer_features {
        dataset = dataset
            .with_engineered_features()
            .context("Failed to engineer features")?;
    }
    let features = dataset
        .split_target(&config.target, &config.drop_columns)
        .context("Failed to separate the target column")?;
    features.log_input_data_summary();
    let medians = features.medians();

    // Scale, rebalance and split
    let (scaler, scaled) = fit_transform(&features.x)?;
    let (x_all, y_all) = match config.smote_ratio {
        Some(ratio) => {
            let smote = Smote {
                sampling_strategy: ratio,
                k_neighbors: config.smote_k_neighbors,
                seed: config.seed,
            };
            smote
                .fit_resample(&scaled, &features.y)
                .context("SMOTE resampling failed")?
        }
        None => (scaled, features.y.clone()),
    };
    let [neg, pos] = class_balance(&y_all);
    log::info!("Class balance after resampling: {} negative / {} positive", neg, pos);

    let split = stratified_train_test_split(&x_all, &y_all, config.test_size, config.seed)?;
    log::info!(
        "Split into {} training and {} test samples",
        split.y_train.len(),
        split.y_test.len()
    );

    // Optional importance-based selection on the training split
    let (selected_features, probe_importances) = if config.feature_selection {
        let probe = ForestParams::new(config.selection_probe_trees, None, 2).with_seed(config.seed);
        let selection = SelectFromModel::new(probe, config.selection_threshold)
            .fit(&split.x_train, &split.y_train)
            .context("Feature selection failed")?;
        (selection.indices, Some(selection.importances))
    } else {
        ((0..features.feature_names.len()).collect(), None)
    };
    let x_train = project_columns(&split.x_train, &selected_features);
    let x_test = project_columns(&split.x_test, &selected_features);
    let selected_names: Vec<String> = selected_features
        .iter()
        .map(|&i| features.feature_names[i].clone())
        .collect();
    log::debug!("Model input features: {:?}", selected_names);

    // Fit
    let base_params = config.forest.clone().with_seed(config.seed);
    let (model, cv_accuracy) = match &config.grid_search {
        Some(grid) => {
            let result = grid_search(&x_train, &split.y_train, grid, &base_params)
                .context("Grid search failed")?;
            (result.best_model, Some(result.best_score))
        }
        None => {
            let mut model = RandomForest::new(base_params);
            model.fit(&x_train, &split.y_train).context("Model fitting failed")?;
            (model, None)
        }
    };
    log::info!(
        "Fitted {} with {} trees (average depth {:.2}) in {:?}",
        model.name(),
        model.n_trees(),
        model.avg_depth(),
        start_time.elapsed()
    );

    // Evaluate on the held-out split
    let proba = model.predict_proba(&x_test)?;
    let scores: Vec<f64> = proba.column(1).to_vec();
    let y_pred: Vec<usize> = proba
        .rows()
        .into_iter()
        .map(|row| class_from_proba(&row.to_vec()))
        .collect();
    let metrics = EvaluationMetrics::compute(&split.y_test, &y_pred, &scores)
        .context("Failed to evaluate the model")?;
    print_metrics(&metrics, cv_accuracy);

    // Persist
    let output_dir = PathBuf::from(&config.output_dir);
    let params = model.params().clone();
    let importances = model.feature_importances()?;
    let bundle = ArtifactBundle::new(
        FeatureSchema::new(&config.target, &config.profile.to_string(), features.feature_names.clone()),
        scaler,
        selected_features.clone(),
        model,
        medians,
    );
    bundle
        .save(&output_dir)
        .with_context(|| format!("Failed to write artifacts to {}", output_dir.display()))?;
    let report_path = write_text(&output_dir, CLASSIFICATION_REPORT_FILE, &metrics.classification_report)?;
    log::info!("Classification report saved to {}", report_path.display());

    if config.write_report {
        let data = TrainingReportData {
            config,
            metrics: &metrics,
            y_test: &split.y_test,
            scores: &scores,
            model_features: &selected_names,
            importances: &importances,
            all_features: &features.feature_names,
            probe_importances: probe_importances.as_deref(),
            cv_accuracy,
        };
        write_training_report(&data, &output_dir.join(REPORT_FILE))?;
        write_config(config, &output_dir)?;
    }

    log::info!("Training finished in {:?}", start_time.elapsed());
    Ok(TrainingOutcome {
        metrics,
        feature_names: features.feature_names,
        selected_features,
        params,
        cv_accuracy,
        output_dir,
    })
}

fn print_metrics(metrics: &EvaluationMetrics, cv_accuracy: Option<f64>) {
    let [[tn, fp], [fn_, tp]] = metrics.confusion_matrix;
    if let Some(cv) = cv_accuracy {
        println!("Best CV Accuracy: {:.4}", cv);
    }
    println!("Model Accuracy: {:.4}", metrics.accuracy);
    println!("AUC-ROC Score: {:.4}", metrics.auc_roc);
    println!("Confusion Matrix:");
    println!("[[{:>4} {:>4}]", tn, fp);
    println!(" [{:>4} {:>4}]]", fn_, tp);
    println!("Classification Report:");
    println!("{}", metrics.classification_report);
}

fn write_config(config: &TrainConfig, output_dir: &Path) -> Result<()> {
    let path = output_dir.join(CONFIG_FILE);
    let bytes = serde_json::to_vec_pretty(config)?;
    write_bytes_to_file(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Effective configuration saved to {}", path.display());
    Ok(())
}
