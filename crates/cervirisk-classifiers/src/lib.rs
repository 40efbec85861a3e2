//! cervirisk-classifiers: training and inference building blocks for
//! cervical cancer risk prediction.
//!
//! This crate loads the risk-factor survey, imputes and engineers features,
//! standardizes them, rebalances classes with SMOTE and fits a random forest
//! (optionally with importance-based feature selection and a cross-validated
//! grid search). Fitted parts are persisted as versioned JSON artifacts that
//! the server reloads and validates.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod feature_selection;
pub mod io;
pub mod model_selection;
pub mod models;
pub mod preprocessing;
pub mod report;
pub mod sampling;
pub mod stats;
