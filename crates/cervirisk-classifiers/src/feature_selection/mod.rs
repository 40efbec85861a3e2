//! Feature selection utilities.
//!
//! Model-based selection (a la scikit-learn's `SelectFromModel`) that keeps
//! the features a fitted forest considers important.
pub mod importance_selection;

pub use importance_selection::{project_columns, SelectFromModel, Threshold};
