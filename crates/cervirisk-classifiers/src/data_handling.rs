//! Loading and shaping the risk-factor survey dataset.
//!
//! The raw CSV is coerced to numeric-or-missing cells (`RawTable`), imputed
//! with per-column medians (`Dataset`), optionally extended with engineered
//! columns, and finally split into an ordered feature matrix and a binary
//! target (`FeatureSet`).
use std::collections::BTreeMap;
use std::path::Path;

use ndarray::{Array2, Axis};

use crate::error::DataError;
use crate::stats::median;

/// Sentinel used by the survey export for unanswered questions.
pub const MISSING_MARKER: &str = "?";

/// Name of the interaction column appended by [`Dataset::with_engineered_features`].
pub const AGE_PARTNERS_COLUMN: &str = "Age_SexPartners";
/// Name of the log-age column appended by [`Dataset::with_engineered_features`].
pub const LOG_AGE_COLUMN: &str = "Log_Age";

const AGE_COLUMN: &str = "Age";
const PARTNERS_COLUMN: &str = "Number of sexual partners";

/// Coerce one CSV cell to a number. The missing marker, empty cells and
/// anything that does not parse as a finite number become `None`.
pub fn parse_cell(raw: &str, missing_marker: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == missing_marker {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Column-major table of numeric-or-missing cells, in file column order.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl RawTable {
    pub fn n_rows(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    /// Number of missing cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<usize> {
        self.values
            .iter()
            .map(|col| col.iter().filter(|v| v.is_none()).count())
            .collect()
    }

    /// Fill every missing cell with its column median.
    ///
    /// A column with no observed values is filled with `0.0`.
    pub fn impute_median(self) -> Dataset {
        let n_rows = self.n_rows();
        let n_cols = self.columns.len();
        let mut filled: Vec<Vec<f64>> = Vec::with_capacity(n_cols);

        for (name, col) in self.columns.iter().zip(&self.values) {
            let observed: Vec<f64> = col.iter().flatten().copied().collect();
            let fill = match median(&observed) {
                Some(m) => m,
                None => {
                    log::warn!("Column '{}' has no observed values; imputing 0.0", name);
                    0.0
                }
            };
            let n_missing = col.len() - observed.len();
            if n_missing > 0 {
                log::debug!("Imputed {} missing values in '{}' with {}", n_missing, name, fill);
            }
            filled.push(col.iter().map(|v| v.unwrap_or(fill)).collect());
        }

        let x = Array2::from_shape_fn((n_rows, n_cols), |(r, c)| filled[c][r]);
        Dataset {
            columns: self.columns,
            x,
        }
    }
}

/// Read a headed CSV file, coercing every cell with [`parse_cell`].
///
/// # Errors
///
/// Returns [`DataError::Csv`] for unreadable files or malformed records and
/// [`DataError::Empty`] when the file holds no data rows.
pub fn read_raw_table<P: AsRef<Path>>(path: P, missing_marker: &str) -> Result<RawTable, DataError> {
    let path = path.as_ref();
    let csv_err = |source: csv::Error| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(csv_err)?;

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); columns.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        if record.len() != columns.len() {
            return Err(DataError::RaggedRow {
                row: row_idx + 1,
                found: record.len(),
                expected: columns.len(),
            });
        }
        for (col, field) in values.iter_mut().zip(record.iter()) {
            col.push(parse_cell(field, missing_marker));
        }
    }

    let table = RawTable { columns, values };
    if table.n_rows() == 0 {
        return Err(DataError::Empty(path.to_path_buf()));
    }
    log::info!(
        "Loaded {} rows and {} columns from {}",
        table.n_rows(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Fully numeric table (rows = patients), column names in order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub x: Array2<f64>,
}

impl Dataset {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, DataError> {
        self.column_index(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Append `Age_SexPartners = Age * partners` and `Log_Age = ln(Age + 1)`.
    ///
    /// # Errors
    ///
    /// [`DataError::MissingColumn`] when `Age` or the partner count is absent.
    pub fn with_engineered_features(mut self) -> Result<Self, DataError> {
        let age_idx = self.require_column(AGE_COLUMN)?;
        let partners_idx = self.require_column(PARTNERS_COLUMN)?;

        let age = self.x.column(age_idx).to_owned();
        let partners = self.x.column(partners_idx).to_owned();
        let interaction = &age * &partners;
        let log_age = age.mapv(|a| (a + 1.0).ln());

        self.x.push_column(interaction.view())?;
        self.x.push_column(log_age.view())?;
        self.columns.push(AGE_PARTNERS_COLUMN.to_string());
        self.columns.push(LOG_AGE_COLUMN.to_string());
        Ok(self)
    }

    /// Separate the binary target from the feature columns.
    ///
    /// Target values above `0.5` are the positive class. Columns named in
    /// `drop_columns` but absent from the table are skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`DataError::MissingColumn`] for an unknown target and
    /// [`DataError::SingleClass`] when the target has one class only.
    pub fn split_target(&self, target: &str, drop_columns: &[String]) -> Result<FeatureSet, DataError> {
        let target_idx = self.require_column(target)?;

        for name in drop_columns {
            if self.column_index(name).is_none() {
                log::warn!("Drop column '{}' not present in dataset; ignoring", name);
            }
        }

        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| i != target_idx && !drop_columns.iter().any(|d| d == &self.columns[i]))
            .collect();

        let y: Vec<usize> = self
            .x
            .column(target_idx)
            .iter()
            .map(|&v| usize::from(v > 0.5))
            .collect();
        let positives = y.iter().filter(|&&v| v == 1).count();
        if positives == 0 || positives == y.len() {
            return Err(DataError::SingleClass(target.to_string()));
        }

        Ok(FeatureSet {
            feature_names: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            x: self.x.select(Axis(1), &keep),
            y,
        })
    }
}

/// Ordered feature matrix and binary labels used for fitting.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Vec<usize>,
}

impl FeatureSet {
    /// Per-feature medians keyed by feature name.
    pub fn medians(&self) -> BTreeMap<String, f64> {
        self.feature_names
            .iter()
            .zip(self.x.axis_iter(Axis(1)))
            .map(|(name, col)| {
                let values = col.to_vec();
                (name.clone(), median(&values).unwrap_or(0.0))
            })
            .collect()
    }

    /// `[negatives, positives]`
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.y.iter().filter(|&&v| v == 1).count();
        [self.y.len() - positives, positives]
    }

    pub fn log_input_data_summary(&self) {
        let [neg, pos] = self.class_counts();
        log::info!("----- Input Data Summary -----");
        log::info!("{} positive and {} negative samples", pos, neg);
        log::info!("{} features (columns)", self.feature_names.len());
        log::info!("-------------------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_handles_marker_and_garbage() {
        assert_eq!(parse_cell("?", MISSING_MARKER), None);
        assert_eq!(parse_cell("  ", MISSING_MARKER), None);
        assert_eq!(parse_cell("abc", MISSING_MARKER), None);
        assert_eq!(parse_cell("inf", MISSING_MARKER), None);
        assert_eq!(parse_cell(" 4.5 ", MISSING_MARKER), Some(4.5));
        assert_eq!(parse_cell("1.0", MISSING_MARKER), Some(1.0));
    }

    #[test]
    fn impute_uses_column_median() {
        let table = RawTable {
            columns: vec!["a".into(), "b".into()],
            values: vec![
                vec![Some(1.0), None, Some(3.0), Some(10.0)],
                vec![None, None, None, None],
            ],
        };
        let ds = table.impute_median();
        assert_eq!(ds.x[(1, 0)], 3.0);
        assert_eq!(ds.x[(2, 1)], 0.0);
    }
}
