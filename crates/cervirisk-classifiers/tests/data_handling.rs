use std::io::Write;

use cervirisk_classifiers::data_handling::{
    read_raw_table, AGE_PARTNERS_COLUMN, LOG_AGE_COLUMN, MISSING_MARKER,
};
use cervirisk_classifiers::error::DataError;
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const SURVEY: &str = "\
Age,Number of sexual partners,Smokes,Hinselmann,Dx:Cancer
18,4.0,0.0,0,0
15,1.0,?,0,0
34,?,1.0,1,1
52,5.0,1.0,0,1
46,3.0,?,0,0
";

#[test]
fn survey_is_imputed_and_split() {
    let file = csv_file(SURVEY);
    let table = read_raw_table(file.path(), MISSING_MARKER).unwrap();
    assert_eq!(table.n_rows(), 5);
    assert_eq!(table.missing_counts(), vec![0, 1, 2, 0, 0]);

    let dataset = table.impute_median();
    let features = dataset
        .split_target("Dx:Cancer", &["Hinselmann".to_string(), "Biopsy".to_string()])
        .unwrap();

    assert_eq!(features.feature_names, vec!["Age", "Number of sexual partners", "Smokes"]);
    assert_eq!(features.y, vec![0, 0, 1, 1, 0]);
    assert_eq!(features.class_counts(), [3, 2]);
    // partners median of [4, 1, 5, 3] is 3.5
    assert_eq!(features.x[(2, 1)], 3.5);
    assert_eq!(features.x[(1, 2)], 1.0);

    let medians = features.medians();
    assert_eq!(medians["Age"], 34.0);
    assert_eq!(medians["Smokes"], 1.0);
}

#[test]
fn engineered_columns_are_appended() {
    let file = csv_file(SURVEY);
    let dataset = read_raw_table(file.path(), MISSING_MARKER)
        .unwrap()
        .impute_median()
        .with_engineered_features()
        .unwrap();

    let n = dataset.columns.len();
    assert_eq!(dataset.columns[n - 2], AGE_PARTNERS_COLUMN);
    assert_eq!(dataset.columns[n - 1], LOG_AGE_COLUMN);
    assert_eq!(dataset.x[(0, n - 2)], 72.0);
    assert!((dataset.x[(0, n - 1)] - 19f64.ln()).abs() < 1e-12);
}

#[test]
fn missing_target_or_source_columns_are_errors() {
    let file = csv_file("Smokes,Dx:Cancer\n1,0\n0,1\n");
    let dataset = read_raw_table(file.path(), MISSING_MARKER).unwrap().impute_median();
    assert!(matches!(
        dataset.split_target("Biopsy", &[]),
        Err(DataError::MissingColumn(_))
    ));
    assert!(matches!(
        dataset.with_engineered_features(),
        Err(DataError::MissingColumn(_))
    ));
}

#[test]
fn single_class_target_is_rejected() {
    let file = csv_file("Age,Dx:Cancer\n20,0\n30,0\n");
    let dataset = read_raw_table(file.path(), MISSING_MARKER).unwrap().impute_median();
    assert!(matches!(
        dataset.split_target("Dx:Cancer", &[]),
        Err(DataError::SingleClass(_))
    ));
}

#[test]
fn header_only_file_is_empty() {
    let file = csv_file("Age,Dx:Cancer\n");
    assert!(matches!(
        read_raw_table(file.path(), MISSING_MARKER),
        Err(DataError::Empty(_))
    ));
}
