use std::collections::BTreeMap;
use std::fs;

use cervirisk_classifiers::config::ForestParams;
use cervirisk_classifiers::error::ArtifactError;
use cervirisk_classifiers::io::artifacts::{
    load_feature_schema, load_medians, FEATURE_NAMES_FILE, MODEL_FILE, SCALER_FILE,
};
use cervirisk_classifiers::io::{ArtifactBundle, FeatureSchema};
use cervirisk_classifiers::models::{ClassifierModel, RandomForest};
use cervirisk_classifiers::preprocessing::fit_transform;
use ndarray::{array, Array2};
use tempfile::tempdir;

fn names() -> Vec<String> {
    vec!["Age".into(), "Smokes".into(), "STDs".into()]
}

/// Bundle whose forest only sees columns 0 and 2.
fn bundle() -> ArtifactBundle {
    let x = Array2::from_shape_fn((40, 3), |(r, c)| match c {
        0 => 18.0 + r as f64,
        1 => (r % 2) as f64,
        _ => (r % 5) as f64,
    });
    let y: Vec<usize> = (0..40).map(|r| usize::from(r >= 30)).collect();
    let (scaler, scaled) = fit_transform(&x).unwrap();
    let selected = vec![0, 2];
    let projected = scaled.select(ndarray::Axis(1), &selected);
    let mut forest = RandomForest::new(ForestParams::new(8, Some(3), 2));
    forest.fit(&projected, &y).unwrap();

    let medians: BTreeMap<String, f64> = names().into_iter().zip([37.5, 0.5, 2.0]).collect();
    ArtifactBundle::new(
        FeatureSchema::new("Dx:Cancer", "tuned", names()),
        scaler,
        selected,
        forest,
        medians,
    )
}

#[test]
fn saved_bundle_loads_and_predicts_identically() {
    let dir = tempdir().unwrap();
    let original = bundle();
    original.save(dir.path()).unwrap();

    let restored = ArtifactBundle::load(dir.path()).unwrap();
    assert_eq!(restored.feature_names(), names().as_slice());
    assert_eq!(restored.selected_feature_names(), vec!["Age", "STDs"]);
    assert_eq!(restored.median("Age"), 37.5);
    assert_eq!(restored.median("unknown"), 0.0);

    let row = array![60.0, 1.0, 3.0];
    let p = restored.predict_proba(row.view()).unwrap();
    assert_eq!(p, original.predict_proba(row.view()).unwrap());
    assert!((p[0] + p[1] - 1.0).abs() < 1e-9);
}

#[test]
fn smoke_loaders_read_schema_and_medians() {
    let dir = tempdir().unwrap();
    bundle().save(dir.path()).unwrap();

    let schema = load_feature_schema(dir.path()).unwrap();
    assert_eq!(schema.profile, "tuned");
    assert_eq!(schema.target, "Dx:Cancer");
    assert_eq!(load_medians(dir.path()).unwrap().len(), 3);
}

#[test]
fn wrong_width_row_is_rejected() {
    let b = bundle();
    assert!(b.predict_proba(array![1.0, 2.0].view()).is_err());
}

#[test]
fn reordered_schema_is_a_mismatch() {
    let dir = tempdir().unwrap();
    bundle().save(dir.path()).unwrap();

    let mut schema = load_feature_schema(dir.path()).unwrap();
    schema.feature_names.swap(0, 1);
    fs::write(
        dir.path().join(FEATURE_NAMES_FILE),
        serde_json::to_vec(&schema).unwrap(),
    )
    .unwrap();

    match ArtifactBundle::load(dir.path()) {
        Err(ArtifactError::SchemaMismatch(msg)) => assert!(msg.contains(SCALER_FILE)),
        other => panic!("expected a schema mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn out_of_range_selection_is_a_mismatch() {
    let mut b = bundle();
    b.model.selected_features = vec![0, 7];
    assert!(matches!(b.validate(), Err(ArtifactError::SchemaMismatch(_))));
}

#[test]
fn unsupported_version_is_rejected() {
    let dir = tempdir().unwrap();
    bundle().save(dir.path()).unwrap();
    let mut schema = load_feature_schema(dir.path()).unwrap();
    schema.version = 99;
    fs::write(
        dir.path().join(FEATURE_NAMES_FILE),
        serde_json::to_vec(&schema).unwrap(),
    )
    .unwrap();
    assert!(matches!(
        ArtifactBundle::load(dir.path()),
        Err(ArtifactError::UnsupportedVersion { found: 99, .. })
    ));
}

#[test]
fn missing_or_corrupt_files_are_reported() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        ArtifactBundle::load(dir.path()),
        Err(ArtifactError::Missing(_))
    ));

    bundle().save(dir.path()).unwrap();
    fs::write(dir.path().join(MODEL_FILE), b"{ not json").unwrap();
    assert!(matches!(
        ArtifactBundle::load(dir.path()),
        Err(ArtifactError::Json { .. })
    ));
}

#[test]
fn cyclic_tree_in_model_file_is_rejected() {
    let dir = tempdir().unwrap();
    bundle().save(dir.path()).unwrap();

    let path = dir.path().join(MODEL_FILE);
    let mut model: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    model["forest"]["trees"][0]["nodes"] = serde_json::json!([
        {"kind": "split", "feature": 0, "threshold": 0.5, "left": 0, "right": 0}
    ]);
    fs::write(&path, serde_json::to_vec(&model).unwrap()).unwrap();

    match ArtifactBundle::load(dir.path()) {
        Err(ArtifactError::SchemaMismatch(msg)) => assert!(msg.contains("no valid trees")),
        other => panic!("expected a schema mismatch, got {:?}", other.map(|_| ())),
    }
}
