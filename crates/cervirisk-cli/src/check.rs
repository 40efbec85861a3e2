//! Artifact smoke test: can the feature schema and the median table be read?
use anyhow::{Context, Result};
use std::path::Path;

use cervirisk_classifiers::io::artifacts::{
    load_feature_schema, load_medians, FEATURE_NAMES_FILE, MEDIANS_FILE,
};

pub fn check_artifacts(dir: &Path) -> Result<()> {
    let schema = load_feature_schema(dir)
        .with_context(|| format!("{} could not be loaded", FEATURE_NAMES_FILE))?;
    log::info!(
        "{} loaded successfully ({} features, schema v{}, profile '{}')",
        FEATURE_NAMES_FILE,
        schema.feature_names.len(),
        schema.version,
        schema.profile
    );

    let medians = load_medians(dir).with_context(|| format!("{} could not be loaded", MEDIANS_FILE))?;
    log::info!("{} loaded successfully ({} medians)", MEDIANS_FILE, medians.len());
    Ok(())
}
