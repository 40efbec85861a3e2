use std::path::Path;
use std::sync::Arc;

use cervirisk_classifiers::io::ArtifactBundle;

/// Immutable state shared by all request handlers.
///
/// Built once at startup. A failed artifact load is kept as its message so
/// the server still starts and `/predict` can report why it is unavailable.
#[derive(Debug)]
pub struct ServingState {
    artifacts: Result<ArtifactBundle, String>,
}

pub type SharedState = Arc<ServingState>;

impl ServingState {
    pub fn load(dir: &Path) -> Self {
        match ArtifactBundle::load(dir) {
            Ok(bundle) => {
                log::info!(
                    "Model, scaler, feature schema and medians loaded ({} features, profile '{}')",
                    bundle.feature_names().len(),
                    bundle.schema.profile
                );
                ServingState::from_bundle(bundle)
            }
            Err(e) => {
                log::error!("Error loading artifacts from {}: {}", dir.display(), e);
                ServingState::unavailable(e.to_string())
            }
        }
    }

    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        ServingState {
            artifacts: Ok(bundle),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ServingState {
            artifacts: Err(reason.into()),
        }
    }

    pub fn artifacts(&self) -> Result<&ArtifactBundle, &str> {
        self.artifacts.as_ref().map_err(String::as_str)
    }

    pub fn is_ready(&self) -> bool {
        self.artifacts.is_ok()
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
