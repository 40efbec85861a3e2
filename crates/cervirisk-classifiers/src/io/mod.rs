//! Persisted training artifacts shared by the trainer and the server.
pub mod artifacts;

pub use artifacts::{ArtifactBundle, FeatureSchema, ModelArtifact, ScalerArtifact};
