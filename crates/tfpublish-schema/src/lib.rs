//! Shared types for publishing Terraform providers to a private registry.
//!
//! - [`jsonapi`] holds the JSON:API documents exchanged with the registry.
//! - [`types`] holds the flattened records the reconciler works with.
//! - [`manifest`] parses the release manifest and metadata files.
//! - [`artifact_name`] decodes provider archive filenames.

pub mod artifact_name;
pub mod jsonapi;
pub mod manifest;
pub mod types;

// Re-exports
pub use artifact_name::ArtifactName;
pub use manifest::{PROVIDER_PREFIX, SchemaError};
pub use types::*;
