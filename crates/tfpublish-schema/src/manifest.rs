//! Release manifest and metadata file formats.
//!
//! Two generations of release tooling describe a provider release differently:
//!
//! - Newer releases ship `terraform-provider-<name>_<version>_manifest.json`
//!   inside the release directory. Name and version come from the filename,
//!   protocol versions from the body.
//! - Older releases ship GoReleaser's `metadata.json` (name and version) and
//!   keep `terraform-registry-manifest.json` at the repository root
//!   (protocol versions).
//!
//! Both manifest bodies share the same shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix every provider project and archive name carries.
pub const PROVIDER_PREFIX: &str = "terraform-provider-";

/// Suffix of the per-version manifest in the release directory.
pub const MANIFEST_SUFFIX: &str = "manifest.json";

/// GoReleaser metadata filename.
pub const METADATA_FILE: &str = "metadata.json";

/// Repository-level registry manifest filename.
pub const REGISTRY_MANIFEST_FILE: &str = "terraform-registry-manifest.json";

/// Errors raised while decoding release description files.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// Manifest filename is not `<provider>_<version>_manifest.json`.
    #[error("Invalid manifest file {0}")]
    InvalidManifestName(String),

    /// A provider name lacks the `terraform-provider-` prefix.
    #[error("Invalid provider file names {0}")]
    MissingProviderPrefix(String),

    /// A required field is absent or empty.
    #[error("{file} is missing required field '{field}'")]
    MissingField {
        /// File being decoded.
        file: &'static str,
        /// Name of the missing field.
        field: &'static str,
    },
}

/// Body of both `*_manifest.json` and `terraform-registry-manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryManifest {
    /// Manifest format version.
    #[serde(default)]
    pub version: u32,
    /// Provider metadata.
    pub metadata: RegistryManifestMetadata,
}

/// The `metadata` object of a registry manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryManifestMetadata {
    /// Supported plugin protocol versions.
    pub protocol_versions: Vec<String>,
}

/// The fields of GoReleaser's `metadata.json` the publisher needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoReleaserMetadata {
    /// Project name, `terraform-provider-<name>`.
    pub project_name: String,
    /// Release version without a leading `v`.
    #[serde(default)]
    pub version: Option<String>,
}

impl GoReleaserMetadata {
    /// Short provider name and version.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingProviderPrefix`] if `project_name` lacks the
    /// provider prefix and [`SchemaError::MissingField`] if `version` is absent.
    pub fn provider_and_version(&self) -> Result<(&str, &str), SchemaError> {
        let name = strip_provider_prefix(&self.project_name)?;
        let version = self
            .version
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or(SchemaError::MissingField {
                file: METADATA_FILE,
                field: "version",
            })?;
        Ok((name, version))
    }
}

/// Strip [`PROVIDER_PREFIX`] from `full`, rejecting names without it.
///
/// # Errors
///
/// Returns [`SchemaError::MissingProviderPrefix`] when the prefix is absent or
/// nothing follows it.
pub fn strip_provider_prefix(full: &str) -> Result<&str, SchemaError> {
    full.strip_prefix(PROVIDER_PREFIX)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SchemaError::MissingProviderPrefix(full.to_string()))
}

/// Short provider name and version encoded in a per-version manifest filename.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidManifestName`] unless the name splits on `_`
/// into exactly three segments, and [`SchemaError::MissingProviderPrefix`] if
/// the first segment lacks the provider prefix.
pub fn parse_manifest_file_name(file_name: &str) -> Result<(&str, &str), SchemaError> {
    let parts: Vec<&str> = file_name.split('_').collect();
    let [provider, version, _] = parts.as_slice() else {
        return Err(SchemaError::InvalidManifestName(file_name.to_string()));
    };
    if version.is_empty() {
        return Err(SchemaError::InvalidManifestName(file_name.to_string()));
    }
    Ok((strip_provider_prefix(provider)?, version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_file_name() {
        assert_eq!(
            parse_manifest_file_name("terraform-provider-foo_1.0.0_manifest.json"),
            Ok(("foo", "1.0.0"))
        );
    }

    #[test]
    fn test_manifest_file_name_wrong_segment_count() {
        assert_eq!(
            parse_manifest_file_name("terraform-registry-manifest.json"),
            Err(SchemaError::InvalidManifestName(
                "terraform-registry-manifest.json".into()
            ))
        );
        assert!(matches!(
            parse_manifest_file_name("terraform-provider-foo_bar_1.0.0_manifest.json"),
            Err(SchemaError::InvalidManifestName(_))
        ));
    }

    #[test]
    fn test_manifest_file_name_without_prefix() {
        assert_eq!(
            parse_manifest_file_name("foo_1.0.0_manifest.json"),
            Err(SchemaError::MissingProviderPrefix("foo".into()))
        );
    }

    #[test]
    fn test_registry_manifest_body() {
        let manifest: RegistryManifest = serde_json::from_str(
            r#"{"version": 1, "metadata": {"protocol_versions": ["5.0", "6.0"]}}"#,
        )
        .unwrap();
        assert_eq!(manifest.metadata.protocol_versions, vec!["5.0", "6.0"]);
    }

    #[test]
    fn test_goreleaser_metadata() {
        let meta: GoReleaserMetadata = serde_json::from_str(
            r#"{"project_name": "terraform-provider-foo", "version": "1.0.0"}"#,
        )
        .unwrap();
        assert_eq!(meta.provider_and_version(), Ok(("foo", "1.0.0")));

        let no_version: GoReleaserMetadata =
            serde_json::from_str(r#"{"project_name": "terraform-provider-foo"}"#).unwrap();
        assert_eq!(
            no_version.provider_and_version(),
            Err(SchemaError::MissingField {
                file: METADATA_FILE,
                field: "version"
            })
        );

        let unprefixed: GoReleaserMetadata =
            serde_json::from_str(r#"{"project_name": "foo", "version": "1.0.0"}"#).unwrap();
        assert!(matches!(
            unprefixed.provider_and_version(),
            Err(SchemaError::MissingProviderPrefix(_))
        ));
    }

    #[test]
    fn test_goreleaser_metadata_ignores_other_fields() {
        let meta: GoReleaserMetadata = serde_json::from_str(
            r#"{"project_name": "terraform-provider-foo", "tag": "v1.0.0", "version": "1.0.0", "commit": "abc", "runtime": {"goos": "linux"}}"#,
        )
        .unwrap();
        assert_eq!(
            meta,
            GoReleaserMetadata {
                project_name: "terraform-provider-foo".to_string(),
                version: Some("1.0.0".to_string()),
            }
        );
    }
}
