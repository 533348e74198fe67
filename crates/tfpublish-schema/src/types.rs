//! Release and registry records as the publisher sees them.

use serde::{Deserialize, Serialize};

use crate::jsonapi::{GpgKeyResource, PlatformResource, ProviderResource, ProviderVersionResource};

/// Which registry a provider lives in.
///
/// Only organization-private registries accept uploaded binaries, so this is
/// the single kind the publisher targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryKind {
    /// An organization's private registry.
    #[default]
    Private,
}

impl RegistryKind {
    /// Path segment and `registry-name` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a provider is: the key for every registry lookup in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    /// Short provider name (no `terraform-provider-` prefix).
    pub name: String,
    /// Organization namespace.
    pub namespace: String,
    /// Target registry.
    pub registry_kind: RegistryKind,
}

impl ProviderIdentity {
    /// Identity of provider `name` in `namespace`'s private registry.
    pub fn private(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            registry_kind: RegistryKind::Private,
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// What should exist in the registry once the run completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    /// Short provider name.
    pub provider_name: String,
    /// Release version.
    pub version: String,
    /// Supported plugin protocol versions (e.g. `["5.0"]`).
    pub protocol_versions: Vec<String>,
}

/// A provider as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// Server-assigned identifier.
    pub id: String,
    /// Short provider name.
    pub name: String,
    /// Organization namespace.
    pub namespace: String,
}

impl From<ProviderResource> for Provider {
    fn from(r: ProviderResource) -> Self {
        Self {
            id: r.id,
            name: r.attributes.name,
            namespace: r.attributes.namespace,
        }
    }
}

/// A public key registered for verifying `SHA256SUMS.sig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// Key identifier, required to create a version.
    pub key_id: String,
    /// The ASCII-armored key text.
    pub ascii_armor: String,
    /// Owning namespace.
    pub namespace: String,
}

impl From<GpgKeyResource> for SigningKey {
    fn from(r: GpgKeyResource) -> Self {
        Self {
            key_id: r.attributes.key_id,
            ascii_armor: r.attributes.ascii_armor,
            namespace: r.attributes.namespace,
        }
    }
}

/// One version of a provider and the upload state of its checksum files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderVersionRecord {
    /// Version string.
    pub version: String,
    /// Supported plugin protocol versions.
    pub protocols: Vec<String>,
    /// Signing key identifier.
    pub key_id: String,
    /// Whether `SHA256SUMS` is stored.
    pub shasums_uploaded: bool,
    /// Whether `SHA256SUMS.sig` is stored.
    pub shasums_sig_uploaded: bool,
    /// Pre-signed upload targets.
    pub upload_links: VersionUploadLinks,
}

/// Upload targets for the two checksum files of a version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionUploadLinks {
    /// Target for `SHA256SUMS`.
    pub shasums: Option<String>,
    /// Target for `SHA256SUMS.sig`.
    pub shasums_sig: Option<String>,
}

impl From<ProviderVersionResource> for ProviderVersionRecord {
    fn from(r: ProviderVersionResource) -> Self {
        Self {
            version: r.attributes.version,
            protocols: r.attributes.protocols,
            key_id: r.attributes.key_id,
            shasums_uploaded: r.attributes.shasums_uploaded,
            shasums_sig_uploaded: r.attributes.shasums_sig_uploaded,
            upload_links: VersionUploadLinks {
                shasums: r.links.shasums_upload,
                shasums_sig: r.links.shasums_sig_upload,
            },
        }
    }
}

/// One (os, arch) build of a provider version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPlatformRecord {
    /// Target operating system.
    pub os: String,
    /// Target CPU architecture.
    pub arch: String,
    /// SHA-256 of the archive.
    pub shasum: String,
    /// Archive filename.
    pub filename: String,
    /// Whether the archive is stored.
    pub binary_uploaded: bool,
    /// Pre-signed upload target for the archive.
    pub upload_link: Option<String>,
}

impl ProviderPlatformRecord {
    /// Whether this record describes the `os`/`arch` pair.
    pub fn is_platform(&self, os: &str, arch: &str) -> bool {
        self.os == os && self.arch == arch
    }
}

impl From<PlatformResource> for ProviderPlatformRecord {
    fn from(r: PlatformResource) -> Self {
        Self {
            os: r.attributes.os,
            arch: r.attributes.arch,
            shasum: r.attributes.shasum,
            filename: r.attributes.filename,
            binary_uploaded: r.attributes.provider_binary_uploaded,
            upload_link: r.links.provider_binary_upload,
        }
    }
}

/// A provider archive listed in the local `SHA256SUMS` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalArtifactEntry {
    /// Hex digest from the checksum file.
    pub shasum: String,
    /// Archive filename, relative to the release directory.
    pub filename: String,
    /// Target operating system.
    pub os: String,
    /// Target CPU architecture.
    pub arch: String,
}
