//! JSON:API documents exchanged with the private provider registry.
//!
//! Only the attributes the publisher reads or writes are modelled; everything
//! else in the registry's responses (timestamps, permissions, relationships)
//! is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Resource type names used in the `type` member of request bodies.
pub mod resource_type {
    /// A provider within an organization's registry.
    pub const PROVIDER: &str = "registry-providers";
    /// A GPG public key registered for a namespace.
    pub const GPG_KEY: &str = "gpg-keys";
    /// A single version of a provider.
    pub const PROVIDER_VERSION: &str = "registry-provider-versions";
    /// An (os, arch) build of a provider version.
    pub const PLATFORM: &str = "registry-provider-version-platforms";
}

/// Top-level document: `{"data": ..., "links": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    /// Primary data, a single resource or a list of them.
    pub data: T,
    /// Pagination links, present on list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PageLinks>,
}

impl<T> Document<T> {
    /// Wrap `data` in a document with no links.
    pub fn new(data: T) -> Self {
        Self { data, links: None }
    }

    /// URL of the next page, if the registry reported one.
    pub fn next_page(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Pagination links of a list document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageLinks {
    /// Absolute URL of the next page; `null` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

/// Body of a create request: `{"type": ..., "attributes": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct NewResource<A> {
    /// One of the [`resource_type`] constants.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Attributes of the resource being created.
    pub attributes: A,
}

impl<A> NewResource<A> {
    /// Build a create-request document for a resource of type `kind`.
    pub fn document(kind: &'static str, attributes: A) -> Document<Self> {
        Document::new(Self { kind, attributes })
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// `registry-providers` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResource {
    /// Server-assigned identifier (`prov-...`).
    pub id: String,
    /// Provider attributes.
    pub attributes: ProviderAttributes,
}

/// Attributes of a provider, both in responses and create requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderAttributes {
    /// Short provider name (no `terraform-provider-` prefix).
    pub name: String,
    /// Organization namespace.
    pub namespace: String,
    /// Registry kind, `private` for organization registries.
    pub registry_name: String,
}

// ---------------------------------------------------------------------------
// GPG keys
// ---------------------------------------------------------------------------

/// `gpg-keys` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpgKeyResource {
    /// Server-assigned identifier.
    pub id: String,
    /// Key attributes.
    pub attributes: GpgKeyAttributes,
}

/// Attributes of a registered GPG key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GpgKeyAttributes {
    /// The ASCII-armored public key, exactly as it was uploaded.
    pub ascii_armor: String,
    /// Key identifier derived by the registry.
    pub key_id: String,
    /// Owning namespace.
    #[serde(default)]
    pub namespace: String,
}

/// Attributes sent when registering a new GPG key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewGpgKey<'a> {
    /// Owning namespace.
    pub namespace: &'a str,
    /// The ASCII-armored public key.
    pub ascii_armor: &'a str,
}

// ---------------------------------------------------------------------------
// Provider versions
// ---------------------------------------------------------------------------

/// `registry-provider-versions` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderVersionResource {
    /// Server-assigned identifier.
    pub id: String,
    /// Version attributes.
    pub attributes: ProviderVersionAttributes,
    /// Upload links; the registry omits each one once its file is stored.
    #[serde(default)]
    pub links: ProviderVersionLinks,
}

/// Attributes of a provider version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderVersionAttributes {
    /// Version string.
    pub version: String,
    /// Identifier of the key that signs `SHA256SUMS`.
    #[serde(default)]
    pub key_id: String,
    /// Supported plugin protocol versions.
    #[serde(default)]
    pub protocols: Vec<String>,
    /// Whether `SHA256SUMS` has been received.
    #[serde(default)]
    pub shasums_uploaded: bool,
    /// Whether `SHA256SUMS.sig` has been received.
    #[serde(default)]
    pub shasums_sig_uploaded: bool,
}

/// Pre-signed upload targets of a provider version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderVersionLinks {
    /// Target for `SHA256SUMS`.
    #[serde(default)]
    pub shasums_upload: Option<String>,
    /// Target for `SHA256SUMS.sig`.
    #[serde(default)]
    pub shasums_sig_upload: Option<String>,
}

/// Attributes sent when creating a provider version.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NewProviderVersion<'a> {
    /// Version string.
    pub version: &'a str,
    /// Signing key identifier.
    pub key_id: &'a str,
    /// Supported plugin protocol versions.
    pub protocols: &'a [String],
}

// ---------------------------------------------------------------------------
// Platforms
// ---------------------------------------------------------------------------

/// `registry-provider-version-platforms` resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformResource {
    /// Server-assigned identifier.
    pub id: String,
    /// Platform attributes.
    pub attributes: PlatformAttributes,
    /// Upload link; omitted once the binary is stored.
    #[serde(default)]
    pub links: PlatformLinks,
}

/// Attributes of a platform build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformAttributes {
    /// Target operating system.
    pub os: String,
    /// Target CPU architecture.
    pub arch: String,
    /// SHA-256 of the archive as listed in `SHA256SUMS`.
    #[serde(default)]
    pub shasum: String,
    /// Archive filename.
    #[serde(default)]
    pub filename: String,
    /// Whether the archive has been received.
    #[serde(default)]
    pub provider_binary_uploaded: bool,
}

/// Pre-signed upload target of a platform build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformLinks {
    /// Target for the provider archive.
    #[serde(default)]
    pub provider_binary_upload: Option<String>,
}

/// Attributes sent when creating a platform.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlatform<'a> {
    /// Target operating system.
    pub os: &'a str,
    /// Target CPU architecture.
    pub arch: &'a str,
    /// SHA-256 of the archive.
    pub shasum: &'a str,
    /// Archive filename.
    pub filename: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_version_without_links() {
        let body = json!({
            "data": {
                "id": "provver-1",
                "type": "registry-provider-versions",
                "attributes": {
                    "version": "1.0.0",
                    "key-id": "ABCDEF",
                    "protocols": ["5.0"],
                    "shasums-uploaded": true,
                    "shasums-sig-uploaded": true,
                    "created-at": "2024-01-01T00:00:00Z"
                }
            }
        });
        let doc: Document<ProviderVersionResource> = serde_json::from_value(body).unwrap();
        assert!(doc.data.attributes.shasums_uploaded);
        assert!(doc.data.links.shasums_upload.is_none());
        assert!(doc.next_page().is_none());
    }

    #[test]
    fn test_list_next_page() {
        let body = json!({
            "data": [],
            "links": { "next": "https://example.test/page2", "prev": null }
        });
        let doc: Document<Vec<GpgKeyResource>> = serde_json::from_value(body).unwrap();
        assert_eq!(doc.next_page(), Some("https://example.test/page2"));

        let last: Document<Vec<GpgKeyResource>> =
            serde_json::from_value(json!({ "data": [], "links": { "next": null } })).unwrap();
        assert!(last.next_page().is_none());
    }

    #[test]
    fn test_create_body_shape() {
        let protocols = vec!["5.0".to_string(), "6.0".to_string()];
        let doc = NewResource::document(
            resource_type::PROVIDER_VERSION,
            NewProviderVersion {
                version: "1.2.3",
                key_id: "KEY",
                protocols: &protocols,
            },
        );
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "data": {
                    "type": "registry-provider-versions",
                    "attributes": {
                        "version": "1.2.3",
                        "key-id": "KEY",
                        "protocols": ["5.0", "6.0"]
                    }
                }
            })
        );
    }
}
