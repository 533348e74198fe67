//! Registry access.
//!
//! [`Registry`] is the seam between the reconciler and the registry API: one
//! getter or lister and one creator per resource type. Getters report a
//! missing resource as `None`; creators fail on any unexpected status. The
//! caller decides whether to look before creating.

use async_trait::async_trait;
use tfpublish_schema::{
    LocalArtifactEntry, Provider, ProviderIdentity, ProviderPlatformRecord, ProviderVersionRecord,
    SigningKey,
};

use crate::PublishError;

pub mod client;

pub use client::RegistryClient;

/// Typed operations on a namespace's private provider registry.
///
/// Provider-scoped calls are keyed by [`ProviderIdentity`]: its namespace and
/// registry kind select where the provider lives.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Look up `provider`.
    async fn get_provider(
        &self,
        provider: &ProviderIdentity,
    ) -> Result<Option<Provider>, PublishError>;

    /// Create `provider`.
    async fn create_provider(&self, provider: &ProviderIdentity) -> Result<Provider, PublishError>;

    /// All signing keys registered for the namespace.
    async fn list_signing_keys(&self) -> Result<Option<Vec<SigningKey>>, PublishError>;

    /// Register an ASCII-armored public key.
    async fn create_signing_key(&self, ascii_armor: &str) -> Result<SigningKey, PublishError>;

    /// Look up `version` of `provider`.
    async fn get_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<ProviderVersionRecord>, PublishError>;

    /// Create `version` of `provider`, signed with `key_id`.
    async fn create_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
        protocols: &[String],
        key_id: &str,
    ) -> Result<ProviderVersionRecord, PublishError>;

    /// All platforms of `version` of `provider`.
    async fn list_platforms(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<Vec<ProviderPlatformRecord>>, PublishError>;

    /// Create the platform described by `artifact` under `version` of `provider`.
    async fn create_platform(
        &self,
        provider: &ProviderIdentity,
        version: &str,
        artifact: &LocalArtifactEntry,
    ) -> Result<ProviderPlatformRecord, PublishError>;
}
