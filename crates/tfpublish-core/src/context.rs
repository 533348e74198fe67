//! Immutable run context.
//!
//! Everything a run needs from the outside world is resolved once into a
//! [`PublishConfig`] and handed to the reconciler together with the registry
//! and uploader it should talk to. Nothing below this point reads the
//! environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::PublishError;
use crate::registry::Registry;
use crate::upload::Uploader;

/// Validated inputs of a publish run.
#[derive(Clone)]
pub struct PublishConfig {
    /// Organization name, also the provider namespace.
    pub organization: String,
    /// Organization API token (bearer credential).
    pub api_token: String,
    /// Repository root, where `terraform-registry-manifest.json` lives.
    pub workspace_root: PathBuf,
    /// Release directory (absolute, or relative to the process working directory).
    pub provider_dir: PathBuf,
    /// ASCII-armored public key matching the `SHA256SUMS.sig` signature.
    pub gpg_key: String,
    /// Maximum concurrent binary uploads.
    pub jobs: usize,
}

impl fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishConfig")
            .field("organization", &self.organization)
            .field("api_token", &"<redacted>")
            .field("workspace_root", &self.workspace_root)
            .field("provider_dir", &self.provider_dir)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl PublishConfig {
    /// Validate the raw inputs. `provider_directory` is resolved against `workspace_root`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Configuration`] if any value is empty.
    pub fn new(
        organization: &str,
        api_token: &str,
        workspace_root: &Path,
        provider_directory: &Path,
        gpg_key: &str,
    ) -> Result<Self, PublishError> {
        require("organization name", organization)?;
        require("organization API token", api_token)?;
        require("GPG key", gpg_key)?;
        if workspace_root.as_os_str().is_empty() {
            return Err(PublishError::Configuration(
                "workspace root is not defined".to_string(),
            ));
        }

        Ok(Self {
            organization: organization.trim().to_string(),
            api_token: api_token.trim().to_string(),
            workspace_root: workspace_root.to_path_buf(),
            provider_dir: workspace_root.join(provider_directory),
            gpg_key: gpg_key.to_string(),
            jobs: 1,
        })
    }

    /// Allow up to `jobs` binary uploads at once (minimum 1).
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

fn require(what: &str, value: &str) -> Result<(), PublishError> {
    if value.trim().is_empty() {
        return Err(PublishError::Configuration(format!("{what} is required")));
    }
    Ok(())
}

/// Groups the configuration with the collaborators a run talks to.
#[derive(Clone)]
pub struct PublishContext {
    /// Validated run inputs.
    pub config: Arc<PublishConfig>,
    /// Registry the run converges.
    pub registry: Arc<dyn Registry>,
    /// Transfers files to pre-signed upload URLs.
    pub uploader: Arc<dyn Uploader>,
}

impl fmt::Debug for PublishContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PublishContext {
    /// Bundle `config` with the registry and uploader of a run.
    pub fn new(
        config: PublishConfig,
        registry: Arc<dyn Registry>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            uploader,
        }
    }
}
