//! The publish run.
//!
//! Reconciliation walks a fixed sequence of states:
//!
//! ```text
//! Start → ProviderEnsured → KeyEnsured → VersionEnsured
//!       → SumsUploaded → SigUploaded → PlatformsReconciled → Done
//! ```
//!
//! Any failure moves straight to `Failed` and aborts the run. Nothing is
//! rolled back: every ensure step looks before it creates and every upload
//! is gated on the registry's own "uploaded" flag, so the next run picks up
//! where this one stopped.
//!
//! The registry has no create-if-absent primitive. Two publishers racing on
//! the same provider can both see "absent" and both create; a single writer
//! per provider is assumed.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, TryStreamExt};
use tfpublish_schema::{
    ProviderIdentity, ProviderVersionRecord, ReleaseMetadata, SigningKey,
};
use tokio::fs;

use crate::checksums::ChecksumEntries;
use crate::locator::{self, LocatedRelease, ReleaseDir};
use crate::upload::Uploader;
use crate::{PublishContext, PublishError};

/// Suffix of the checksum file in the release directory.
pub const SHASUMS_SUFFIX: &str = "SHA256SUMS";

/// Suffix of the detached checksum signature in the release directory.
pub const SHASUMS_SIG_SUFFIX: &str = "SHA256SUMS.sig";

/// Progress of a publish run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileState {
    /// Nothing checked yet.
    #[default]
    Start,
    /// The provider exists.
    ProviderEnsured,
    /// The signing key is registered.
    KeyEnsured,
    /// The version exists.
    VersionEnsured,
    /// `SHA256SUMS` is stored.
    SumsUploaded,
    /// `SHA256SUMS.sig` is stored.
    SigUploaded,
    /// Every listed platform exists with its binary.
    PlatformsReconciled,
    /// The run completed.
    Done,
    /// The run aborted.
    Failed,
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::ProviderEnsured => "provider-ensured",
            Self::KeyEnsured => "key-ensured",
            Self::VersionEnsured => "version-ensured",
            Self::SumsUploaded => "sums-uploaded",
            Self::SigUploaded => "sig-uploaded",
            Self::PlatformsReconciled => "platforms-reconciled",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// `namespace/name` of the provider.
    pub provider: String,
    /// Published version.
    pub version: String,
    /// The provider was created by this run.
    pub provider_created: bool,
    /// The signing key was registered by this run.
    pub key_created: bool,
    /// The version was created by this run.
    pub version_created: bool,
    /// Archives matched in `SHA256SUMS`.
    pub platforms_matched: usize,
    /// Platforms created by this run.
    pub platforms_created: usize,
    /// Files sent to the registry, checksum files included.
    pub uploads: usize,
    /// Files the registry already had.
    pub uploads_skipped: usize,
    /// Final state of the run.
    pub state: ReconcileState,
}

/// A platform archive waiting for its upload.
#[derive(Debug)]
struct PendingUpload {
    os: String,
    arch: String,
    url: String,
    path: PathBuf,
}

/// Drives one publish run against the registry in its [`PublishContext`].
#[derive(Debug)]
pub struct Reconciler {
    ctx: PublishContext,
    state: ReconcileState,
    report: PublishReport,
}

impl Reconciler {
    /// A reconciler in the `Start` state.
    pub fn new(ctx: PublishContext) -> Self {
        Self {
            ctx,
            state: ReconcileState::Start,
            report: PublishReport::default(),
        }
    }

    /// Current state; `Failed` after an aborted run.
    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Converge the registry onto the configured release directory.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the registry keeps whatever was created before it.
    pub async fn run(&mut self) -> Result<PublishReport, PublishError> {
        match self.reconcile().await {
            Ok(()) => {
                self.advance(ReconcileState::Done);
                tracing::info!(
                    "Successfully published {} {}",
                    self.report.provider,
                    self.report.version
                );
                Ok(self.report.clone())
            }
            Err(err) => {
                tracing::error!(state = %self.state, "Publish failed: {err}");
                self.advance(ReconcileState::Failed);
                Err(err)
            }
        }
    }

    fn advance(&mut self, next: ReconcileState) {
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
        self.report.state = next;
    }

    async fn reconcile(&mut self) -> Result<(), PublishError> {
        let config = Arc::clone(&self.ctx.config);
        let release = locator::locate(&config.provider_dir, &config.workspace_root).await?;
        let identity = release.identity(&config.organization);
        let meta = &release.metadata;

        self.report.provider = identity.to_string();
        self.report.version.clone_from(&meta.version);

        self.ensure_provider(&identity).await?;
        self.advance(ReconcileState::ProviderEnsured);

        let key = self.ensure_signing_key(&config.gpg_key).await?;
        self.advance(ReconcileState::KeyEnsured);

        let version = self.ensure_version(&identity, meta, &key).await?;
        self.advance(ReconcileState::VersionEnsured);

        let (sums, sig) = checksum_files(&release)?;

        tracing::info!("Checking if we need to upload sha256 file...");
        self.upload_unless_stored(
            version.shasums_uploaded,
            version.upload_links.shasums.as_deref(),
            &sums,
        )
        .await?;
        self.advance(ReconcileState::SumsUploaded);

        tracing::info!("Checking if we need to upload sig file...");
        self.upload_unless_stored(
            version.shasums_sig_uploaded,
            version.upload_links.shasums_sig.as_deref(),
            &sig,
        )
        .await?;
        self.advance(ReconcileState::SigUploaded);

        self.reconcile_platforms(&identity, meta, &release.dir, &sums)
            .await?;
        self.advance(ReconcileState::PlatformsReconciled);

        Ok(())
    }

    async fn ensure_provider(&mut self, identity: &ProviderIdentity) -> Result<(), PublishError> {
        tracing::info!("Checking to see if provider {identity} already exists...");
        if self
            .ctx
            .registry
            .get_provider(identity)
            .await?
            .is_some()
        {
            return Ok(());
        }

        tracing::info!("Provider did not exist, creating {identity}...");
        self.ctx.registry.create_provider(identity).await?;
        self.report.provider_created = true;
        Ok(())
    }

    async fn ensure_signing_key(&mut self, ascii_armor: &str) -> Result<SigningKey, PublishError> {
        tracing::info!("Checking to see if gpg key exists...");
        let existing = self
            .ctx
            .registry
            .list_signing_keys()
            .await?
            .unwrap_or_default();

        if let Some(key) = existing.into_iter().find(|k| k.ascii_armor == ascii_armor) {
            tracing::debug!("Using existing gpg key {}", key.key_id);
            return Ok(key);
        }

        tracing::info!("Gpg key does not exist, creating...");
        let key = self.ctx.registry.create_signing_key(ascii_armor).await?;
        self.report.key_created = true;
        Ok(key)
    }

    async fn ensure_version(
        &mut self,
        identity: &ProviderIdentity,
        meta: &ReleaseMetadata,
        key: &SigningKey,
    ) -> Result<ProviderVersionRecord, PublishError> {
        tracing::info!(
            "Checking to see if provider version {} exists...",
            meta.version
        );
        if let Some(version) = self
            .ctx
            .registry
            .get_provider_version(identity, &meta.version)
            .await?
        {
            return Ok(version);
        }

        tracing::info!("Creating new provider version {}", meta.version);
        let version = self
            .ctx
            .registry
            .create_provider_version(
                identity,
                &meta.version,
                &meta.protocol_versions,
                &key.key_id,
            )
            .await?;
        self.report.version_created = true;
        Ok(version)
    }

    async fn upload_unless_stored(
        &mut self,
        stored: bool,
        link: Option<&str>,
        path: &Path,
    ) -> Result<(), PublishError> {
        if stored {
            tracing::info!("File {} already uploaded", path.display());
            self.report.uploads_skipped += 1;
            return Ok(());
        }

        let url = link.ok_or_else(|| {
            PublishError::upload(path, "registry did not provide an upload link")
        })?;
        self.ctx.uploader.upload(url, path).await?;
        self.report.uploads += 1;
        Ok(())
    }

    /// Ensure a platform for every archive in `SHA256SUMS`, then upload the missing binaries.
    ///
    /// Platforms are ensured one at a time with a fresh listing each, so two
    /// entries for the same (os, arch) never create two platforms. Uploads
    /// run afterwards, up to `jobs` at once.
    async fn reconcile_platforms(
        &mut self,
        identity: &ProviderIdentity,
        meta: &ReleaseMetadata,
        dir: &ReleaseDir,
        sums: &Path,
    ) -> Result<(), PublishError> {
        let raw = fs::read(sums).await?;
        let contents = String::from_utf8_lossy(&raw);
        let registry = Arc::clone(&self.ctx.registry);
        let name = meta.provider_name.as_str();
        let version = meta.version.as_str();

        let mut pending: Vec<PendingUpload> = Vec::new();
        for entry in ChecksumEntries::new(&contents, name, version) {
            self.report.platforms_matched += 1;
            tracing::info!(
                "Checking to see if platform {}_{} for {name} {version} already exists",
                entry.os,
                entry.arch
            );

            let existing = registry
                .list_platforms(identity, version)
                .await?
                .unwrap_or_default();
            let platform = match existing
                .into_iter()
                .find(|p| p.is_platform(&entry.os, &entry.arch))
            {
                Some(platform) => platform,
                None => {
                    tracing::info!(
                        "Creating platform {}_{} for {name} {version}",
                        entry.os,
                        entry.arch
                    );
                    let created = registry.create_platform(identity, version, &entry).await?;
                    self.report.platforms_created += 1;
                    created
                }
            };

            if platform.binary_uploaded {
                tracing::info!("File {} already uploaded", entry.filename);
                self.report.uploads_skipped += 1;
                continue;
            }
            if pending
                .iter()
                .any(|p| p.os == entry.os && p.arch == entry.arch)
            {
                tracing::debug!(
                    "Upload for {}_{} already queued, skipping {}",
                    entry.os,
                    entry.arch,
                    entry.filename
                );
                continue;
            }

            let path = dir.join(&entry.filename);
            let url = platform.upload_link.ok_or_else(|| {
                PublishError::upload(&path, "registry did not provide an upload link")
            })?;
            pending.push(PendingUpload {
                os: entry.os,
                arch: entry.arch,
                url,
                path,
            });
        }

        let count = pending.len();
        upload_all(self.ctx.uploader.as_ref(), pending, self.ctx.config.jobs).await?;
        self.report.uploads += count;
        Ok(())
    }
}

/// Paths of the checksum file and its signature.
fn checksum_files(release: &LocatedRelease) -> Result<(PathBuf, PathBuf), PublishError> {
    match (
        release.release_file(SHASUMS_SUFFIX),
        release.release_file(SHASUMS_SIG_SUFFIX),
    ) {
        (Some(sums), Some(sig)) => Ok((release.dir.join(sums), release.dir.join(sig))),
        _ => Err(PublishError::discovery(format!(
            "Unable to find sum file and/or signature file for {} {}",
            release.metadata.provider_name, release.metadata.version
        ))),
    }
}

async fn upload_all(
    uploader: &dyn Uploader,
    pending: Vec<PendingUpload>,
    jobs: usize,
) -> Result<(), PublishError> {
    stream::iter(pending.into_iter().map(Ok::<_, PublishError>))
        .try_for_each_concurrent(jobs.max(1), move |upload| async move {
            tracing::debug!("Uploading binary for {}_{}", upload.os, upload.arch);
            uploader.upload(&upload.url, &upload.path).await
        })
        .await
}
