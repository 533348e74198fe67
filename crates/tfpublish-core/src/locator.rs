//! Release discovery.
//!
//! Finds out which provider and version a release directory holds and which
//! plugin protocols it speaks. Two layouts are supported (see
//! [`tfpublish_schema::manifest`]); the layout is detected once into a
//! [`ManifestSource`] and resolved from there.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tfpublish_schema::manifest::{
    GoReleaserMetadata, MANIFEST_SUFFIX, METADATA_FILE, REGISTRY_MANIFEST_FILE, RegistryManifest,
    parse_manifest_file_name,
};
use tfpublish_schema::{PROVIDER_PREFIX, ProviderIdentity, ReleaseMetadata};
use tokio::fs;

use crate::PublishError;

/// A snapshot of the release directory's file names, sorted.
#[derive(Debug, Clone)]
pub struct ReleaseDir {
    path: PathBuf,
    entries: Vec<String>,
}

impl ReleaseDir {
    /// List `path`. Names that are not valid UTF-8 cannot be release files and are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Discovery`] if the directory cannot be read.
    pub async fn scan(path: &Path) -> Result<Self, PublishError> {
        let mut reader = fs::read_dir(path).await.map_err(|e| {
            PublishError::discovery(format!(
                "Unable to read provider directory {}: {e}",
                path.display()
            ))
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if let Ok(name) = entry.file_name().into_string() {
                entries.push(name);
            }
        }
        entries.sort();

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sorted file names.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether a file called exactly `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e == name)
    }

    /// Path of `name` inside the directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Where the release description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// `terraform-provider-<name>_<version>_manifest.json` inside the release directory.
    Versioned {
        /// Manifest filename; carries name and version.
        file_name: String,
        /// Full path of the manifest.
        path: PathBuf,
    },
    /// GoReleaser `metadata.json` plus the repository's `terraform-registry-manifest.json`.
    Metadata {
        /// Path of `metadata.json`.
        metadata: PathBuf,
        /// Path of the repository-level registry manifest.
        registry_manifest: PathBuf,
    },
}

impl ManifestSource {
    /// Pick the layout by looking at which files exist.
    ///
    /// A per-version manifest wins when present. The repository-level manifest
    /// name also ends in `manifest.json` and is never taken for one.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Discovery`] if neither layout is complete, or if
    /// the directory holds manifests of more than one release.
    pub async fn detect(release: &ReleaseDir, repo_root: &Path) -> Result<Self, PublishError> {
        let versioned: Vec<&String> = release
            .entries()
            .iter()
            .filter(|name| {
                name.ends_with(MANIFEST_SUFFIX) && name.as_str() != REGISTRY_MANIFEST_FILE
            })
            .collect();

        match versioned.as_slice() {
            [] => {}
            [file_name] => {
                return Ok(Self::Versioned {
                    file_name: (*file_name).clone(),
                    path: release.join(file_name),
                });
            }
            several => {
                let names: Vec<&str> = several.iter().map(|n| n.as_str()).collect();
                return Err(PublishError::discovery(format!(
                    "Multiple manifest files found in {}: {}",
                    release.path().display(),
                    names.join(", ")
                )));
            }
        }

        if !release.contains(METADATA_FILE) {
            return Err(PublishError::discovery(format!(
                "Unable to find manifest or metadata file in {}",
                release.path().display()
            )));
        }

        let registry_manifest = repo_root.join(REGISTRY_MANIFEST_FILE);
        if !fs::try_exists(&registry_manifest).await.unwrap_or(false) {
            return Err(PublishError::discovery(format!(
                "Unable to find {REGISTRY_MANIFEST_FILE} file in {}",
                repo_root.display()
            )));
        }

        Ok(Self::Metadata {
            metadata: release.join(METADATA_FILE),
            registry_manifest,
        })
    }

    /// Read the files behind this source into a [`ReleaseMetadata`].
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Discovery`] if a file is unreadable, malformed,
    /// or names the provider without the `terraform-provider-` prefix.
    pub async fn resolve(&self) -> Result<ReleaseMetadata, PublishError> {
        match self {
            Self::Versioned { file_name, path } => {
                let (name, version) = parse_manifest_file_name(file_name)?;
                let manifest: RegistryManifest = read_json(path).await?;
                Ok(ReleaseMetadata {
                    provider_name: name.to_string(),
                    version: version.to_string(),
                    protocol_versions: manifest.metadata.protocol_versions,
                })
            }
            Self::Metadata {
                metadata,
                registry_manifest,
            } => {
                let meta: GoReleaserMetadata = read_json(metadata).await?;
                let (name, version) = meta.provider_and_version()?;
                let manifest: RegistryManifest = read_json(registry_manifest).await?;
                Ok(ReleaseMetadata {
                    provider_name: name.to_string(),
                    version: version.to_string(),
                    protocol_versions: manifest.metadata.protocol_versions,
                })
            }
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PublishError> {
    let raw = fs::read_to_string(path).await.map_err(|e| {
        PublishError::discovery(format!("Unable to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| PublishError::discovery(format!("Invalid JSON in {}: {e}", path.display())))
}

/// A release directory together with what it describes.
#[derive(Debug, Clone)]
pub struct LocatedRelease {
    /// Name, version and protocols of the release.
    pub metadata: ReleaseMetadata,
    /// Which layout the description was read from.
    pub source: ManifestSource,
    /// The scanned release directory.
    pub dir: ReleaseDir,
}

impl LocatedRelease {
    /// The provider's identity within `namespace`'s private registry.
    pub fn identity(&self, namespace: &str) -> ProviderIdentity {
        ProviderIdentity::private(namespace, &self.metadata.provider_name)
    }

    /// The release file ending in `suffix`.
    ///
    /// The file named for this release (`terraform-provider-<name>_<version>_<suffix>`)
    /// wins. Otherwise the first file with the suffix is taken, skipping files
    /// named for other versions of the same provider.
    pub fn release_file(&self, suffix: &str) -> Option<&str> {
        let provider = format!("{PROVIDER_PREFIX}{}_", self.metadata.provider_name);
        let exact = format!("{provider}{}_{suffix}", self.metadata.version);
        let names = || self.dir.entries().iter().map(String::as_str);
        names()
            .find(|name| *name == exact)
            .or_else(|| names().find(|name| name.ends_with(suffix) && !name.starts_with(&provider)))
    }
}

/// Scan `provider_dir` and resolve the release it holds.
///
/// # Errors
///
/// Returns [`PublishError::Discovery`] when the directory cannot be read or does
/// not contain a complete release description.
pub async fn locate(provider_dir: &Path, repo_root: &Path) -> Result<LocatedRelease, PublishError> {
    let dir = ReleaseDir::scan(provider_dir).await?;
    let source = ManifestSource::detect(&dir, repo_root).await?;
    tracing::debug!(?source, "Resolved release description source");

    let metadata = source.resolve().await?;
    tracing::info!(
        "Found provider {} version {} (protocols: {})",
        metadata.provider_name,
        metadata.version,
        metadata.protocol_versions.join(", ")
    );

    Ok(LocatedRelease {
        metadata,
        source,
        dir,
    })
}
