//! In-memory registry and uploader for reconciliation tests.
//!
//! Upload URLs handed out by [`StubRegistry`] use a `stub://` scheme; the
//! [`RecordingUploader`] feeds them back so the stub flips the matching
//! "uploaded" flag, the way the real registry does after a successful PUT.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tfpublish_core::{PublishConfig, PublishContext, PublishError, Registry, Uploader};
use tfpublish_schema::{
    LocalArtifactEntry, Provider, ProviderIdentity, ProviderPlatformRecord, ProviderVersionRecord,
    SigningKey, VersionUploadLinks,
};

pub const ORG: &str = "acme";
pub const GPG_KEY: &str =
    "-----BEGIN PGP PUBLIC KEY BLOCK-----\nmQINBGTest\n-----END PGP PUBLIC KEY BLOCK-----\n";
pub const MANIFEST: &str = r#"{"version": 1, "metadata": {"protocol_versions": ["5.0"]}}"#;

/// Number of create calls per resource type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreateCounts {
    pub providers: usize,
    pub keys: usize,
    pub versions: usize,
    pub platforms: usize,
}

#[derive(Debug, Default)]
struct State {
    providers: Vec<ProviderIdentity>,
    keys: Vec<SigningKey>,
    versions: Vec<(String, ProviderVersionRecord)>,
    platforms: Vec<(String, ProviderPlatformRecord)>,
    creates: CreateCounts,
    platform_lists: usize,
}

#[derive(Debug, Default)]
pub struct StubRegistry {
    state: Mutex<State>,
    omit_links: bool,
}

impl StubRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A registry that never hands out upload links.
    pub fn without_links() -> Arc<Self> {
        Arc::new(Self {
            omit_links: true,
            ..Self::default()
        })
    }

    pub fn creates(&self) -> CreateCounts {
        self.state.lock().unwrap().creates
    }

    pub fn platform_lists(&self) -> usize {
        self.state.lock().unwrap().platform_lists
    }

    pub fn providers(&self) -> Vec<ProviderIdentity> {
        self.state.lock().unwrap().providers.clone()
    }

    pub fn platforms(&self) -> Vec<ProviderPlatformRecord> {
        let state = self.state.lock().unwrap();
        state.platforms.iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn seed_key(&self, key_id: &str, ascii_armor: &str) {
        self.state.lock().unwrap().keys.push(SigningKey {
            key_id: key_id.to_string(),
            ascii_armor: ascii_armor.to_string(),
            namespace: ORG.to_string(),
        });
    }

    /// Pretend an earlier run created `version` and stored its checksum files as given.
    pub fn seed_version(&self, name: &str, version: &str, sums: bool, sig: bool) {
        let mut state = self.state.lock().unwrap();
        state.providers.push(ProviderIdentity::private(ORG, name));
        let record = self.version_record(version, "SEEDED", sums, sig);
        state.versions.push((name.to_string(), record));
    }

    fn version_record(
        &self,
        version: &str,
        key_id: &str,
        sums: bool,
        sig: bool,
    ) -> ProviderVersionRecord {
        let link = |kind: &str| (!self.omit_links).then(|| format!("stub://{kind}/{version}"));
        ProviderVersionRecord {
            version: version.to_string(),
            protocols: vec!["5.0".to_string()],
            key_id: key_id.to_string(),
            shasums_uploaded: sums,
            shasums_sig_uploaded: sig,
            upload_links: VersionUploadLinks {
                shasums: link("sums"),
                shasums_sig: link("sig"),
            },
        }
    }

    /// Record a finished upload to a `stub://` URL.
    pub fn mark_uploaded(&self, url: &str) {
        let mut state = self.state.lock().unwrap();
        let Some(rest) = url.strip_prefix("stub://") else {
            return;
        };
        let mut parts = rest.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("sums"), Some(version), None) => {
                for (_, v) in state.versions.iter_mut().filter(|(_, v)| v.version == version) {
                    v.shasums_uploaded = true;
                }
            }
            (Some("sig"), Some(version), None) => {
                for (_, v) in state.versions.iter_mut().filter(|(_, v)| v.version == version) {
                    v.shasums_sig_uploaded = true;
                }
            }
            (Some("binary"), Some(version), Some(platform)) => {
                for (v, p) in &mut state.platforms {
                    if *v == version && format!("{}_{}", p.os, p.arch) == platform {
                        p.binary_uploaded = true;
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Registry for StubRegistry {
    async fn get_provider(
        &self,
        provider: &ProviderIdentity,
    ) -> Result<Option<Provider>, PublishError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .providers
            .iter()
            .find(|p| *p == provider)
            .map(|p| Provider {
                id: format!("prov-{}", p.name),
                name: p.name.clone(),
                namespace: p.namespace.clone(),
            }))
    }

    async fn create_provider(&self, provider: &ProviderIdentity) -> Result<Provider, PublishError> {
        let mut state = self.state.lock().unwrap();
        state.creates.providers += 1;
        state.providers.push(provider.clone());
        Ok(Provider {
            id: format!("prov-{}", provider.name),
            name: provider.name.clone(),
            namespace: provider.namespace.clone(),
        })
    }

    async fn list_signing_keys(&self) -> Result<Option<Vec<SigningKey>>, PublishError> {
        Ok(Some(self.state.lock().unwrap().keys.clone()))
    }

    async fn create_signing_key(&self, ascii_armor: &str) -> Result<SigningKey, PublishError> {
        let mut state = self.state.lock().unwrap();
        state.creates.keys += 1;
        let key = SigningKey {
            key_id: format!("KEY{}", state.keys.len() + 1),
            ascii_armor: ascii_armor.to_string(),
            namespace: ORG.to_string(),
        };
        state.keys.push(key.clone());
        Ok(key)
    }

    async fn get_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<ProviderVersionRecord>, PublishError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .versions
            .iter()
            .find(|(n, v)| *n == provider.name && v.version == version)
            .map(|(_, v)| v.clone()))
    }

    async fn create_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
        _protocols: &[String],
        key_id: &str,
    ) -> Result<ProviderVersionRecord, PublishError> {
        let record = self.version_record(version, key_id, false, false);
        let mut state = self.state.lock().unwrap();
        state.creates.versions += 1;
        state.versions.push((provider.name.clone(), record.clone()));
        Ok(record)
    }

    async fn list_platforms(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<Vec<ProviderPlatformRecord>>, PublishError> {
        let mut state = self.state.lock().unwrap();
        state.platform_lists += 1;
        if !state
            .versions
            .iter()
            .any(|(n, v)| *n == provider.name && v.version == version)
        {
            return Ok(None);
        }
        Ok(Some(
            state
                .platforms
                .iter()
                .filter(|(v, _)| v == version)
                .map(|(_, p)| p.clone())
                .collect(),
        ))
    }

    async fn create_platform(
        &self,
        _provider: &ProviderIdentity,
        version: &str,
        artifact: &LocalArtifactEntry,
    ) -> Result<ProviderPlatformRecord, PublishError> {
        let record = ProviderPlatformRecord {
            os: artifact.os.clone(),
            arch: artifact.arch.clone(),
            shasum: artifact.shasum.clone(),
            filename: artifact.filename.clone(),
            binary_uploaded: false,
            upload_link: (!self.omit_links)
                .then(|| format!("stub://binary/{version}/{}_{}", artifact.os, artifact.arch)),
        };
        let mut state = self.state.lock().unwrap();
        state.creates.platforms += 1;
        state.platforms.push((version.to_string(), record.clone()));
        Ok(record)
    }
}

/// Records every upload and reports it back to the stub registry.
#[derive(Debug)]
pub struct RecordingUploader {
    registry: Arc<StubRegistry>,
    uploads: Mutex<Vec<(String, PathBuf)>>,
    fail_on: Option<String>,
}

impl RecordingUploader {
    pub fn new(registry: &Arc<StubRegistry>) -> Arc<Self> {
        Arc::new(Self {
            registry: Arc::clone(registry),
            uploads: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }

    /// An uploader that rejects every URL containing `needle`.
    pub fn failing_on(registry: &Arc<StubRegistry>, needle: &str) -> Arc<Self> {
        Arc::new(Self {
            registry: Arc::clone(registry),
            uploads: Mutex::new(Vec::new()),
            fail_on: Some(needle.to_string()),
        })
    }

    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .uploads
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, path)| path.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, url: &str, path: &Path) -> Result<(), PublishError> {
        if self.fail_on.as_deref().is_some_and(|n| url.contains(n)) {
            return Err(PublishError::Upload {
                path: path.to_path_buf(),
                message: "connection reset".to_string(),
            });
        }
        assert!(path.is_file(), "upload of missing file {}", path.display());
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), path.to_path_buf()));
        self.registry.mark_uploaded(url);
        Ok(())
    }
}

/// A repository checkout with a built `dist/` directory for provider `foo` 1.0.0.
pub struct Fixture {
    pub root: TempDir,
}

impl Fixture {
    /// Release with linux/amd64 and darwin/arm64 archives.
    pub fn new() -> Self {
        Self::with_sums(
            "\
aaa111  terraform-provider-foo_1.0.0_linux_amd64.zip
bbb222  terraform-provider-foo_1.0.0_darwin_arm64.zip
",
        )
    }

    /// Release whose `SHA256SUMS` holds `sums`; every zip it names is created.
    pub fn with_sums(sums: &str) -> Self {
        let root = TempDir::new().unwrap();
        let dist = root.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("terraform-provider-foo_1.0.0_manifest.json"), MANIFEST).unwrap();
        std::fs::write(dist.join("terraform-provider-foo_1.0.0_SHA256SUMS"), sums).unwrap();
        std::fs::write(dist.join("terraform-provider-foo_1.0.0_SHA256SUMS.sig"), "sig").unwrap();
        for line in sums.lines() {
            if let Some(name) = line.split_whitespace().nth(1)
                && name.ends_with(".zip")
            {
                std::fs::write(dist.join(name.trim_start_matches('*')), "zip").unwrap();
            }
        }
        Self { root }
    }

    pub fn dist(&self) -> PathBuf {
        self.root.path().join("dist")
    }

    pub fn config(&self) -> PublishConfig {
        PublishConfig::new(ORG, "token", self.root.path(), Path::new("dist"), GPG_KEY).unwrap()
    }

    pub fn context(
        &self,
        registry: &Arc<StubRegistry>,
        uploader: &Arc<RecordingUploader>,
    ) -> PublishContext {
        self.context_with(self.config(), registry, uploader)
    }

    pub fn context_with(
        &self,
        config: PublishConfig,
        registry: &Arc<StubRegistry>,
        uploader: &Arc<RecordingUploader>,
    ) -> PublishContext {
        PublishContext::new(
            config,
            Arc::clone(registry) as Arc<dyn Registry>,
            Arc::clone(uploader) as Arc<dyn Uploader>,
        )
    }
}
