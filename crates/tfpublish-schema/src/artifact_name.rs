//! Strict decoding of provider archive filenames.
//!
//! Release tooling names every archive `<provider>_<version>_<os>_<arch>.<extension>`,
//! e.g. `terraform-provider-foo_1.0.0_linux_amd64.zip`. Anything that does not
//! fit this shape is not a provider binary.

use regex::Regex;
use std::sync::LazyLock;

static ARTIFACT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<provider>[a-zA-Z0-9.-]+)_(?P<version>[a-zA-Z0-9.-]+)_(?P<os>[a-zA-Z0-9-]+)_(?P<arch>[a-zA-Z0-9-]+)\.(?P<extension>[a-zA-Z0-9.-]+)$",
    )
    .expect("artifact name pattern is valid")
});

/// The segments of a provider archive filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName<'a> {
    /// Full provider name, including the `terraform-provider-` prefix.
    pub provider: &'a str,
    /// Release version.
    pub version: &'a str,
    /// Target operating system (e.g. `linux`).
    pub os: &'a str,
    /// Target CPU architecture (e.g. `amd64`).
    pub arch: &'a str,
    /// Everything after the first dot following the architecture.
    pub extension: &'a str,
}

impl<'a> ArtifactName<'a> {
    /// Decode `filename`, returning `None` if it does not follow the archive naming scheme.
    pub fn parse(filename: &'a str) -> Option<Self> {
        let caps = ARTIFACT_NAME.captures(filename)?;
        let segment = |name: &str| caps.name(name).map(|m| m.as_str());

        Some(Self {
            provider: segment("provider")?,
            version: segment("version")?,
            os: segment("os")?,
            arch: segment("arch")?,
            extension: segment("extension")?,
        })
    }

    /// Whether this is a zip archive, the only format the registry accepts.
    pub fn is_zip(&self) -> bool {
        self.extension == "zip"
    }
}
