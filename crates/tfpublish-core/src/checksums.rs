//! `SHA256SUMS` matching.
//!
//! The checksum file lists every file of a release, not only provider
//! archives, and may mention other providers too. Lines are decoded lazily;
//! anything that is not a zip archive of the expected provider and version is
//! skipped with a debug note, never treated as an error.

use std::str::Lines;

use tfpublish_schema::{ArtifactName, LocalArtifactEntry, PROVIDER_PREFIX};

/// Why a checksum line did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank line.
    Empty,
    /// Not exactly `<digest> <filename>`.
    Malformed,
    /// Filename is not `<provider>_<version>_<os>_<arch>.<extension>`.
    UnrecognizedName,
    /// Archive format other than zip.
    NotZip,
    /// Archive of a different provider.
    OtherProvider,
    /// Archive of a different version.
    OtherVersion,
}

/// Decode one checksum line, accepting only zip archives of `provider` at `version`.
///
/// `provider` is the full name, `terraform-provider-<name>`.
pub fn match_line(
    line: &str,
    provider: &str,
    version: &str,
) -> Result<LocalArtifactEntry, SkipReason> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SkipReason::Empty);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [shasum, filename] = parts.as_slice() else {
        return Err(SkipReason::Malformed);
    };
    // sha256sum marks binary-mode entries with a leading '*'
    let filename = filename.trim_start_matches('*');

    let name = ArtifactName::parse(filename).ok_or(SkipReason::UnrecognizedName)?;
    if !name.is_zip() {
        return Err(SkipReason::NotZip);
    }
    if name.provider != provider {
        return Err(SkipReason::OtherProvider);
    }
    if name.version != version {
        return Err(SkipReason::OtherVersion);
    }

    Ok(LocalArtifactEntry {
        shasum: (*shasum).to_string(),
        filename: filename.to_string(),
        os: name.os.to_string(),
        arch: name.arch.to_string(),
    })
}

/// Lazy sequence of the provider archives listed in a checksum file.
#[derive(Debug)]
pub struct ChecksumEntries<'a> {
    lines: Lines<'a>,
    provider: String,
    version: &'a str,
}

impl<'a> ChecksumEntries<'a> {
    /// Iterate the archives of `provider_name` (short name) at `version` in `contents`.
    pub fn new(contents: &'a str, provider_name: &str, version: &'a str) -> Self {
        Self {
            lines: contents.lines(),
            provider: format!("{PROVIDER_PREFIX}{provider_name}"),
            version,
        }
    }
}

impl Iterator for ChecksumEntries<'_> {
    type Item = LocalArtifactEntry;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match match_line(line, &self.provider, self.version) {
                Ok(entry) => return Some(entry),
                Err(SkipReason::Empty) => tracing::debug!("Skipping empty line"),
                Err(reason) => tracing::debug!(?reason, "Skipping line {line:?}"),
            }
        }
        None
    }
}
