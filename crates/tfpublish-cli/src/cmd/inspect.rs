//! Inspect command

use anyhow::Result;
use tfpublish_core::checksums::ChecksumEntries;
use tfpublish_core::locator::{self, ManifestSource};
use tfpublish_core::reconcile::{SHASUMS_SIG_SUFFIX, SHASUMS_SUFFIX};
use tfpublish_schema::PROVIDER_PREFIX;

use crate::InspectArgs;

/// Print what would be published from the release directory.
pub async fn inspect(args: &InspectArgs) -> Result<()> {
    let workspace = super::workspace_root(args.workspace.as_ref())?;
    let provider_dir = workspace.join(&args.provider_directory);
    let release = locator::locate(&provider_dir, &workspace).await?;
    let meta = &release.metadata;

    let lw = 11;
    let address = match args.organization.as_deref().filter(|o| !o.is_empty()) {
        Some(org) => release.identity(org).to_string(),
        None => meta.provider_name.clone(),
    };
    let source = match &release.source {
        ManifestSource::Versioned { file_name, .. } => file_name.clone(),
        ManifestSource::Metadata { metadata, registry_manifest } => format!(
            "{} + {}",
            metadata.display(),
            registry_manifest.display()
        ),
    };

    println!("{:<lw$}{address} ({PROVIDER_PREFIX}{})", "provider", meta.provider_name);
    println!("{:<lw$}{}", "version", meta.version);
    println!("{:<lw$}{}", "protocols", meta.protocol_versions.join(", "));
    println!("{:<lw$}{source}", "manifest");

    let Some(sums) = release.release_file(SHASUMS_SUFFIX) else {
        println!("{:<lw$}none (no {SHASUMS_SUFFIX} file)", "platforms");
        return Ok(());
    };
    let signature = release
        .release_file(SHASUMS_SIG_SUFFIX)
        .unwrap_or("missing");
    println!("{:<lw$}{sums}", "checksums");
    println!("{:<lw$}{signature}", "signature");

    let raw = tokio::fs::read(release.dir.join(sums)).await?;
    let contents = String::from_utf8_lossy(&raw);
    let entries: Vec<_> = ChecksumEntries::new(&contents, &meta.provider_name, &meta.version).collect();

    println!("{:<lw$}{}", "platforms", entries.len());
    for entry in &entries {
        let platform = format!("{}_{}", entry.os, entry.arch);
        let present = if release.dir.contains(&entry.filename) {
            ""
        } else {
            " (file missing)"
        };
        println!("  {platform:<16}{}{present}", entry.filename);
    }
    Ok(())
}
