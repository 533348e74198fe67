//! Publish command

use std::sync::Arc;

use anyhow::{Context, Result};
use tfpublish_core::{
    CurlUploader, HttpUploader, PublishConfig, PublishContext, Reconciler, RegistryClient,
    Uploader,
};

use crate::{PublishArgs, UploadMethod};

/// Variables consulted after the flag and its `INPUT_*` variable.
const ORGANIZATION_VAR: &str = "TFPUBLISH_ORGANIZATION";
const API_TOKEN_VAR: &str = "TFPUBLISH_API_TOKEN";

/// Publish the release described by `args`.
pub async fn publish(args: &PublishArgs) -> Result<()> {
    let config = load_config(args).await?;
    tracing::debug!(?config, "Loaded configuration");

    let registry = RegistryClient::new(&args.api_url, &config.organization, &config.api_token)?;
    let uploader: Arc<dyn Uploader> = match args.upload_method {
        UploadMethod::Http => Arc::new(HttpUploader::new()?),
        UploadMethod::Curl => Arc::new(CurlUploader::default()),
    };

    let ctx = PublishContext::new(config, Arc::new(registry), uploader);
    let report = Reconciler::new(ctx).run().await?;

    tracing::debug!(?report, "Run finished");
    println!(
        "Successfully published {} {}",
        report.provider, report.version
    );
    Ok(())
}

/// Resolve every input into a validated [`PublishConfig`].
pub(crate) async fn load_config(args: &PublishArgs) -> Result<PublishConfig> {
    let gpg_key = match &args.gpg_key_file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read GPG key file {}", path.display()))?,
        None => args.gpg_key.clone().unwrap_or_default(),
    };
    let workspace = super::workspace_root(args.workspace.as_ref())?;

    let config = PublishConfig::new(
        &with_fallback(args.organization.as_deref(), ORGANIZATION_VAR),
        &with_fallback(args.api_token.as_deref(), API_TOKEN_VAR),
        &workspace,
        &args.provider_directory,
        &gpg_key,
    )?;
    Ok(config.with_jobs(args.jobs))
}

fn with_fallback(value: Option<&str>, var: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => std::env::var(var).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn args(root: &TempDir) -> PublishArgs {
        PublishArgs {
            organization: Some("acme".into()),
            api_token: Some("token".into()),
            provider_directory: PathBuf::from("dist"),
            gpg_key: Some("-----BEGIN PGP PUBLIC KEY BLOCK-----".into()),
            gpg_key_file: None,
            workspace: Some(root.path().to_path_buf()),
            api_url: crate::DEFAULT_API_URL.to_string(),
            upload_method: UploadMethod::Http,
            jobs: 4,
        }
    }

    #[tokio::test]
    async fn test_load_config() {
        let root = TempDir::new().unwrap();
        let config = load_config(&args(&root)).await.unwrap();
        assert_eq!(config.organization, "acme");
        assert_eq!(config.provider_dir, root.path().join("dist"));
        assert_eq!(config.jobs, 4);
    }

    #[tokio::test]
    async fn test_key_from_file() {
        let root = TempDir::new().unwrap();
        let key_path = root.path().join("key.asc");
        std::fs::write(&key_path, "-----BEGIN PGP PUBLIC KEY BLOCK-----\nfile\n").unwrap();

        let mut args = args(&root);
        args.gpg_key = None;
        args.gpg_key_file = Some(key_path);
        let config = load_config(&args).await.unwrap();
        assert!(config.gpg_key.ends_with("file\n"));
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let root = TempDir::new().unwrap();
        let mut args = args(&root);
        args.gpg_key = None;
        let err = load_config(&args).await.unwrap_err();
        assert!(err.to_string().contains("GPG key"));
    }
}
