//! tfpublish - Terraform provider publisher
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Pushes a GoReleaser-built provider release into an organization's private
//! registry. Safe to re-run: only what the registry is missing gets created
//! or uploaded.
//!
//! Every `publish` input can come from a flag, from the GitHub Actions
//! `INPUT_*` variables, or from a `TFPUBLISH_*` variable, in that order.

pub mod cmd;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub use tfpublish_core::registry::client::DEFAULT_API_URL;

#[derive(Debug, Parser)]
#[command(name = "tfpublish")]
#[command(
    author,
    version,
    about = "Publish Terraform provider releases to a private registry"
)]
pub struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the provider, key, version and platforms, and upload the release files
    Publish(PublishArgs),
    /// Show what a release directory contains without contacting the registry
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Organization name; also the provider namespace
    #[arg(long, env = "INPUT_ORGANIZATION-NAME", hide_env_values = true)]
    pub organization: Option<String>,

    /// Organization API token
    #[arg(long, env = "INPUT_ORGANIZATION-API-TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Release directory, relative to the workspace root
    #[arg(long, env = "INPUT_PROVIDER-DIRECTORY", default_value = "dist")]
    pub provider_directory: PathBuf,

    /// ASCII-armored public key of the release signature
    #[arg(long, env = "INPUT_GPG-KEY", hide_env_values = true)]
    pub gpg_key: Option<String>,

    /// Read the public key from a file instead
    #[arg(long, conflicts_with = "gpg_key")]
    pub gpg_key_file: Option<PathBuf>,

    /// Repository root [default: current directory]
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Registry API base URL
    #[arg(long, env = "TFPUBLISH_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// How files are sent to the registry's upload URLs
    #[arg(long, value_enum, default_value_t = UploadMethod::Http)]
    pub upload_method: UploadMethod,

    /// Maximum concurrent binary uploads
    #[arg(long, short = 'j', default_value_t = 1)]
    pub jobs: usize,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Organization to show the provider address for
    #[arg(long, env = "INPUT_ORGANIZATION-NAME")]
    pub organization: Option<String>,

    /// Release directory, relative to the workspace root
    #[arg(long, env = "INPUT_PROVIDER-DIRECTORY", default_value = "dist")]
    pub provider_directory: PathBuf,

    /// Repository root [default: current directory]
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub workspace: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UploadMethod {
    /// Streamed HTTP PUT
    Http,
    /// `curl -T`
    Curl,
}
