//! Publishes a locally built Terraform provider release to a private registry.
//!
//! A run converges the registry onto the release directory in four ensure
//! steps (provider, signing key, version, platforms) and uploads only what the
//! registry reports as missing, so re-running after a failure is always safe.
//!
//! - [`locator`] finds the release description and derives name, version and protocols.
//! - [`checksums`] matches `SHA256SUMS` lines to provider archives.
//! - [`registry`] talks to the registry API.
//! - [`upload`] sends files to pre-signed URLs.
//! - [`reconcile`] drives the whole sequence.

pub mod checksums;
pub mod context;
pub mod error;
pub mod locator;
pub mod reconcile;
pub mod registry;
pub mod upload;

pub use context::{PublishConfig, PublishContext};
pub use error::PublishError;
pub use reconcile::{PublishReport, ReconcileState, Reconciler};
pub use registry::{Registry, RegistryClient};
pub use upload::{CurlUploader, HttpUploader, Uploader};

/// User Agent string for registry and upload requests
pub const USER_AGENT: &str = concat!("tfpublish/", env!("CARGO_PKG_VERSION"));
