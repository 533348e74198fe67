//! HTTP implementation of [`Registry`] for the Terraform Cloud / Enterprise API.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tfpublish_schema::jsonapi::{
    Document, GpgKeyResource, NewGpgKey, NewPlatform, NewProviderVersion, NewResource,
    PlatformResource, ProviderAttributes, ProviderResource, ProviderVersionResource,
    resource_type,
};
use tfpublish_schema::{
    LocalArtifactEntry, Provider, ProviderIdentity, ProviderPlatformRecord, ProviderVersionRecord,
    SigningKey,
};

use super::Registry;
use crate::{PublishError, USER_AGENT};

/// Default registry host.
pub const DEFAULT_API_URL: &str = "https://app.terraform.io";

const JSON_API: &str = "application/vnd.api+json";

/// Bearer-authenticated client for one organization's private registry.
#[derive(Clone)]
pub struct RegistryClient {
    http: Client,
    base_url: String,
    organization: String,
    token: String,
}

impl fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

impl RegistryClient {
    /// Client for `organization` at `base_url` (e.g. [`DEFAULT_API_URL`]).
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, organization: &str, token: &str) -> Result<Self, PublishError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            organization: organization.to_string(),
            token: token.to_string(),
        })
    }

    fn providers_url(&self, namespace: &str) -> String {
        format!(
            "{}/api/v2/organizations/{namespace}/registry-providers",
            self.base_url
        )
    }

    fn provider_url(&self, provider: &ProviderIdentity) -> String {
        format!(
            "{}/{}/{}/{}",
            self.providers_url(&provider.namespace),
            provider.registry_kind,
            provider.namespace,
            provider.name
        )
    }

    fn versions_url(&self, provider: &ProviderIdentity) -> String {
        format!("{}/versions", self.provider_url(provider))
    }

    fn version_url(&self, provider: &ProviderIdentity, version: &str) -> String {
        format!("{}/{version}", self.versions_url(provider))
    }

    fn platforms_url(&self, provider: &ProviderIdentity, version: &str) -> String {
        format!("{}/platforms", self.version_url(provider, version))
    }

    fn gpg_keys_url(&self) -> String {
        format!("{}/api/registry/private/v2/gpg-keys", self.base_url)
    }

    /// Pagination links may be absolute or relative to the API host.
    fn absolute(&self, link: &str) -> String {
        if link.starts_with('/') {
            format!("{}{link}", self.base_url)
        } else {
            link.to_string()
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_API))
    }

    /// Send a read request. 404 means the resource does not exist.
    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        req: RequestBuilder,
    ) -> Result<Option<T>, PublishError> {
        let response = req.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{operation}: not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PublishError::Registry {
                operation,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| PublishError::json(operation, e))
    }

    /// Collect every page of a list endpoint by following `links.next`.
    ///
    /// Stops at the first link to a page already fetched, the first one included.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        first: RequestBuilder,
    ) -> Result<Option<Vec<T>>, PublishError> {
        let (http, request) = first.build_split();
        let request = request?;
        let mut seen = vec![request.url().to_string()];
        let first = RequestBuilder::from_parts(http, request);

        let Some(mut page) = self.fetch::<Document<Vec<T>>>(operation, first).await? else {
            return Ok(None);
        };

        let mut items = Vec::new();
        loop {
            let next = page.next_page().map(|link| self.absolute(link));
            items.append(&mut page.data);

            let Some(next) = next else { break };
            if seen.contains(&next) {
                tracing::warn!("{operation}: pagination loops back to {next}, stopping");
                break;
            }
            tracing::debug!("{operation}: fetching next page {next}");

            page = self
                .fetch(operation, self.request(Method::GET, &next))
                .await?
                .ok_or(PublishError::Registry {
                    operation,
                    status: StatusCode::NOT_FOUND.as_u16(),
                })?;
            seen.push(next);
        }

        Ok(Some(items))
    }

    /// Send a create request; anything but a success status is an error.
    async fn create<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        body: &B,
    ) -> Result<T, PublishError> {
        let payload = serde_json::to_vec(body).map_err(|e| PublishError::json(operation, e))?;
        let response = self.request(Method::POST, url).body(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::debug!("{operation} rejected ({status}): {detail}");
            return Err(PublishError::Registry {
                operation,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let document: Document<T> =
            serde_json::from_str(&text).map_err(|e| PublishError::json(operation, e))?;
        Ok(document.data)
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn get_provider(
        &self,
        provider: &ProviderIdentity,
    ) -> Result<Option<Provider>, PublishError> {
        let req = self.request(Method::GET, &self.provider_url(provider));
        let doc: Option<Document<ProviderResource>> = self.fetch("get provider", req).await?;
        Ok(doc.map(|d| d.data.into()))
    }

    async fn create_provider(&self, provider: &ProviderIdentity) -> Result<Provider, PublishError> {
        let body = NewResource::document(
            resource_type::PROVIDER,
            ProviderAttributes {
                name: provider.name.clone(),
                namespace: provider.namespace.clone(),
                registry_name: provider.registry_kind.as_str().to_string(),
            },
        );
        let url = self.providers_url(&provider.namespace);
        let created: ProviderResource = self.create("create provider", &url, &body).await?;
        Ok(created.into())
    }

    async fn list_signing_keys(&self) -> Result<Option<Vec<SigningKey>>, PublishError> {
        let req = self
            .request(Method::GET, &self.gpg_keys_url())
            .query(&[("filter[namespace]", self.organization.as_str())]);
        let keys: Option<Vec<GpgKeyResource>> = self.fetch_all("list gpg keys", req).await?;
        Ok(keys.map(|keys| keys.into_iter().map(SigningKey::from).collect()))
    }

    async fn create_signing_key(&self, ascii_armor: &str) -> Result<SigningKey, PublishError> {
        let body = NewResource::document(
            resource_type::GPG_KEY,
            NewGpgKey {
                namespace: &self.organization,
                ascii_armor,
            },
        );
        let created: GpgKeyResource = self
            .create("create gpg key", &self.gpg_keys_url(), &body)
            .await?;
        Ok(created.into())
    }

    async fn get_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<ProviderVersionRecord>, PublishError> {
        let req = self.request(Method::GET, &self.version_url(provider, version));
        let doc: Option<Document<ProviderVersionResource>> =
            self.fetch("get provider version", req).await?;
        Ok(doc.map(|d| d.data.into()))
    }

    async fn create_provider_version(
        &self,
        provider: &ProviderIdentity,
        version: &str,
        protocols: &[String],
        key_id: &str,
    ) -> Result<ProviderVersionRecord, PublishError> {
        let body = NewResource::document(
            resource_type::PROVIDER_VERSION,
            NewProviderVersion {
                version,
                key_id,
                protocols,
            },
        );
        let created: ProviderVersionResource = self
            .create("create provider version", &self.versions_url(provider), &body)
            .await?;
        Ok(created.into())
    }

    async fn list_platforms(
        &self,
        provider: &ProviderIdentity,
        version: &str,
    ) -> Result<Option<Vec<ProviderPlatformRecord>>, PublishError> {
        let req = self.request(Method::GET, &self.platforms_url(provider, version));
        let platforms: Option<Vec<PlatformResource>> =
            self.fetch_all("list platforms", req).await?;
        Ok(platforms.map(|p| p.into_iter().map(ProviderPlatformRecord::from).collect()))
    }

    async fn create_platform(
        &self,
        provider: &ProviderIdentity,
        version: &str,
        artifact: &LocalArtifactEntry,
    ) -> Result<ProviderPlatformRecord, PublishError> {
        let body = NewResource::document(
            resource_type::PLATFORM,
            NewPlatform {
                os: &artifact.os,
                arch: &artifact.arch,
                shasum: &artifact.shasum,
                filename: &artifact.filename,
            },
        );
        let created: PlatformResource = self
            .create(
                "create platform",
                &self.platforms_url(provider, version),
                &body,
            )
            .await?;
        Ok(created.into())
    }
}
