//! HTTP implementation of the gateway contracts
//!
//! Talks to the REST layout served by the release backend:
//!
//! | call | request |
//! |---|---|
//! | retrieve | `GET /codebases/{id}/releases/{version}/` |
//! | list files | `GET /codebases/{id}/releases/{version}/files/originals/{category}/` |
//! | clear category | `DELETE /codebases/{id}/releases/{version}/files/originals/{category}/` |
//! | delete file | `DELETE {path}` |
//! | list media | `GET /codebases/{id}/media/` |
//! | upload picture | `POST /users/{key}/picture/` (multipart) |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::GatewayError;
use crate::resources::*;

/// Connection settings for [`HttpGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Server root, e.g. `https://www.comses.net`
    pub base_url: String,
    /// API token sent as `Authorization: Token <token>`
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GatewayConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a config for a specific server.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Read `RELEASE_EDITOR_BASE_URL`, `RELEASE_EDITOR_TOKEN` and
    /// `RELEASE_EDITOR_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var("RELEASE_EDITOR_BASE_URL").map_err(|_| {
            GatewayError::Config("RELEASE_EDITOR_BASE_URL is not set".to_string())
        })?;
        let mut config = Self::new(base_url);
        config.token = std::env::var("RELEASE_EDITOR_TOKEN").ok();
        if let Ok(raw) = std::env::var("RELEASE_EDITOR_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                GatewayError::Config(format!(
                    "RELEASE_EDITOR_TIMEOUT_SECS is not a number: {}",
                    raw
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Set authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parsed_base(&self) -> GatewayResult<Url> {
        Url::parse(&self.base_url).map_err(|err| {
            GatewayError::Config(format!("invalid base_url {}: {}", self.base_url, err))
        })
    }

    /// `base_url` extended by `segments`, each percent-encoded, with a
    /// trailing slash.
    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.parsed_base()?;
        url.path_segments_mut()
            .map_err(|()| {
                GatewayError::Config(format!("base_url cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn release_url(&self, identifier: &str, version_number: &str) -> GatewayResult<Url> {
        self.endpoint(&["codebases", identifier, "releases", version_number])
    }

    fn originals_url(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<Url> {
        let category = category.to_string();
        self.endpoint(&[
            "codebases",
            identifier,
            "releases",
            version_number,
            "files",
            "originals",
            &category,
        ])
    }

    fn media_url(&self, identifier: &str) -> GatewayResult<Url> {
        self.endpoint(&["codebases", identifier, "media"])
    }

    fn picture_url(&self, user_key: &str) -> GatewayResult<Url> {
        self.endpoint(&["users", user_key, "picture"])
    }

    fn absolute(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }
}

/// Paginated envelope returned by list endpoints.
#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

/// `reqwest`-backed client implementing every gateway contract.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

impl HttpGateway {
    /// Create a new client
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.base_url.is_empty() {
            return Err(GatewayError::Config("base_url is empty".to_string()));
        }
        config.parsed_base()?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("release-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(HttpGateway {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http_client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.config.token {
            Some(token) => {
                builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            }
            None => builder,
        }
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        builder: RequestBuilder,
    ) -> GatewayResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "gateway response");
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(GatewayError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> GatewayResult<T> {
        let response = self
            .send(Method::GET, url, self.request(Method::GET, url))
            .await?;
        Ok(response.json::<T>().await?)
    }

    async fn delete_url(&self, url: &str) -> GatewayResult<()> {
        self.send(Method::DELETE, url, self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReleaseResource for HttpGateway {
    #[instrument(skip(self))]
    async fn retrieve(&self, identifier: &str, version_number: &str) -> GatewayResult<Value> {
        let url = self.config.release_url(identifier, version_number)?;
        self.get_json(url.as_str()).await
    }
}

#[async_trait]
impl FileListingResource for HttpGateway {
    #[instrument(skip(self))]
    async fn list(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<Vec<FileDescriptor>> {
        let url = self.config.originals_url(identifier, version_number, category)?;
        self.get_json(url.as_str()).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> GatewayResult<()> {
        self.delete_url(&self.config.absolute(path)).await
    }

    #[instrument(skip(self))]
    async fn clear_category(
        &self,
        identifier: &str,
        version_number: &str,
        category: FileCategory,
    ) -> GatewayResult<()> {
        let url = self.config.originals_url(identifier, version_number, category)?;
        self.delete_url(url.as_str()).await
    }
}

#[async_trait]
impl MediaResource for HttpGateway {
    #[instrument(skip(self))]
    async fn list(&self, identifier: &str) -> GatewayResult<Vec<MediaDescriptor>> {
        let url = self.config.media_url(identifier)?;
        let page: Page<MediaDescriptor> = self.get_json(url.as_str()).await?;
        Ok(page.results)
    }
}

#[async_trait]
impl ProfileImageUpload for HttpGateway {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn upload(&self, user_key: &str, image: Vec<u8>) -> GatewayResult<String> {
        let url = self.config.picture_url(user_key)?.to_string();
        let part = reqwest::multipart::Part::bytes(image).file_name("picture");
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .send(
                Method::POST,
                &url,
                self.request(Method::POST, &url).multipart(form),
            )
            .await?;
        let body = response.text().await?;
        // The endpoint answers with either a JSON string or the bare reference.
        Ok(serde_json::from_str::<String>(&body).unwrap_or(body))
    }
}
