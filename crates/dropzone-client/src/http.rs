//! HTTP drop service.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dropzone_core::{
    DownloadPayload, DropId, DropRecord, DropService, HealthStatus, ServiceError, ServiceResult,
    ToggleAck,
};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::disposition::attachment_filename;
use crate::problem::classify_problem;

/// Header carrying the per-client correlation id.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Connection settings for [`HttpDropService`].
#[derive(Clone)]
pub struct ClientOptions {
    /// API origin; paths are resolved against it.
    pub base_url: Url,
    /// Bearer token attached to every call.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Value sent in `x-request-id`; a UUID is generated when absent.
    pub request_id: Option<String>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientOptions")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Failures while constructing the HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The request id cannot be sent as a header value.
    #[error("request id contains invalid characters")]
    InvalidRequestId {
        /// Offending value.
        value: String,
    },
    /// The base URL cannot carry paths.
    #[error("api url cannot be used as a base")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
    },
    /// `reqwest` rejected the configuration.
    #[error("failed to build HTTP client")]
    Client {
        /// Underlying builder failure.
        #[source]
        source: reqwest::Error,
    },
}

/// [`DropService`] speaking to the DropZone REST API.
#[derive(Clone)]
pub struct HttpDropService {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
    request_id: String,
}

impl fmt::Debug for HttpDropService {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpDropService")
            .field("base_url", &self.base_url.as_str())
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl HttpDropService {
    /// Build a client from options.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the base URL or request id is unusable
    /// or `reqwest` cannot build a client.
    pub fn new(options: ClientOptions) -> Result<Self, ClientBuildError> {
        if options.base_url.cannot_be_a_base() {
            return Err(ClientBuildError::InvalidBaseUrl {
                url: options.base_url.to_string(),
            });
        }
        let request_id = options
            .request_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut default_headers = HeaderMap::new();
        let header = HeaderValue::from_str(&request_id).map_err(|_| {
            ClientBuildError::InvalidRequestId {
                value: request_id.clone(),
            }
        })?;
        default_headers.insert(HEADER_REQUEST_ID, header);

        let client = Client::builder()
            .timeout(options.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|source| ClientBuildError::Client { source })?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(options.base_url),
            access_token: options
                .access_token
                .filter(|token| !token.trim().is_empty()),
            request_id,
        })
    }

    /// Correlation id sent with every request.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// API origin.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, operation: &'static str, path: &str) -> ServiceResult<Url> {
        self.base_url
            .join(path)
            .map_err(|source| ServiceError::Decode {
                operation,
                source: Box::new(source),
            })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
    ) -> ServiceResult<Response> {
        let url = self.endpoint(operation, path)?;
        tracing::debug!(operation, %method, url = %url, "sending request");
        let response = self
            .request(method, url)
            .send()
            .await
            .map_err(|source| ServiceError::Transient {
                operation,
                source: Box::new(source),
            })?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_problem(operation, response).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> ServiceResult<T> {
        let response = self.send(operation, Method::GET, path).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ServiceError::Transient {
                operation,
                source: Box::new(source),
            })?;
        serde_json::from_slice(&bytes).map_err(|source| ServiceError::Decode {
            operation,
            source: Box::new(source),
        })
    }
}

#[async_trait]
impl DropService for HttpDropService {
    async fn released_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.get_json("released_drops", "api/drops/released/").await
    }

    async fn upcoming_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.get_json("upcoming_drops", "api/drops/upcoming/").await
    }

    async fn bookmarked_drops(&self) -> ServiceResult<Vec<DropRecord>> {
        self.get_json("bookmarked_drops", "api/bookmarks/").await
    }

    async fn drop_by_id(&self, id: &DropId) -> ServiceResult<DropRecord> {
        self.get_json("drop_by_id", &format!("api/drops/{}/", segment(id)))
            .await
    }

    async fn toggle_bookmark(&self, id: &DropId) -> ServiceResult<ToggleAck> {
        let response = self
            .send(
                "toggle_bookmark",
                Method::POST,
                &format!("api/drops/{}/bookmark/", segment(id)),
            )
            .await?;
        let bookmarked = match response.status() {
            StatusCode::CREATED => Some(true),
            StatusCode::OK => Some(false),
            _ => None,
        };
        Ok(ToggleAck { bookmarked })
    }

    async fn download(&self, id: &DropId) -> ServiceResult<DownloadPayload> {
        let operation = "download";
        let response = self
            .send(
                operation,
                Method::GET,
                &format!("api/drops/{}/download/", segment(id)),
            )
            .await?;
        let headers = response.headers();
        let content_type = header_text(headers, CONTENT_TYPE.as_str());
        let filename = header_text(headers, CONTENT_DISPOSITION.as_str())
            .as_deref()
            .and_then(attachment_filename);
        let body = response
            .bytes()
            .await
            .map_err(|source| ServiceError::Transient {
                operation,
                source: Box::new(source),
            })?
            .to_vec();
        Ok(DownloadPayload {
            body,
            content_type,
            filename,
        })
    }

    async fn health(&self) -> ServiceResult<HealthStatus> {
        self.get_json("health", "api/health/").await
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Ids are opaque; anything that is not a plain path segment is percent-encoded.
fn segment(id: &DropId) -> String {
    id.as_str()
        .bytes()
        .map(|byte| {
            if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
                char::from(byte).to_string()
            } else {
                format!("%{byte:02X}")
            }
        })
        .collect()
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
