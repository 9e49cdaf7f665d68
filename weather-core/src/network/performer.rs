//! Low-level HTTP execution.
//!
//! The executor only sees [`NetworkPerformer`]; which HTTP client sits
//! behind it is up to the caller. [`ReqwestPerformer`] is the production one.

use std::{collections::BTreeMap, fmt::Debug};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::{endpoint::HttpMethod, error::BoxError};

/// A fully-resolved request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

/// Response metadata plus the body, if the server sent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub data: Option<Bytes>,
}

impl PerformedResponse {
    pub fn new(status: u16, data: Option<Bytes>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            data,
        }
    }
}

/// Raw failure reported by a performer.
#[derive(Debug, Error)]
pub enum PerformError {
    #[error("server responded with status {status_code}")]
    Status {
        status_code: u16,
        data: Option<Bytes>,
    },

    #[error("not connected to the internet")]
    NotConnected,

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Transport(BoxError),
}

#[async_trait]
pub trait NetworkPerformer: Send + Sync + Debug {
    /// Executes one request. Statuses >= 400 must come back as
    /// [`PerformError::Status`] carrying the response body.
    async fn perform(&self, request: HttpRequest) -> Result<PerformedResponse, PerformError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestPerformer {
    http: Client,
}

impl ReqwestPerformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NetworkPerformer for ReqwestPerformer {
    async fn perform(&self, request: HttpRequest) -> Result<PerformedResponse, PerformError> {
        let mut builder = self.http.request(reqwest_method(request.method), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let res = builder.send().await?;

        let status = res.status().as_u16();
        if status >= 400 {
            // the status classifies the failure; an unreadable error body is dropped
            let data = res.bytes().await.ok().filter(|body| !body.is_empty());
            return Err(PerformError::Status {
                status_code: status,
                data,
            });
        }

        let headers = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = res.bytes().await?;
        let data = (!body.is_empty()).then_some(body);

        Ok(PerformedResponse {
            status,
            headers,
            data,
        })
    }
}

impl From<reqwest::Error> for PerformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            PerformError::NotConnected
        } else if let Some(status) = err.status().filter(|s| s.as_u16() >= 400) {
            PerformError::Status {
                status_code: status.as_u16(),
                data: None,
            }
        } else {
            PerformError::Transport(Box::new(err))
        }
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}
