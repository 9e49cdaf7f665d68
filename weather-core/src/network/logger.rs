//! Observability hooks for both pipeline layers.
//!
//! Loggers are called from concurrent requests and must never fail.

use std::{error::Error as StdError, fmt::Debug};

use bytes::Bytes;

use super::{
    error::NetworkError,
    performer::{HttpRequest, PerformedResponse},
};

const BODY_PREVIEW_LIMIT: usize = 200;

pub trait NetworkErrorLogger: Send + Sync + Debug {
    fn log_request(&self, request: &HttpRequest);
    fn log_response(&self, response: &PerformedResponse);
    fn log_error(&self, error: &NetworkError);
}

pub trait DataTransferErrorLogger: Send + Sync + Debug {
    fn log(&self, error: &(dyn StdError + 'static));
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNetworkErrorLogger;

impl NetworkErrorLogger for TracingNetworkErrorLogger {
    fn log_request(&self, request: &HttpRequest) {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = ?request.headers,
            body = %body_preview(request.body.as_ref()),
            "Sending request"
        );
    }

    fn log_response(&self, response: &PerformedResponse) {
        tracing::debug!(
            status = response.status,
            headers = ?response.headers,
            bytes = response.data.as_ref().map_or(0, Bytes::len),
            body = %body_preview(response.data.as_ref()),
            "Received response"
        );
    }

    fn log_error(&self, error: &NetworkError) {
        match error {
            NetworkError::HttpError { status_code, data } => tracing::error!(
                status = status_code,
                body = %body_preview(data.as_ref()),
                "Request failed: {error}"
            ),
            _ => tracing::error!("Request failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDataTransferErrorLogger;

impl DataTransferErrorLogger for TracingDataTransferErrorLogger {
    fn log(&self, error: &(dyn StdError + 'static)) {
        tracing::error!("Data transfer failed: {error}");
    }
}

/// First bytes of a body as lossy UTF-8, for log lines.
pub(crate) fn body_preview(data: Option<&Bytes>) -> String {
    let Some(data) = data else {
        return String::new();
    };

    let text = String::from_utf8_lossy(data);
    if text.chars().count() > BODY_PREVIEW_LIMIT {
        let cut: String = text.chars().take(BODY_PREVIEW_LIMIT).collect();
        format!("{cut}...")
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_logged_whole() {
        let data = Bytes::from_static(br#"{"cod":404}"#);
        assert_eq!(body_preview(Some(&data)), r#"{"cod":404}"#);
        assert_eq!(body_preview(None), "");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let data = Bytes::from("é".repeat(300));
        let preview = body_preview(Some(&data));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), BODY_PREVIEW_LIMIT + 3);
    }
}
