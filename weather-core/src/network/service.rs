//! Transport executor: request building, execution and failure classification.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;

use super::{
    config::NetworkConfig,
    endpoint::Requestable,
    error::NetworkError,
    logger::{NetworkErrorLogger, TracingNetworkErrorLogger},
    performer::{NetworkPerformer, PerformError},
};

#[async_trait]
pub trait NetworkService: Send + Sync + Debug {
    /// Executes the endpoint and returns the raw body, `None` when the server
    /// sent none.
    async fn request(&self, endpoint: &dyn Requestable) -> Result<Option<Bytes>, NetworkError>;
}

#[derive(Debug, Clone)]
pub struct DefaultNetworkService {
    config: Arc<NetworkConfig>,
    performer: Arc<dyn NetworkPerformer>,
    logger: Arc<dyn NetworkErrorLogger>,
}

impl DefaultNetworkService {
    pub fn new(
        config: impl Into<Arc<NetworkConfig>>,
        performer: Arc<dyn NetworkPerformer>,
    ) -> Self {
        Self {
            config: config.into(),
            performer,
            logger: Arc::new(TracingNetworkErrorLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn NetworkErrorLogger>) -> Self {
        self.logger = logger;
        self
    }
}

#[async_trait]
impl NetworkService for DefaultNetworkService {
    async fn request(&self, endpoint: &dyn Requestable) -> Result<Option<Bytes>, NetworkError> {
        // nothing is logged and nothing is sent for an endpoint that cannot be built
        let request = endpoint
            .url_request(&self.config)
            .map_err(|_| NetworkError::UrlGeneration)?;

        self.logger.log_request(&request);

        match self.performer.perform(request).await {
            Ok(response) => {
                self.logger.log_response(&response);
                Ok(response.data.filter(|data| !data.is_empty()))
            }
            Err(err) => {
                let error = classify(err);
                self.logger.log_error(&error);
                Err(error)
            }
        }
    }
}

/// Maps every performer failure onto exactly one [`NetworkError`] variant.
fn classify(err: PerformError) -> NetworkError {
    match err {
        PerformError::Status { status_code, data } if status_code >= 400 => {
            NetworkError::HttpError { status_code, data }
        }
        PerformError::NotConnected => NetworkError::NotConnected,
        PerformError::Cancelled => NetworkError::Cancelled,
        other => NetworkError::generic(other),
    }
}
