//! Programmable in-memory performer for tests.
//!
//! Every outgoing request is recorded. Responses come either from a handler
//! that sees each request, or from a queue of canned results consumed in
//! order.

use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;

use super::performer::{HttpRequest, NetworkPerformer, PerformError, PerformedResponse};

type Handler = Arc<dyn Fn(&HttpRequest) -> Result<PerformedResponse, PerformError> + Send + Sync>;

#[derive(Default)]
pub struct MockNetworkPerformer {
    handler: Option<Handler>,
    results: Mutex<VecDeque<Result<PerformedResponse, PerformError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockNetworkPerformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers requests with `results`, one per call.
    pub fn with_results(
        results: impl IntoIterator<Item = Result<PerformedResponse, PerformError>>,
    ) -> Self {
        Self {
            results: Mutex::new(results.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Answers every request by calling `handler` with it.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<PerformedResponse, PerformError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::default()
        }
    }

    pub fn push_result(&self, result: Result<PerformedResponse, PerformError>) {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for MockNetworkPerformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockNetworkPerformer")
            .field("has_handler", &self.handler.is_some())
            .field("request_count", &self.request_count())
            .finish()
    }
}

#[async_trait]
impl NetworkPerformer for MockNetworkPerformer {
    async fn perform(&self, request: HttpRequest) -> Result<PerformedResponse, PerformError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(handler) = &self.handler {
            return handler(&request);
        }

        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                let message =
                    format!("no mock response queued for {} {}", request.method, request.url);
                Err(PerformError::Transport(message.into()))
            })
    }
}
