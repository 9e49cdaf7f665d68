//! Decoding and error resolution on top of the transport executor.

use std::{fmt::Debug, sync::Arc};

use bytes::Bytes;
use serde::de::DeserializeOwned;

use super::{
    endpoint::Endpoint,
    error::{BoxError, DataTransferError, NetworkError},
    logger::{DataTransferErrorLogger, TracingDataTransferErrorLogger},
    service::NetworkService,
};

/// Turns response bytes into the endpoint's response type.
pub trait ResponseDecoder<T>: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<T, BoxError>;

    /// Value to produce when the server sent no body at all. `None` means a
    /// body is required.
    fn decode_empty(&self) -> Option<T> {
        None
    }
}

/// Structured JSON decoding via serde.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseDecoder;

impl<T> ResponseDecoder<T> for JsonResponseDecoder
where
    T: DeserializeOwned,
{
    fn decode(&self, data: &[u8]) -> Result<T, BoxError> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Passes the body through untouched, for binary payloads such as images.
///
/// Only byte containers can be produced; any other target type does not
/// implement the decoder trait and is rejected at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDataResponseDecoder;

impl ResponseDecoder<Vec<u8>> for RawDataResponseDecoder {
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(data.to_vec())
    }
}

impl ResponseDecoder<Bytes> for RawDataResponseDecoder {
    fn decode(&self, data: &[u8]) -> Result<Bytes, BoxError> {
        Ok(Bytes::copy_from_slice(data))
    }
}

/// For endpoints that expect no value back. Any body is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResponseDecoder;

impl ResponseDecoder<()> for EmptyResponseDecoder {
    fn decode(&self, _data: &[u8]) -> Result<(), BoxError> {
        Ok(())
    }

    fn decode_empty(&self) -> Option<()> {
        Some(())
    }
}

/// Optional hook mapping a transport error to a more specific one.
///
/// Returning the [`NetworkError`] itself (boxed) means "leave it alone".
pub trait DataTransferErrorResolver: Send + Sync + Debug {
    fn resolve(&self, error: NetworkError) -> BoxError;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDataTransferErrorResolver;

impl DataTransferErrorResolver for DefaultDataTransferErrorResolver {
    fn resolve(&self, error: NetworkError) -> BoxError {
        Box::new(error)
    }
}

/// Requests an endpoint and hands back its decoded response type.
#[derive(Debug, Clone)]
pub struct DataTransferService {
    network_service: Arc<dyn NetworkService>,
    error_resolver: Arc<dyn DataTransferErrorResolver>,
    error_logger: Arc<dyn DataTransferErrorLogger>,
}

impl DataTransferService {
    pub fn new(network_service: Arc<dyn NetworkService>) -> Self {
        Self {
            network_service,
            error_resolver: Arc::new(DefaultDataTransferErrorResolver),
            error_logger: Arc::new(TracingDataTransferErrorLogger),
        }
    }

    pub fn with_error_resolver(mut self, resolver: Arc<dyn DataTransferErrorResolver>) -> Self {
        self.error_resolver = resolver;
        self
    }

    pub fn with_error_logger(mut self, logger: Arc<dyn DataTransferErrorLogger>) -> Self {
        self.error_logger = logger;
        self
    }

    pub async fn request<R>(&self, endpoint: &Endpoint<R>) -> Result<R, DataTransferError> {
        match self.network_service.request(endpoint).await {
            Ok(data) => {
                let result = self.decode(data.as_deref(), endpoint);
                if let Err(err) = &result {
                    self.error_logger.log(err);
                }
                result
            }
            Err(err) => {
                self.error_logger.log(&err);
                Err(self.resolve(err))
            }
        }
    }

    fn decode<R>(
        &self,
        data: Option<&[u8]>,
        endpoint: &Endpoint<R>,
    ) -> Result<R, DataTransferError> {
        let decoder = endpoint.response_decoder();
        match data.filter(|d| !d.is_empty()) {
            Some(data) => decoder.decode(data).map_err(DataTransferError::Parsing),
            None => decoder.decode_empty().ok_or(DataTransferError::NoResponse),
        }
    }

    fn resolve(&self, error: NetworkError) -> DataTransferError {
        let resolved = self.error_resolver.resolve(error);
        match resolved.downcast::<NetworkError>() {
            Ok(network_error) => DataTransferError::NetworkFailure(*network_error),
            Err(other) => DataTransferError::ResolvedNetworkFailure(other),
        }
    }
}
