//! Layered request pipeline shared by every backend the client talks to.
//!
//! - [`endpoint`]: declarative endpoint descriptions and request building
//! - [`service`]: transport executor, classifies failures into [`NetworkError`]
//! - [`transfer`]: decoding and error resolution on top of the executor
//! - [`performer`]: pluggable low-level HTTP execution

pub mod config;
pub mod endpoint;
pub mod error;
pub mod logger;
pub mod mock;
pub mod performer;
pub mod service;
pub mod transfer;

pub use config::NetworkConfig;
pub use endpoint::{
    AsciiBodyEncoder, BodyEncoder, Endpoint, HttpMethod, JsonBodyEncoder, Requestable,
};
pub use error::{BoxError, DataTransferError, NetworkError, RequestGenerationError};
pub use logger::{
    DataTransferErrorLogger, NetworkErrorLogger, TracingDataTransferErrorLogger,
    TracingNetworkErrorLogger,
};
pub use performer::{
    HttpRequest, NetworkPerformer, PerformError, PerformedResponse, ReqwestPerformer,
};
pub use service::{DefaultNetworkService, NetworkService};
pub use transfer::{
    DataTransferErrorResolver, DataTransferService, DefaultDataTransferErrorResolver,
    EmptyResponseDecoder, JsonResponseDecoder, RawDataResponseDecoder, ResponseDecoder,
};
