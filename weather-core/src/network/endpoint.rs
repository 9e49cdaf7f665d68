//! Declarative endpoint descriptions and the request builder.
//!
//! An [`Endpoint`] is built once at its call site and never changes
//! afterwards. Given a [`NetworkConfig`] it resolves to exactly one
//! [`HttpRequest`], or to a [`RequestGenerationError`] before any I/O.

use std::{collections::BTreeMap, fmt, sync::Arc};

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use url::{Url, form_urlencoded};

use super::{
    config::NetworkConfig,
    error::RequestGenerationError,
    performer::HttpRequest,
    transfer::{EmptyResponseDecoder, JsonResponseDecoder, RawDataResponseDecoder, ResponseDecoder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy turning body parameters into request bytes.
pub trait BodyEncoder: Send + Sync + fmt::Debug {
    /// Returns `None` when the parameters cannot be encoded.
    fn encode(&self, parameters: &Map<String, Value>) -> Option<Vec<u8>>;

    /// Content type announced for the encoded body, if any.
    fn content_type(&self) -> Option<&'static str> {
        None
    }
}

/// Encodes the parameters as one JSON object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, parameters: &Map<String, Value>) -> Option<Vec<u8>> {
        serde_json::to_vec(parameters).ok()
    }

    fn content_type(&self) -> Option<&'static str> {
        Some("application/json")
    }
}

/// Encodes the parameters as percent-encoded `key=value&key=value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiBodyEncoder;

impl BodyEncoder for AsciiBodyEncoder {
    fn encode(&self, parameters: &Map<String, Value>) -> Option<Vec<u8>> {
        let mut form = form_urlencoded::Serializer::new(String::new());
        for (key, value) in parameters {
            form.append_pair(key, &parameter_value(value));
        }
        Some(form.finish().into_bytes())
    }

    fn content_type(&self) -> Option<&'static str> {
        Some("application/x-www-form-urlencoded")
    }
}

type EncodeFn = Arc<dyn Fn() -> Result<Value, serde_json::Error> + Send + Sync>;

/// Query or body parameters in either of their two forms.
///
/// The encodable form wins whenever it is present.
#[derive(Clone, Default)]
struct Parameters {
    encodable: Option<EncodeFn>,
    raw: Map<String, Value>,
}

impl Parameters {
    fn set_encodable<T>(&mut self, value: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.encodable = Some(Arc::new(move || serde_json::to_value(&value)));
    }

    fn resolve(&self) -> Result<Map<String, Value>, RequestGenerationError> {
        let Some(encode) = &self.encodable else {
            return Ok(self.raw.clone());
        };

        match encode()? {
            Value::Object(map) => Ok(map),
            _ => Err(RequestGenerationError::NotAnObject),
        }
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameters")
            .field("encodable", &self.encodable.is_some())
            .field("raw", &self.raw)
            .finish()
    }
}

/// Anything that can be resolved into a transport-ready request.
///
/// This is the object-safe face of [`Endpoint`], so the executor does not
/// need to know the response type.
pub trait Requestable: Send + Sync {
    fn url_request(&self, config: &NetworkConfig) -> Result<HttpRequest, RequestGenerationError>;
}

/// One HTTP call, with `R` being what a successful response decodes into.
pub struct Endpoint<R> {
    path: String,
    is_full_path: bool,
    method: HttpMethod,
    header_parameters: BTreeMap<String, String>,
    query: Parameters,
    body: Parameters,
    body_encoder: Arc<dyn BodyEncoder>,
    response_decoder: Arc<dyn ResponseDecoder<R>>,
}

impl<R> Endpoint<R> {
    pub fn new(
        path: impl Into<String>,
        method: HttpMethod,
        response_decoder: impl ResponseDecoder<R> + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            is_full_path: false,
            method,
            header_parameters: BTreeMap::new(),
            query: Parameters::default(),
            body: Parameters::default(),
            body_encoder: Arc::new(JsonBodyEncoder),
            response_decoder: Arc::new(response_decoder),
        }
    }

    /// Treat `path` as a complete URL and ignore the config's base URL.
    pub fn with_full_path(mut self, is_full_path: bool) -> Self {
        self.is_full_path = is_full_path;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_parameters.insert(name.into(), value.into());
        self
    }

    /// Query parameters taken from the fields of a serializable value.
    pub fn with_query<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.query.set_encodable(value);
        self
    }

    pub fn with_query_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.query.raw.insert(name.into(), value.into());
        self
    }

    /// Body parameters taken from the fields of a serializable value.
    pub fn with_body<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.body.set_encodable(value);
        self
    }

    pub fn with_body_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.body.raw.insert(name.into(), value.into());
        self
    }

    pub fn with_body_encoder(mut self, encoder: impl BodyEncoder + 'static) -> Self {
        self.body_encoder = Arc::new(encoder);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_full_path(&self) -> bool {
        self.is_full_path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn header_parameters(&self) -> &BTreeMap<String, String> {
        &self.header_parameters
    }

    pub fn response_decoder(&self) -> &dyn ResponseDecoder<R> {
        self.response_decoder.as_ref()
    }

    /// Full URL for this endpoint: base URL, path, endpoint query, then config query.
    pub fn url(&self, config: &NetworkConfig) -> Result<Url, RequestGenerationError> {
        let endpoint = if self.is_full_path {
            self.path.clone()
        } else {
            join_url(&config.base_url, &self.path)
        };

        let mut url =
            Url::parse(&endpoint).map_err(|source| RequestGenerationError::InvalidUrl {
                url: endpoint,
                source,
            })?;

        // config parameters are appended, never merged: a shared key shows up twice
        let mut pairs: Vec<(String, String)> = self
            .query
            .resolve()?
            .iter()
            .map(|(key, value)| (key.clone(), parameter_value(value)))
            .collect();
        pairs.extend(
            config
                .query_parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs.iter());
        }

        Ok(url)
    }
}

impl<R> Endpoint<R>
where
    R: DeserializeOwned + 'static,
{
    /// Endpoint whose response body is JSON decoded into `R`.
    pub fn json(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::new(path, method, JsonResponseDecoder)
    }
}

impl Endpoint<Vec<u8>> {
    /// Endpoint whose response body is returned as-is.
    pub fn raw(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::new(path, method, RawDataResponseDecoder)
    }
}

impl Endpoint<()> {
    /// Endpoint that expects no response body.
    pub fn empty(path: impl Into<String>, method: HttpMethod) -> Self {
        Self::new(path, method, EmptyResponseDecoder)
    }
}

impl<R> Requestable for Endpoint<R> {
    fn url_request(&self, config: &NetworkConfig) -> Result<HttpRequest, RequestGenerationError> {
        let url = self.url(config)?;

        // header names are case-insensitive: an endpoint header replaces any
        // config header spelled differently
        let mut headers = config.headers.clone();
        for (name, value) in &self.header_parameters {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }

        let body_parameters = self.body.resolve()?;
        let body = if body_parameters.is_empty() {
            None
        } else {
            let encoded = self
                .body_encoder
                .encode(&body_parameters)
                .ok_or(RequestGenerationError::BodyEncoding)?;

            if let Some(content_type) = self.body_encoder.content_type() {
                let has_content_type = headers
                    .keys()
                    .any(|name| name.eq_ignore_ascii_case("content-type"));
                if !has_content_type {
                    headers.insert("Content-Type".to_string(), content_type.to_string());
                }
            }

            Some(Bytes::from(encoded))
        };

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body,
        })
    }
}

impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            is_full_path: self.is_full_path,
            method: self.method,
            header_parameters: self.header_parameters.clone(),
            query: self.query.clone(),
            body: self.body.clone(),
            body_encoder: Arc::clone(&self.body_encoder),
            response_decoder: Arc::clone(&self.response_decoder),
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("is_full_path", &self.is_full_path)
            .field("method", &self.method)
            .field("header_parameters", &self.header_parameters)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("body_encoder", &self.body_encoder)
            .finish_non_exhaustive()
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn parameter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
