//! End-to-end pipeline test over real HTTP.
//!
//! Starts a stand-in weather server on a random port and drives the full
//! stack (endpoint -> reqwest performer -> executor -> data transfer) against
//! it.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use weather_core::{
    Config, WeatherError, WeatherRepository,
    network::{
        DataTransferError, DataTransferService, DefaultNetworkService, Endpoint, HttpMethod,
        HttpRequest, NetworkConfig, NetworkError, NetworkPerformer, ReqwestPerformer,
    },
    repository::repository_with_performer,
};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake";

fn app() -> Router {
    Router::new()
        .route("/data/2.5/weather", get(weather))
        .route("/img/wn/{file}", get(icon))
        .route("/cities/{id}", delete(|| async { StatusCode::NO_CONTENT }))
        .route("/echo", post(echo))
}

async fn weather(Query(query): Query<HashMap<String, String>>) -> impl IntoResponse {
    if query.get("appid").map(String::as_str) != Some("KEY") {
        let body = json!({"cod": 401, "message": "Invalid API key"});
        return (StatusCode::UNAUTHORIZED, Json(body));
    }

    match query.get("q").map(String::as_str) {
        Some("London") => (
            StatusCode::OK,
            Json(json!({
                "name": "London",
                "dt": 1700010000,
                "main": {"temp": 12.5, "feels_like": 11.1, "humidity": 81},
                "weather": [{"description": "light rain", "icon": "10d"}],
                "wind": {"speed": 4.6},
                "sys": {"country": "GB"}
            })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"cod": "404", "message": "city not found"})),
        ),
    }
}

async fn icon(Path(file): Path<String>) -> Result<impl IntoResponse, StatusCode> {
    if file == "10d@2x.png" {
        Ok(([(header::CONTENT_TYPE, "image/png")], PNG))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn echo(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "content_type": content_type,
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app()).await });
    format!("http://{addr}")
}

fn config_for(base_url: &str) -> Config {
    Config {
        api_key: Some("KEY".to_string()),
        weather_base_url: base_url.to_string(),
        icon_base_url: base_url.to_string(),
        ..Config::default()
    }
}

fn transfer(base_url: &str) -> DataTransferService {
    let network = DefaultNetworkService::new(
        NetworkConfig::new(base_url),
        Arc::new(ReqwestPerformer::new()),
    );
    DataTransferService::new(Arc::new(network))
}

fn repository_for(config: &Config) -> Box<dyn WeatherRepository> {
    repository_with_performer(config, Arc::new(ReqwestPerformer::new())).unwrap()
}

#[tokio::test]
async fn city_weather_over_http() {
    let base = start_server().await;
    let repository = repository_for(&config_for(&base));

    let weather = repository.city_weather("London").await.unwrap();
    assert_eq!(weather.display_name(), "London, GB");
    assert_eq!(weather.description, "light rain");

    let err = repository.city_weather("Atlantis").await.unwrap_err();
    assert!(matches!(err, WeatherError::CityNotFound(_)));
}

#[tokio::test]
async fn icon_over_http() {
    let base = start_server().await;
    let repository = repository_for(&config_for(&base));

    assert_eq!(repository.weather_icon("10d").await.unwrap(), PNG.to_vec());
    assert!(matches!(
        repository.weather_icon("99x").await.unwrap_err(),
        WeatherError::IconNotFound(_)
    ));
}

#[tokio::test]
async fn error_status_keeps_response_body() {
    let base = start_server().await;
    let config = Config {
        api_key: Some("WRONG".to_string()),
        ..config_for(&base)
    };
    let repository = repository_for(&config);

    let err = repository.city_weather("London").await.unwrap_err();
    let (status_code, data) = match err {
        WeatherError::Transfer(DataTransferError::NetworkFailure(NetworkError::HttpError {
            status_code,
            data,
        })) => (status_code, data),
        other => panic!("expected http error, got {other:?}"),
    };
    assert_eq!(status_code, 401);

    let body: Value = serde_json::from_slice(&data.expect("401 carries a body")).unwrap();
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn no_content_over_http() {
    let base = start_server().await;
    let transfer = transfer(&base);

    transfer
        .request(&Endpoint::empty("cities/1", HttpMethod::Delete))
        .await
        .unwrap();

    let err = transfer
        .request(&Endpoint::<Value>::json("cities/1", HttpMethod::Delete))
        .await
        .unwrap_err();
    assert!(matches!(err, DataTransferError::NoResponse));
}

#[tokio::test]
async fn json_body_is_sent_with_content_type() {
    #[derive(Debug, Deserialize)]
    struct Echo {
        content_type: String,
        body: String,
    }

    let base = start_server().await;
    let endpoint = Endpoint::<Echo>::json("echo", HttpMethod::Post)
        .with_body_parameter("city", "Oslo");

    let echo = transfer(&base).request(&endpoint).await.unwrap();
    assert_eq!(echo.content_type, "application/json");
    assert_eq!(echo.body, r#"{"city":"Oslo"}"#);
}

#[tokio::test]
async fn performer_reports_response_headers() {
    let base = start_server().await;
    let request = HttpRequest {
        method: HttpMethod::Get,
        url: format!("{base}/img/wn/10d@2x.png").parse().unwrap(),
        headers: BTreeMap::new(),
        body: None,
    };

    let response = ReqwestPerformer::new().perform(request).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(
        response.headers.get("content-type").map(String::as_str),
        Some("image/png")
    );
    assert_eq!(response.data.as_deref(), Some(PNG));
}
