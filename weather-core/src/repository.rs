use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    Config, api,
    model::CityWeather,
    network::{
        DataTransferError, DataTransferService, DefaultNetworkService, NetworkError,
        NetworkPerformer, ReqwestPerformer,
    },
};

/// Failures of the weather use cases, with the transport detail folded into
/// what the user can act on.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("city name must not be empty")]
    EmptyCityName,

    #[error("city '{0}' not found")]
    CityNotFound(String),

    #[error("weather icon '{0}' not found")]
    IconNotFound(String),

    #[error("no internet connection")]
    NotConnected,

    #[error(transparent)]
    Transfer(#[from] DataTransferError),
}

#[async_trait]
pub trait WeatherRepository: Send + Sync + Debug {
    async fn city_weather(&self, city: &str) -> Result<CityWeather, WeatherError>;

    /// PNG bytes for an icon code such as `10d`.
    async fn weather_icon(&self, icon: &str) -> Result<Vec<u8>, WeatherError>;
}

/// Repository backed by the OpenWeather data API and its image host.
#[derive(Debug, Clone)]
pub struct OpenWeatherRepository {
    weather: DataTransferService,
    images: DataTransferService,
    units: String,
}

impl OpenWeatherRepository {
    pub fn new(
        weather: DataTransferService,
        images: DataTransferService,
        units: impl Into<String>,
    ) -> Self {
        Self {
            weather,
            images,
            units: units.into(),
        }
    }
}

#[async_trait]
impl WeatherRepository for OpenWeatherRepository {
    async fn city_weather(&self, city: &str) -> Result<CityWeather, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::EmptyCityName);
        }

        let endpoint = api::city_weather(city, &self.units);
        let dto = self.weather.request(&endpoint).await.map_err(|err| {
            map_transfer_error(err, || WeatherError::CityNotFound(city.to_string()))
        })?;

        Ok(dto.into_domain())
    }

    async fn weather_icon(&self, icon: &str) -> Result<Vec<u8>, WeatherError> {
        let endpoint = api::weather_icon(icon);
        self.images.request(&endpoint).await.map_err(|err| {
            map_transfer_error(err, || WeatherError::IconNotFound(icon.to_string()))
        })
    }
}

fn map_transfer_error(
    err: DataTransferError,
    not_found: impl FnOnce() -> WeatherError,
) -> WeatherError {
    match err.network_error() {
        Some(network) if network.is_not_found() => not_found(),
        Some(NetworkError::NotConnected) => WeatherError::NotConnected,
        _ => WeatherError::Transfer(err),
    }
}

/// Build the OpenWeather repository over `performer`, using the backends in `config`.
pub fn repository_with_performer(
    config: &Config,
    performer: Arc<dyn NetworkPerformer>,
) -> anyhow::Result<Box<dyn WeatherRepository>> {
    let weather =
        DefaultNetworkService::new(config.weather_network_config()?, performer.clone());
    let images = DefaultNetworkService::new(config.icon_network_config(), performer);

    Ok(Box::new(OpenWeatherRepository::new(
        DataTransferService::new(Arc::new(weather)),
        DataTransferService::new(Arc::new(images)),
        config.units.clone(),
    )))
}

/// Build the OpenWeather repository over a real HTTP client.
pub fn repository_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherRepository>> {
    repository_with_performer(config, Arc::new(ReqwestPerformer::new()))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::network::{
        mock::MockNetworkPerformer,
        performer::{PerformError, PerformedResponse},
    };

    const PARIS: &str = r#"{"name":"Paris","dt":1700000000,
        "main":{"temp":8.0,"feels_like":6.5,"humidity":70},
        "weather":[{"description":"clear sky","icon":"01d"}],
        "wind":{"speed":2.1},"sys":{"country":"FR"}}"#;

    fn configured() -> Config {
        Config {
            api_key: Some("KEY".to_string()),
            ..Config::default()
        }
    }

    fn responding(body: &'static [u8]) -> Arc<MockNetworkPerformer> {
        Arc::new(MockNetworkPerformer::with_results([Ok(
            PerformedResponse::new(200, Some(Bytes::from_static(body))),
        )]))
    }

    fn failing(status_code: u16) -> Arc<MockNetworkPerformer> {
        Arc::new(MockNetworkPerformer::with_results([Err(
            PerformError::Status {
                status_code,
                data: None,
            },
        )]))
    }

    fn repository(performer: &Arc<MockNetworkPerformer>) -> Box<dyn WeatherRepository> {
        repository_with_performer(&configured(), performer.clone()).unwrap()
    }

    #[tokio::test]
    async fn fetches_city_weather_with_api_key() {
        let performer = responding(PARIS.as_bytes());

        let weather = repository(&performer)
            .city_weather("  Paris ")
            .await
            .unwrap();
        assert_eq!(weather.display_name(), "Paris, FR");
        assert_eq!(weather.icon.as_deref(), Some("01d"));

        let sent = performer.requests();
        assert_eq!(
            sent[0].url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?q=Paris&units=metric&appid=KEY"
        );
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let body = Bytes::from_static(br#"{"cod":"404","message":"city not found"}"#);
        let performer = Arc::new(MockNetworkPerformer::with_results([Err(
            PerformError::Status {
                status_code: 404,
                data: Some(body),
            },
        )]));

        let err = repository(&performer)
            .city_weather("Atlantis")
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound(ref city) if city == "Atlantis"));
        assert_eq!(err.to_string(), "city 'Atlantis' not found");
    }

    #[tokio::test]
    async fn offline_is_reported_as_such() {
        let performer = Arc::new(MockNetworkPerformer::with_results([Err(
            PerformError::NotConnected,
        )]));

        let err = repository(&performer)
            .city_weather("Paris")
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::NotConnected));
    }

    #[tokio::test]
    async fn server_errors_stay_transfer_errors() {
        let performer = failing(401);

        let err = repository(&performer)
            .city_weather("Paris")
            .await
            .unwrap_err();
        let inner = match err {
            WeatherError::Transfer(inner) => inner,
            other => panic!("expected transfer error, got {other:?}"),
        };
        assert_eq!(
            inner.network_error().and_then(NetworkError::status_code),
            Some(401)
        );
    }

    #[tokio::test]
    async fn blank_city_is_rejected_before_any_request() {
        let performer = Arc::new(MockNetworkPerformer::new());

        let err = repository(&performer).city_weather("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyCityName));
        assert_eq!(performer.request_count(), 0);
    }

    #[tokio::test]
    async fn icon_is_fetched_from_image_host_without_key() {
        let png = b"\x89PNG\r\n\x1a\n";
        let performer = responding(png);

        let icon = repository(&performer).weather_icon("01d").await.unwrap();
        assert_eq!(icon, png.to_vec());
        assert_eq!(
            performer.requests()[0].url.as_str(),
            "https://openweathermap.org/img/wn/01d@2x.png"
        );
    }

    #[tokio::test]
    async fn missing_icon_is_not_found() {
        let performer = failing(404);

        let err = repository(&performer)
            .weather_icon("zz")
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::IconNotFound(ref icon) if icon == "zz"));
    }

    #[test]
    fn repository_requires_api_key() {
        let err = repository_from_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("No API key configured"));
    }
}
