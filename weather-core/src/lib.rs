//! Core library for the `weather` client.
//!
//! This crate defines:
//! - The layered network pipeline (endpoints, transport executor, data transfer)
//! - Configuration & credentials handling
//! - OpenWeather endpoints and the weather use cases built on them
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod model;
pub mod network;
pub mod repository;

pub use config::Config;
pub use model::CityWeather;
pub use repository::{
    OpenWeatherRepository, WeatherError, WeatherRepository, repository_from_config,
};
