use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions for one city, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityWeather {
    pub city_name: String,
    pub country: Option<String>,
    pub description: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    /// Icon code understood by the image host, e.g. `10d`.
    pub icon: Option<String>,
    pub observation_time: DateTime<Utc>,
}

impl CityWeather {
    pub fn display_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.city_name, country),
            None => self.city_name.clone(),
        }
    }
}
