//! OpenWeather endpoints and their wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::{
    model::CityWeather,
    network::{Endpoint, HttpMethod},
};

/// `GET data/2.5/weather?q=<city>&units=<units>` on the weather API.
pub fn city_weather(city: &str, units: &str) -> Endpoint<CurrentWeatherDto> {
    Endpoint::json("data/2.5/weather", HttpMethod::Get)
        .with_query(CityQuery {
            q: city.to_string(),
            units: units.to_string(),
        })
}

/// `GET img/wn/<icon>@2x.png` on the image host.
///
/// The code is percent-encoded, so it always stays inside one path segment.
pub fn weather_icon(icon: &str) -> Endpoint<Vec<u8>> {
    let path = format!("img/wn/{}@2x.png", path_segment(icon));
    Endpoint::raw(path, HttpMethod::Get)
}

fn path_segment(raw: &str) -> String {
    // form encoding turns spaces into '+', which a path would keep literally
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[derive(Debug, Clone, Serialize)]
struct CityQuery {
    q: String,
    units: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWeather {
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwWind {
    pub speed: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwSys {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeatherDto {
    pub name: String,
    pub dt: i64,
    pub main: OwMain,
    pub weather: Vec<OwWeather>,
    pub wind: OwWind,
    #[serde(default)]
    pub sys: OwSys,
}

impl CurrentWeatherDto {
    pub fn into_domain(self) -> CityWeather {
        let observation_time = unix_to_utc(self.dt).unwrap_or_else(Utc::now);

        let (description, icon) = self
            .weather
            .into_iter()
            .next()
            .map(|w| (w.description, w.icon))
            .unwrap_or_else(|| ("Unknown".to_string(), None));

        CityWeather {
            city_name: self.name,
            country: self.sys.country,
            description,
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind_speed: self.wind.speed,
            icon,
            observation_time,
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
