use std::{fs, path::PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use weather_core::{CityWeather, Config, repository_from_config};

const UNITS: &[&str] = &["metric", "imperial", "standard"];

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and preferred units.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name, e.g. "London" or "London,GB".
        city: String,
    },

    /// Download the icon for a condition code, e.g. "10d".
    Icon {
        code: String,

        /// Where to write the PNG; defaults to `<code>.png`.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => {
                let config = Config::load()?;
                let repository = repository_from_config(&config)?;

                let weather = repository.city_weather(&city).await?;
                print_weather(&weather, &config.units);
                Ok(())
            }
            Command::Icon { code, output } => {
                let config = Config::load()?;
                let repository = repository_from_config(&config)?;

                let png = repository.weather_icon(&code).await?;
                let path = output.unwrap_or_else(|| PathBuf::from(format!("{code}.png")));
                fs::write(&path, &png)
                    .with_context(|| format!("Failed to write icon to {}", path.display()))?;

                println!("Saved {} bytes to {}", png.len(), path.display());
                Ok(())
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let start = UNITS.iter().position(|u| *u == config.units).unwrap_or(0);
    let units = Select::new("Units:", UNITS.to_vec())
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;
    config.units = units.to_string();

    config.save()?;
    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn print_weather(weather: &CityWeather, units: &str) {
    let (temp_unit, speed_unit) = match units {
        "imperial" => ("°F", "mph"),
        "standard" => ("K", "m/s"),
        _ => ("°C", "m/s"),
    };

    println!("{}", weather.display_name());
    println!("  {}", weather.description);
    println!(
        "  Temperature: {:.1}{temp_unit} (feels like {:.1}{temp_unit})",
        weather.temperature, weather.feels_like
    );
    println!("  Humidity:    {}%", weather.humidity_pct);
    println!("  Wind:        {:.1} {speed_unit}", weather.wind_speed);
    if let Some(icon) = &weather.icon {
        println!("  Icon:        {icon}");
    }
    println!(
        "  Observed:    {}",
        weather
            .observation_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
}
