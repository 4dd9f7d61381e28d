//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client and its error taxonomy
//! - Forecast aggregation into hourly and daily views
//! - Location sources, persisted preferences and theme state
//! - `WeatherState`, which drives fetches and keeps the last snapshot
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod format;
pub mod location;
pub mod model;
pub mod provider;
pub mod store;
pub mod theme;

pub use config::{Config, LocationConfig};
pub use controller::{FetchOutcome, Snapshot, Status, WeatherState};
pub use error::{FetchError, LocationError, WeatherError};
pub use forecast::aggregate;
pub use location::LocationProvider;
pub use model::{
    Appearance, City, Coordinates, CurrentWeather, DailySummary, FavoriteLocation, Forecast,
    ForecastReport, Location, Reading, TemperatureUnit, ThemeMode,
};
pub use provider::{LocationQuery, WeatherProvider};
pub use store::PreferenceStore;
pub use theme::ThemeState;
