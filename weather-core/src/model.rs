use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unit system the provider renders numeric fields in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Metric,
    Imperial,
}

impl TemperatureUnit {
    /// Value of the provider's `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "metric",
            TemperatureUnit::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            TemperatureUnit::Metric => TemperatureUnit::Imperial,
            TemperatureUnit::Imperial => TemperatureUnit::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "°C",
            TemperatureUnit::Imperial => "°F",
        }
    }

    pub fn speed_symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Metric => "m/s",
            TemperatureUnit::Imperial => "mph",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(TemperatureUnit::Metric),
            "imperial" => Ok(TemperatureUnit::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

/// Stored theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
    System,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
            ThemeMode::System => "system",
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ThemeMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            _ => Err(anyhow::anyhow!(
                "Unknown theme mode '{value}'. Supported modes: light, dark, system."
            )),
        }
    }
}

/// Effective light/dark appearance once `ThemeMode::System` is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;

        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// The location whose weather is currently displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub country: String,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A saved location. `(name, country)` identifies an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteLocation {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl FavoriteLocation {
    pub fn same_place(&self, name: &str, country: &str) -> bool {
        self.name == name && self.country == country
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

impl From<&Location> for FavoriteLocation {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            country: location.country.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Current conditions as reported by the provider, already in the requested unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: u8,
    pub pressure: u32,
    pub wind_speed: f64,
    pub wind_deg: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Meters.
    pub visibility: Option<u32>,
    pub cloudiness: u8,
    pub observed_at: DateTime<Utc>,
}

/// One 3-hour forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Epoch seconds.
    pub timestamp: i64,
    pub temperature: f64,
    pub condition: String,
    pub icon_code: String,
    pub humidity: u8,
    pub wind_speed: f64,
}

impl Reading {
    /// Calendar day of the timestamp, in the provider's UTC convention.
    pub fn date(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .unwrap_or_default()
            .date_naive()
    }
}

/// Per-day statistics over one daily bucket of readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Timestamp of the first reading of the day.
    pub representative_timestamp: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_avg: f64,
    pub dominant_condition: String,
    pub dominant_icon_code: String,
    pub avg_humidity: u8,
    pub avg_wind_speed: f64,
}

/// Aggregated forecast: the next ~24h of readings and up to five daily summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub hourly: Vec<Reading>,
    pub daily: Vec<DailySummary>,
}

/// City metadata echoed by the forecast endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
    /// Offset from UTC in seconds.
    pub timezone_offset: i32,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub forecast: Forecast,
    pub city: City,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_str_roundtrip_and_toggle() {
        for unit in [TemperatureUnit::Metric, TemperatureUnit::Imperial] {
            assert_eq!(TemperatureUnit::try_from(unit.as_str()).unwrap(), unit);
        }
        assert_eq!(TemperatureUnit::Metric.toggled(), TemperatureUnit::Imperial);
        assert_eq!(TemperatureUnit::Imperial.toggled(), TemperatureUnit::Metric);
    }

    #[test]
    fn unknown_theme_mode_error() {
        let err = ThemeMode::try_from("sepia").unwrap_err();
        assert!(err.to_string().contains("Unknown theme mode"));
    }

    #[test]
    fn reading_date_uses_utc_day() {
        // 2024-01-15T23:00:00Z
        let reading = Reading {
            timestamp: 1_705_359_600,
            temperature: 0.0,
            condition: "Clear".into(),
            icon_code: "01n".into(),
            humidity: 50,
            wind_speed: 1.0,
        };
        assert_eq!(reading.date(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn distance_between_london_and_paris() {
        let london = Coordinates::new(51.5074, -0.1278);
        let paris = Coordinates::new(48.8566, 2.3522);
        let km = london.distance_m(&paris) / 1000.0;
        assert!((330.0..350.0).contains(&km), "got {km}");
        assert_eq!(london.distance_m(&london), 0.0);
    }
}
