use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{
    config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS},
    error::WeatherError,
    forecast::aggregate,
    model::{City, Coordinates, CurrentWeather, ForecastReport, Reading, TemperatureUnit},
};

use super::{LocationQuery, WeatherProvider};

const CURRENT_WEATHER_PATH: &str = "/weather";
const FORECAST_PATH: &str = "/forecast";

/// OpenWeather 2.5 client. Every request carries the API key and the requested unit system.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

#[derive(Debug)]
pub struct OpenWeatherClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient, WeatherError> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| WeatherError::Client(e.to_string()))?;

        Ok(OpenWeatherClient {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

impl OpenWeatherClient {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let mut params: Vec<(&str, String)> = match query {
            LocationQuery::Coordinates(c) => {
                vec![("lat", c.latitude.to_string()), ("lon", c.longitude.to_string())]
            }
            LocationQuery::City(name) => vec![("q", name.clone())],
        };
        params.push(("units", unit.as_str().to_string()));
        params.push(("appid", self.api_key.clone()));

        debug!(%url, ?query, %unit, "requesting OpenWeather");

        let res = self.http.get(&url).query(&params).send().await?;
        handle_response(res).await
    }
}

async fn handle_response<T: DeserializeOwned>(res: Response) -> Result<T, WeatherError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<OwErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        debug!(%status, body = %truncate_body(&body), "OpenWeather request failed");
        return Err(WeatherError::from_status(status.as_u16(), message));
    }

    serde_json::from_str(&body).map_err(|e| {
        WeatherError::Provider(format!("Malformed response from weather provider: {e}"))
    })
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    temp_min: f64,
    #[serde(default)]
    temp_max: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: u8,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    coord: OwCoord,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    visibility: Option<u32>,
    #[serde(default)]
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: String,
    #[serde(default)]
    country: String,
    coord: OwCoord,
    #[serde(default)]
    timezone: i32,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

impl From<OwCurrentResponse> for CurrentWeather {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition, description, icon) = primary_weather(parsed.weather);

        CurrentWeather {
            name: parsed.name,
            country: parsed.sys.country.unwrap_or_default(),
            coordinates: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            temp_min: parsed.main.temp_min,
            temp_max: parsed.main.temp_max,
            humidity: parsed.main.humidity,
            pressure: parsed.main.pressure,
            wind_speed: parsed.wind.speed,
            wind_deg: parsed.wind.deg,
            condition,
            description,
            icon,
            visibility: parsed.visibility,
            cloudiness: parsed.clouds.all,
            observed_at: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
        }
    }
}

impl From<OwForecastEntry> for Reading {
    fn from(entry: OwForecastEntry) -> Self {
        let (condition, _, icon_code) = primary_weather(entry.weather);

        Reading {
            timestamp: entry.dt,
            temperature: entry.main.temp,
            condition,
            icon_code,
            humidity: entry.main.humidity,
            wind_speed: entry.wind.speed,
        }
    }
}

impl From<OwForecastResponse> for ForecastReport {
    fn from(parsed: OwForecastResponse) -> Self {
        let readings: Vec<Reading> = parsed.list.into_iter().map(Reading::from).collect();
        let city = parsed.city;

        ForecastReport {
            forecast: aggregate(&readings),
            city: City {
                name: city.name,
                country: city.country,
                coordinates: Coordinates::new(city.coord.lat, city.coord.lon),
                timezone_offset: city.timezone,
                sunrise: city.sunrise.and_then(unix_to_utc),
                sunset: city.sunset.and_then(unix_to_utc),
            },
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn current_weather(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, WeatherError> {
        let parsed: OwCurrentResponse = self.get(CURRENT_WEATHER_PATH, query, unit).await?;
        Ok(parsed.into())
    }

    #[instrument(skip(self), level = "info")]
    async fn forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<ForecastReport, WeatherError> {
        let parsed: OwForecastResponse = self.get(FORECAST_PATH, query, unit).await?;
        Ok(parsed.into())
    }
}

/// `(main, description, icon)` of the first weather entry.
fn primary_weather(weather: Vec<OwWeather>) -> (String, String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.main, w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new(), String::new()))
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::builder("test_key").base_url(server.uri()).build().unwrap()
    }

    fn current_body() -> serde_json::Value {
        serde_json::json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }],
            "main": {
                "temp": 11.2, "feels_like": 10.4, "temp_min": 9.9, "temp_max": 12.3,
                "pressure": 1012, "humidity": 81
            },
            "visibility": 10000,
            "wind": { "speed": 4.1, "deg": 240 },
            "clouds": { "all": 75 },
            "dt": 1_705_330_800,
            "sys": { "country": "GB", "sunrise": 1_705_305_600, "sunset": 1_705_336_000 },
            "timezone": 0,
            "name": "London",
            "cod": 200
        })
    }

    fn forecast_body() -> serde_json::Value {
        let list: Vec<serde_json::Value> = (0..16)
            .map(|i| {
                serde_json::json!({
                    "dt": 1_705_276_800 + i * 3 * 3600,
                    "main": { "temp": 5.0 + i as f64, "feels_like": 4.0, "humidity": 70 },
                    "weather": [{ "main": "Rain", "description": "light rain", "icon": "10d" }],
                    "wind": { "speed": 2.0, "deg": 180 }
                })
            })
            .collect();

        serde_json::json!({
            "cod": "200",
            "cnt": list.len(),
            "list": list,
            "city": {
                "name": "London",
                "country": "GB",
                "coord": { "lat": 51.5085, "lon": -0.1257 },
                "timezone": 0,
                "sunrise": 1_705_305_600,
                "sunset": 1_705_336_000
            }
        })
    }

    #[tokio::test]
    async fn current_by_city_sends_key_and_unit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "London"))
            .and(query_param("units", "imperial"))
            .and(query_param("appid", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let weather = client(&server)
            .current_by_city("London", TemperatureUnit::Imperial)
            .await
            .unwrap();

        assert_eq!(weather.name, "London");
        assert_eq!(weather.country, "GB");
        assert_eq!(weather.coordinates, Coordinates::new(51.5085, -0.1257));
        assert_eq!(weather.temperature, 11.2);
        assert_eq!(weather.pressure, 1012);
        assert_eq!(weather.condition, "Clouds");
        assert_eq!(weather.icon, "04d");
        assert_eq!(weather.visibility, Some(10000));
        assert_eq!(weather.cloudiness, 75);
    }

    #[tokio::test]
    async fn forecast_by_coords_is_aggregated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "51.5"))
            .and(query_param("lon", "-0.12"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&server)
            .await;

        let report = client(&server)
            .forecast_by_coords(Coordinates::new(51.5, -0.12), TemperatureUnit::Metric)
            .await
            .unwrap();

        assert_eq!(report.forecast.hourly.len(), 8);
        assert_eq!(report.forecast.daily.len(), 2);
        assert_eq!(report.forecast.daily[0].temp_min, 5.0);
        assert_eq!(report.forecast.daily[0].temp_max, 12.0);
        assert_eq!(report.forecast.daily[0].dominant_condition, "Rain");
        assert_eq!(report.city.name, "London");
        assert!(report.city.sunrise.is_some());
    }

    async fn error_for_status(status: u16, body: serde_json::Value) -> WeatherError {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;

        client(&server)
            .current_by_city("Nowhere", TemperatureUnit::Metric)
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn classifies_http_errors() {
        let body = serde_json::json!({ "cod": 401, "message": "Invalid API key" });
        assert_eq!(error_for_status(401, body).await, WeatherError::InvalidCredential);

        let body = serde_json::json!({ "cod": "404", "message": "city not found" });
        assert_eq!(error_for_status(404, body).await, WeatherError::LocationNotFound);

        let body = serde_json::json!({ "cod": 429 });
        assert_eq!(error_for_status(429, body).await, WeatherError::RateLimited);

        let body = serde_json::json!({ "cod": "400", "message": "wrong latitude" });
        assert_eq!(
            error_for_status(400, body).await,
            WeatherError::Provider("wrong latitude".into())
        );

        let body = serde_json::json!({});
        assert_eq!(
            error_for_status(502, body).await,
            WeatherError::Provider(WeatherError::GENERIC_PROVIDER_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn malformed_success_body_is_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .forecast_by_city("London", TemperatureUnit::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Provider(msg) if msg.contains("Malformed")));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_unavailable() {
        // Nothing listens on port 1.
        let client = OpenWeatherClient::builder("k")
            .base_url("http://127.0.0.1:1")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = client.current_by_city("London", TemperatureUnit::Metric).await.unwrap_err();

        assert_eq!(err, WeatherError::NetworkUnavailable);
    }

    #[tokio::test]
    async fn unparsable_base_url_is_client_error() {
        let client = OpenWeatherClient::builder("k").base_url("not a url").build().unwrap();
        let err = client.current_by_city("London", TemperatureUnit::Metric).await.unwrap_err();

        assert!(matches!(err, WeatherError::Client(_)), "got {err:?}");
    }

    #[test]
    fn truncate_body_limits_length() {
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
