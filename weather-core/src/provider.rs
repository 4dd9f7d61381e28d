use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, CurrentWeather, ForecastReport, TemperatureUnit},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// How a request identifies its location.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Coordinates(Coordinates),
    City(String),
}

/// Remote source of current conditions and forecasts.
///
/// Numeric fields come back already rendered in `unit`; nothing is converted locally.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, WeatherError>;

    async fn forecast(
        &self,
        query: &LocationQuery,
        unit: TemperatureUnit,
    ) -> Result<ForecastReport, WeatherError>;

    async fn current_by_coords(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, WeatherError> {
        self.current_weather(&LocationQuery::Coordinates(coords), unit).await
    }

    async fn current_by_city(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, WeatherError> {
        self.current_weather(&LocationQuery::City(city.to_string()), unit).await
    }

    async fn forecast_by_coords(
        &self,
        coords: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<ForecastReport, WeatherError> {
        self.forecast(&LocationQuery::Coordinates(coords), unit).await
    }

    async fn forecast_by_city(
        &self,
        city: &str,
        unit: TemperatureUnit,
    ) -> Result<ForecastReport, WeatherError> {
        self.forecast(&LocationQuery::City(city.to_string()), unit).await
    }
}

/// Construct the OpenWeather client from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let client = OpenWeatherClient::builder(api_key)
        .base_url(config.base_url())
        .timeout(config.request_timeout())
        .build()?;

    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_config_works_when_key_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
