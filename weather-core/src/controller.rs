//! Weather state: current conditions, forecast, location and preferences, plus
//! the fetch-and-persist sequences that update them.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    error::FetchError,
    location::{LocationProvider, locate},
    model::{
        Coordinates, CurrentWeather, FavoriteLocation, ForecastReport, Location, TemperatureUnit,
    },
    provider::WeatherProvider,
    store::PreferenceStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Whether a settled fetch was committed or dropped because a newer one was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub current: Option<CurrentWeather>,
    pub forecast: Option<ForecastReport>,
    pub location: Option<Location>,
    pub loading: bool,
    pub error: Option<String>,
    pub unit: TemperatureUnit,
    pub favorites: Vec<FavoriteLocation>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn status(&self) -> Status {
        if self.loading {
            Status::Loading
        } else if self.error.is_some() {
            Status::Failed
        } else if self.current.is_some() {
            Status::Loaded
        } else {
            Status::Idle
        }
    }
}

pub struct WeatherState {
    provider: Arc<dyn WeatherProvider>,
    locator: Arc<dyn LocationProvider>,
    store: PreferenceStore,
    inner: Mutex<Snapshot>,
    latest_token: AtomicU64,
}

impl std::fmt::Debug for WeatherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherState")
            .field("provider", &self.provider)
            .field("locator", &self.locator)
            .field("status", &self.status())
            .finish()
    }
}

impl WeatherState {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        locator: Arc<dyn LocationProvider>,
        store: PreferenceStore,
    ) -> Self {
        Self {
            provider,
            locator,
            store,
            inner: Mutex::new(Snapshot::default()),
            latest_token: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().clone()
    }

    pub fn status(&self) -> Status {
        self.inner.lock().status()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.inner.lock().unit
    }

    pub fn location(&self) -> Option<Location> {
        self.inner.lock().location.clone()
    }

    pub fn favorites(&self) -> Vec<FavoriteLocation> {
        self.inner.lock().favorites.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    /// Read unit and favorites from the store. Returns the last saved location, if any.
    pub async fn load_preferences(&self) -> Option<Coordinates> {
        let unit = self.store.get_temperature_unit().await;
        let favorites = self.store.get_favorites().await;
        let last = self.store.get_last_location().await;

        let mut inner = self.inner.lock();
        inner.unit = unit;
        inner.favorites = favorites;
        debug!(%unit, favorites = inner.favorites.len(), ?last, "loaded preferences");
        last
    }

    /// Load preferences and, when a location was saved, fetch its weather.
    /// A failed fetch is recorded in state rather than returned.
    pub async fn initialize(&self) {
        if let Some(last) = self.load_preferences().await
            && let Err(e) = self.fetch_by_coords(last).await
        {
            warn!(error = %e, "failed to load weather for last location");
        }
    }

    /// Issue a new request token and enter the loading state.
    ///
    /// Tokens are issued and compared only while the snapshot lock is held.
    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        inner.loading = true;
        inner.error = None;
        token
    }

    fn is_latest(&self, token: u64) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token
    }

    /// Commit a settled fetch if no newer one was issued meanwhile.
    async fn settle(
        &self,
        token: u64,
        result: Result<(CurrentWeather, ForecastReport, Location), FetchError>,
    ) -> Result<FetchOutcome, FetchError> {
        match result {
            Ok((current, forecast, location)) => {
                let coords = location.coordinates();
                {
                    let mut inner = self.inner.lock();
                    if !self.is_latest(token) {
                        debug!(token, "discarding superseded fetch result");
                        return Ok(FetchOutcome::Superseded);
                    }

                    info!(name = %location.name, country = %location.country, "weather loaded");
                    inner.current = Some(current);
                    inner.forecast = Some(forecast);
                    inner.location = Some(location);
                    inner.last_update = Some(Utc::now());
                    inner.error = None;
                    inner.loading = false;
                }

                self.store.save_last_location(coords).await;
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                let mut inner = self.inner.lock();
                if self.is_latest(token) {
                    inner.error = Some(e.to_string());
                    inner.loading = false;
                } else {
                    debug!(token, error = %e, "ignoring failure of superseded fetch");
                }
                Err(e)
            }
        }
    }

    /// Fetch current weather and forecast for `coords`. Both must succeed for anything to change.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_coords(&self, coords: Coordinates) -> Result<FetchOutcome, FetchError> {
        let token = self.begin();
        self.fetch_coords_with_token(token, coords).await
    }

    async fn fetch_coords_with_token(
        &self,
        token: u64,
        coords: Coordinates,
    ) -> Result<FetchOutcome, FetchError> {
        let unit = self.unit();

        let result = tokio::try_join!(
            self.provider.current_by_coords(coords, unit),
            self.provider.forecast_by_coords(coords, unit),
        )
        .map(|(current, forecast)| {
            let location = Location {
                latitude: coords.latitude,
                longitude: coords.longitude,
                name: current.name.clone(),
                country: current.country.clone(),
            };
            (current, forecast, location)
        })
        .map_err(FetchError::from);

        self.settle(token, result).await
    }

    /// Like [`fetch_by_coords`](Self::fetch_by_coords) but by city name. The stored location uses
    /// the coordinates reported in the current-weather response.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_city(&self, name: &str) -> Result<FetchOutcome, FetchError> {
        let token = self.begin();
        let unit = self.unit();

        let result = tokio::try_join!(
            self.provider.current_by_city(name, unit),
            self.provider.forecast_by_city(name, unit),
        )
        .map(|(current, forecast)| {
            let location = Location {
                latitude: current.coordinates.latitude,
                longitude: current.coordinates.longitude,
                name: current.name.clone(),
                country: current.country.clone(),
            };
            (current, forecast, location)
        })
        .map_err(FetchError::from);

        self.settle(token, result).await
    }

    /// Resolve the device position, then fetch it. The request keeps the token taken on entry,
    /// so a fetch issued while locating still wins.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_current_location(&self) -> Result<FetchOutcome, FetchError> {
        let token = self.begin();

        match locate(self.locator.as_ref()).await {
            Ok(coords) => self.fetch_coords_with_token(token, coords).await,
            Err(e) => self.settle(token, Err(e.into())).await,
        }
    }

    /// Re-fetch the displayed location, or the device location when none is known.
    pub async fn refresh(&self) -> Result<FetchOutcome, FetchError> {
        match self.location() {
            Some(location) => self.fetch_by_coords(location.coordinates()).await,
            None => self.fetch_by_current_location().await,
        }
    }

    /// Flip and persist the unit, re-fetching when a location is known so values
    /// stay in the provider's own rendering.
    pub async fn toggle_temperature_unit(&self) -> Result<TemperatureUnit, FetchError> {
        let (unit, location) = {
            let mut inner = self.inner.lock();
            inner.unit = inner.unit.toggled();
            (inner.unit, inner.location.clone())
        };
        self.store.save_temperature_unit(unit).await;

        if let Some(location) = location {
            self.fetch_by_coords(location.coordinates()).await?;
        }
        Ok(unit)
    }

    /// Save the current location as a favorite. Returns whether it was added.
    pub async fn add_to_favorites(&self) -> bool {
        let Some(location) = self.location() else {
            return false;
        };

        let added = self.store.add_favorite(FavoriteLocation::from(&location)).await;
        if added {
            let favorites = self.store.get_favorites().await;
            self.inner.lock().favorites = favorites;
        }
        added
    }

    pub async fn remove_from_favorites(&self, name: &str) {
        self.store.remove_favorite(name).await;
        let favorites = self.store.get_favorites().await;
        self.inner.lock().favorites = favorites;
    }

    /// Whether the current location is saved, matched on name and country.
    pub fn is_favorite(&self) -> bool {
        let inner = self.inner.lock();
        let Some(location) = inner.location.as_ref() else {
            return false;
        };
        inner.favorites.iter().any(|f| f.same_place(&location.name, &location.country))
    }
}
