//! Device location: one interface, implementation picked at startup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{
    fmt::Debug,
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Config, error::LocationError, model::Coordinates};

/// Upper bound on a single location resolution, independent of the weather client's timeout.
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(15);

const IP_LOOKUP_URL: &str = "http://ip-api.com/json/";

pub type LocationCallback = Box<dyn Fn(Coordinates) + Send + Sync>;
pub type LocationErrorCallback = Box<dyn Fn(LocationError) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    pub interval: Duration,
    /// Minimum movement in meters before a new position is reported.
    pub distance_filter_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self { interval: Duration::from_secs(10), distance_filter_m: 100.0 }
    }
}

/// Handle to a running watch; pass it to [`LocationProvider::stop_watching`].
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

#[async_trait]
pub trait LocationProvider: Send + Sync + Debug + 'static {
    async fn check_permission(&self) -> bool;

    async fn request_permission(&self) -> bool;

    async fn current_location(&self) -> Result<Coordinates, LocationError>;

    /// Poll the position every `options.interval`, reporting moves beyond the distance filter.
    fn watch(
        self: Arc<Self>,
        options: WatchOptions,
        on_update: LocationCallback,
        on_error: LocationErrorCallback,
    ) -> WatchHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(options.interval);
            let mut last: Option<Coordinates> = None;

            loop {
                ticker.tick().await;
                match self.current_location().await {
                    Ok(position) => {
                        let moved = last
                            .is_none_or(|prev| prev.distance_m(&position) >= options.distance_filter_m);
                        if moved {
                            last = Some(position);
                            on_update(position);
                        }
                    }
                    Err(err) => on_error(err),
                }
            }
        });

        WatchHandle { task }
    }

    fn stop_watching(&self, handle: WatchHandle) {
        handle.task.abort();
    }
}

/// Resolve the current position, asking for permission first when needed.
pub async fn locate(provider: &dyn LocationProvider) -> Result<Coordinates, LocationError> {
    locate_within(provider, LOCATION_TIMEOUT).await
}

pub async fn locate_within(
    provider: &dyn LocationProvider,
    timeout: Duration,
) -> Result<Coordinates, LocationError> {
    if !provider.check_permission().await && !provider.request_permission().await {
        return Err(LocationError::PermissionDenied);
    }

    tokio::time::timeout(timeout, provider.current_location())
        .await
        .map_err(|_| LocationError::Timeout)?
}

/// Pick the location source available in this environment.
pub fn detect(config: &Config) -> Arc<dyn LocationProvider> {
    match config.fixed_coordinates() {
        Some(coords) => {
            debug!(?coords, "using configured coordinates");
            Arc::new(FixedLocation::new(coords))
        }
        None => {
            debug!(allowed = config.location.allow_network_lookup, "using IP lookup");
            Arc::new(IpLocator::new(config.location.allow_network_lookup))
        }
    }
}

/// Coordinates set in configuration.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn check_permission(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> bool {
        true
    }

    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coords)
    }
}

/// Approximate location from the public IP address. Needs explicit consent.
#[derive(Debug)]
pub struct IpLocator {
    http: Client,
    url: String,
    allowed: bool,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    message: Option<String>,
}

impl IpLocator {
    pub fn new(allowed: bool) -> Self {
        Self::with_url(IP_LOOKUP_URL, allowed)
    }

    pub fn with_url(url: impl Into<String>, allowed: bool) -> Self {
        Self { http: Client::new(), url: url.into(), allowed }
    }
}

#[async_trait]
impl LocationProvider for IpLocator {
    async fn check_permission(&self) -> bool {
        self.allowed
    }

    async fn request_permission(&self) -> bool {
        // Consent comes from configuration; there is no prompt to show here.
        if !self.allowed {
            warn!("network location lookup not allowed; set location.allow_network_lookup");
        }
        self.allowed
    }

    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if !res.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned status {}",
                res.status()
            )));
        }

        let body: IpApiResponse =
            res.json().await.map_err(|e| LocationError::Unavailable(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => {
                info!(city = body.city.as_deref().unwrap_or("?"), "resolved location by IP");
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            )),
        }
    }
}
