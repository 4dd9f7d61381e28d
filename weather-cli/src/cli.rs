use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};
use std::sync::Arc;
use tracing::debug;
use weather_core::{
    Appearance, Config, Coordinates, PreferenceStore, ThemeState, WeatherState,
    location, provider::provider_from_config, store::FileStore,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and how your location is found.
    Configure,

    /// Show current weather and forecast.
    ///
    /// Without arguments, shows the last location, falling back to your current location.
    Show {
        /// City name, e.g. "London" or "London,GB".
        #[arg(long, conflicts_with_all = ["lat", "lon", "here"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Use the current device location.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        here: bool,
    },

    /// Re-fetch the last shown location.
    Refresh,

    /// Toggle between metric and imperial units.
    Unit,

    /// Show or change the color theme.
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Manage favorite locations.
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },

    /// Forget favorites, unit, theme and last location.
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ThemeAction {
    Light,
    Dark,
    System,
    Toggle,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    List,

    /// Save the last shown location, or `--city`.
    Add {
        #[arg(long)]
        city: Option<String>,
    },

    Remove {
        name: String,
    },

    /// Show weather for a saved favorite.
    Show {
        name: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon, here } => {
                let app = App::new()?;
                let state = app.weather_state()?;
                state.load_preferences().await;

                let result = match (city, lat.zip(lon)) {
                    (Some(city), _) => state.fetch_by_city(&city).await.map(|_| ()),
                    (None, Some((lat, lon))) => {
                        state.fetch_by_coords(Coordinates::new(lat, lon)).await.map(|_| ())
                    }
                    (None, None) if here => state.fetch_by_current_location().await.map(|_| ()),
                    (None, None) => show_last_or_here(&state).await,
                };

                app.render(&state).await;
                result.context("Could not load weather")
            }
            Command::Refresh => {
                let app = App::new()?;
                let state = app.weather_state()?;
                let result = show_last_or_here(&state).await;
                app.render(&state).await;
                result.context("Could not refresh weather")
            }
            Command::Unit => {
                let app = App::new()?;
                let state = app.weather_state()?;
                state.load_preferences().await;

                let unit = state.toggle_temperature_unit().await?;
                println!("Temperature unit: {unit}");
                Ok(())
            }
            Command::Theme { action } => {
                let app = App::new()?;
                let mut theme = app.theme().await;
                match action {
                    Some(ThemeAction::Light) => theme.set_light().await,
                    Some(ThemeAction::Dark) => theme.set_dark().await,
                    Some(ThemeAction::System) => theme.set_system().await,
                    Some(ThemeAction::Toggle) => {
                        theme.toggle().await;
                    }
                    None => {}
                }
                let appearance = if theme.is_dark() { "dark" } else { "light" };
                println!("Theme: {} ({appearance})", theme.mode());
                Ok(())
            }
            Command::Favorites { action } => favorites(action).await,
            Command::Reset => {
                let confirmed = Confirm::new("Forget all saved preferences?")
                    .with_default(false)
                    .prompt()?;
                if confirmed {
                    let app = App::new()?;
                    if !app.store.clear_all().await {
                        bail!("Failed to clear preferences");
                    }
                    println!("Preferences cleared.");
                }
                Ok(())
            }
        }
    }
}

/// Weather for the saved location, or the device location when none is saved.
async fn show_last_or_here(state: &WeatherState) -> Result<(), weather_core::FetchError> {
    match state.load_preferences().await {
        Some(last) => state.fetch_by_coords(last).await.map(|_| ()),
        None => {
            debug!("no saved location, falling back to the device location");
            state.refresh().await.map(|_| ())
        }
    }
}

async fn favorites(action: FavoritesCommand) -> Result<()> {
    let app = App::new()?;

    match action {
        FavoritesCommand::List => {
            render::favorites(&app.store.get_favorites().await);
        }
        FavoritesCommand::Add { city } => {
            let state = app.weather_state()?;
            match city {
                Some(city) => {
                    state.load_preferences().await;
                    state.fetch_by_city(&city).await?;
                }
                None => show_last_or_here(&state).await?,
            }

            let location = state.location().context("No location to save")?;
            if state.add_to_favorites().await {
                println!("Added {}, {} to favorites.", location.name, location.country);
            } else {
                println!("{}, {} is already a favorite.", location.name, location.country);
            }
        }
        FavoritesCommand::Remove { name } => {
            let before = app.store.get_favorites().await.len();
            app.store.remove_favorite(&name).await;
            if app.store.get_favorites().await.len() == before {
                println!("No favorite named {name}.");
            } else {
                println!("Removed {name}.");
            }
        }
        FavoritesCommand::Show { name } => {
            let state = app.weather_state()?;
            state.load_preferences().await;
            let favorite = state
                .favorites()
                .into_iter()
                .find(|f| f.name.eq_ignore_ascii_case(&name))
                .with_context(|| format!("No favorite named {name}"))?;

            let result = state.fetch_by_coords(favorite.coordinates()).await;
            app.render(&state).await;
            result?;
        }
    }

    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    let fixed = Confirm::new("Use fixed coordinates as your location?")
        .with_default(config.fixed_coordinates().is_some())
        .prompt()?;

    if fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number")
            .prompt()?;
        config.location.latitude = Some(latitude);
        config.location.longitude = Some(longitude);
    } else {
        config.location.latitude = None;
        config.location.longitude = None;
        config.location.allow_network_lookup =
            Confirm::new("Allow approximate location lookup from your IP address?")
                .with_default(config.location.allow_network_lookup)
                .prompt()?;
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

struct App {
    config: Config,
    store: PreferenceStore,
}

impl App {
    fn new() -> Result<Self> {
        let config = Config::load()?;
        let preferences = Config::preferences_file_path()?;
        debug!(preferences = %preferences.display(), "opening preference store");
        let store = PreferenceStore::new(Arc::new(FileStore::new(preferences)));
        Ok(Self { config, store })
    }

    fn weather_state(&self) -> Result<WeatherState> {
        let provider = provider_from_config(&self.config)?;
        let locator = location::detect(&self.config);
        Ok(WeatherState::new(provider, locator, self.store.clone()))
    }

    async fn theme(&self) -> ThemeState {
        ThemeState::load(self.store.clone(), terminal_appearance()).await
    }

    async fn render(&self, state: &WeatherState) {
        let theme = self.theme().await;
        render::weather(&state.snapshot(), &theme, state.is_favorite());
    }
}

/// Terminal background from `COLORFGBG` ("fg;bg"); background 0-6 or 8 is dark.
fn terminal_appearance() -> Option<Appearance> {
    let value = std::env::var("COLORFGBG").ok()?;
    let bg: u8 = value.rsplit(';').next()?.parse().ok()?;
    Some(if bg <= 6 || bg == 8 { Appearance::Dark } else { Appearance::Light })
}
