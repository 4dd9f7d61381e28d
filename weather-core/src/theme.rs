use tracing::debug;

use crate::{
    model::{Appearance, ThemeMode},
    store::PreferenceStore,
};

/// Theme preference plus the appearance it resolves to. Every change is persisted.
#[derive(Debug)]
pub struct ThemeState {
    store: PreferenceStore,
    mode: ThemeMode,
    system: Option<Appearance>,
}

impl ThemeState {
    /// Read the stored mode. `system` is the platform's current appearance, if known.
    pub async fn load(store: PreferenceStore, system: Option<Appearance>) -> Self {
        let mode = store.get_theme_mode().await;
        debug!(%mode, ?system, "loaded theme preference");
        Self { store, mode, system }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn follows_system(&self) -> bool {
        self.mode == ThemeMode::System
    }

    pub fn appearance(&self) -> Appearance {
        match self.mode {
            ThemeMode::Light => Appearance::Light,
            ThemeMode::Dark => Appearance::Dark,
            ThemeMode::System => self.system.unwrap_or_default(),
        }
    }

    pub fn is_dark(&self) -> bool {
        self.appearance() == Appearance::Dark
    }

    /// Flip the effective appearance; the result is an explicit light or dark choice.
    pub async fn toggle(&mut self) -> ThemeMode {
        let next = match self.appearance() {
            Appearance::Light => ThemeMode::Dark,
            Appearance::Dark => ThemeMode::Light,
        };
        self.set_mode(next).await;
        next
    }

    pub async fn set_light(&mut self) {
        self.set_mode(ThemeMode::Light).await;
    }

    pub async fn set_dark(&mut self) {
        self.set_mode(ThemeMode::Dark).await;
    }

    pub async fn set_system(&mut self) {
        self.set_mode(ThemeMode::System).await;
    }

    pub async fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
        self.store.save_theme_mode(mode).await;
    }

    /// The platform appearance changed; only matters while following the system.
    pub fn set_system_appearance(&mut self, system: Option<Appearance>) {
        self.system = system;
    }
}
