//! Player settings and preferences
//!
//! Persisted in the key-value store alongside (but separate from) the
//! fallback leaderboard. The chosen drone and the username have keys of
//! their own so the title screen can restore them without the rest.

use serde::{Deserialize, Serialize};

use crate::persistence::{self, KeyValueStore};
use crate::tuning::Tuning;

/// Storage keys
pub const SETTINGS_KEY: &str = "sats_settings";
pub const DRONE_KEY: &str = "sats_drone_skin";
pub const USERNAME_KEY: &str = "lingo_username";

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Cosmetic effect budget for this preset
    pub fn max_effects(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 600,
            QualityPreset::High => 1500,
        }
    }

    /// Whether to draw the background starfield
    pub fn starfield_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Camera shake on hits
    pub screen_shake: bool,
    /// Particle and glyph bursts
    pub particles: bool,

    // === HUD ===
    /// FPS and frame time readout
    pub show_diagnostics: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Mute when window loses focus
    pub mute_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            screen_shake: true,
            particles: true,

            show_diagnostics: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective cosmetic effect cap
    pub fn max_effects(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_effects()
        }
    }

    /// Volume actually sent to the speakers
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Fold the cosmetic preferences into a tuning table
    pub fn apply_to(&self, tuning: &mut Tuning) {
        tuning.max_effects = self.max_effects();
        tuning.shake_scale = if self.effective_screen_shake() { 1.0 } else { 0.0 };
    }

    /// Load settings (defaults when missing or corrupt)
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let settings: Self = persistence::load_json(store, SETTINGS_KEY);
        log::info!("Settings loaded ({} quality)", settings.quality.as_str());
        settings
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) {
        persistence::save_json(store, SETTINGS_KEY, self);
        log::info!("Settings saved");
    }
}

/// Last chosen drone id, if any
pub fn load_drone<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store.get(DRONE_KEY).filter(|id| !id.is_empty())
}

pub fn save_drone<S: KeyValueStore + ?Sized>(store: &S, id: &str) {
    store.set(DRONE_KEY, id);
}

/// Last entered username, blank if none
pub fn load_username<S: KeyValueStore + ?Sized>(store: &S) -> String {
    store.get(USERNAME_KEY).unwrap_or_default()
}

pub fn save_username<S: KeyValueStore + ?Sized>(store: &S, name: &str) {
    store.set(USERNAME_KEY, name.trim());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_quality_from_str() {
        assert_eq!(QualityPreset::from_str("LOW"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_apply_to_tuning() {
        let mut tuning = Tuning::default();
        let mut settings = Settings::from_preset(QualityPreset::Low);
        settings.reduced_motion = true;
        settings.apply_to(&mut tuning);
        assert_eq!(tuning.max_effects, 150);
        assert_eq!(tuning.shake_scale, 0.0);

        settings.particles = false;
        settings.apply_to(&mut tuning);
        assert_eq!(tuning.max_effects, 0);
    }

    #[test]
    fn test_effective_volume() {
        let mut settings = Settings::default();
        assert!((settings.effective_volume() - 0.8).abs() < 1e-6);
        settings.muted = true;
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.quality = QualityPreset::High;
        settings.show_diagnostics = true;
        settings.save(&store);
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, r#"{"muted":true}"#);
        let settings = Settings::load(&store);
        assert!(settings.muted);
        assert_eq!(settings.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_corrupt_settings_use_defaults() {
        let store = MemoryStore::new();
        store.set(SETTINGS_KEY, "not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_drone_and_username_keys() {
        let store = MemoryStore::new();
        assert_eq!(load_drone(&store), None);
        save_drone(&store, "mapper");
        assert_eq!(load_drone(&store).as_deref(), Some("mapper"));
        save_username(&store, "  sat0shi ");
        assert_eq!(load_username(&store), "sat0shi");
    }
}
