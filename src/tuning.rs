//! Data-driven game balance
//!
//! [`Tuning::default`] carries the shipped values. A JSON document can
//! override any subset of them through [`Tuning::from_json`]; missing keys
//! keep their defaults.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Hazard size tier, ordered smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardTier {
    Small,
    Medium,
    Large,
}

impl HazardTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HazardTier::Small => "small",
            HazardTier::Medium => "medium",
            HazardTier::Large => "large",
        }
    }
}

/// Per-tier hazard properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    pub radius: f32,
    pub score: u32,
    /// Tier spawned twice when this one is destroyed
    pub split: Option<HazardTier>,
    /// Base drift speed (px/s) before wave bonus and jitter
    pub speed: f32,
    /// Camera shake (seconds, pixels) when destroyed
    pub shake: (f32, f32),
}

/// All hazard tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTiers {
    pub large: TierSpec,
    pub medium: TierSpec,
    pub small: TierSpec,
}

impl Default for HazardTiers {
    fn default() -> Self {
        Self {
            large: TierSpec {
                radius: 52.0,
                score: 15,
                split: Some(HazardTier::Medium),
                speed: 28.0,
                shake: (0.18, 10.0),
            },
            medium: TierSpec {
                radius: 32.0,
                score: 12,
                split: Some(HazardTier::Small),
                speed: 38.0,
                shake: (0.12, 7.0),
            },
            small: TierSpec {
                radius: 18.0,
                score: 28,
                split: None,
                speed: 54.0,
                shake: (0.08, 4.0),
            },
        }
    }
}

impl HazardTiers {
    pub fn get(&self, tier: HazardTier) -> &TierSpec {
        match tier {
            HazardTier::Large => &self.large,
            HazardTier::Medium => &self.medium,
            HazardTier::Small => &self.small,
        }
    }
}

/// Drone handling characteristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneArchetype {
    pub id: String,
    pub name: String,
    /// Per-frame velocity blend factor at 60 fps (0-1)
    pub accel: f32,
    pub max_speed: f32,
    pub collision_radius: f32,
}

impl DroneArchetype {
    fn new(id: &str, name: &str, accel: f32, max_speed: f32, collision_radius: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            accel,
            max_speed,
            collision_radius,
        }
    }
}

fn default_drones() -> Vec<DroneArchetype> {
    vec![
        DroneArchetype::new("cinewhoop", "Cinewhoop", 0.42, 260.0, 18.0),
        DroneArchetype::new("racer", "Racer", 0.5, 300.0, 16.0),
        DroneArchetype::new("freestyle", "Freestyle", 0.46, 280.0, 17.0),
        DroneArchetype::new("heavy-lift", "Heavy Lift", 0.34, 230.0, 20.0),
        DroneArchetype::new("delivery", "Delivery", 0.38, 245.0, 19.0),
        DroneArchetype::new("mapper", "Mapper", 0.44, 270.0, 17.0),
    ]
}

/// One step of the pre-run countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownStep {
    pub text: String,
    pub duration_ms: f32,
    /// Beep frequency (Hz)
    pub beep: f32,
}

impl CountdownStep {
    fn new(text: &str, duration_ms: f32, beep: f32) -> Self {
        Self {
            text: text.to_string(),
            duration_ms,
            beep,
        }
    }
}

fn default_countdown() -> Vec<CountdownStep> {
    vec![
        CountdownStep::new("DRONES\nGOING UP", 900.0, 520.0),
        CountdownStep::new("CLEAR PROP", 900.0, 640.0),
        CountdownStep::new("3", 800.0, 520.0),
        CountdownStep::new("2", 800.0, 520.0),
        CountdownStep::new("1", 800.0, 520.0),
        CountdownStep::new("GO", 500.0, 820.0),
    ]
}

/// Complete tuning table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Weapons ===
    pub bullet_speed: f32,
    /// Minimum time between shots (ms)
    pub fire_rate_ms: f32,
    /// Shot lifetime (seconds)
    pub shot_life: f32,

    // === Run ===
    pub max_health: f32,
    pub wave_duration_ms: f32,
    pub ready_duration_ms: f32,
    /// Large hazards present when a run starts
    pub initial_hazards: u32,

    // === Spawning ===
    /// Spawn probability per second at wave 0
    pub spawn_rate: f32,
    /// Additional density per wave
    pub wave_density: f32,
    pub max_hazards: u32,
    /// Extra hazard cap per wave
    pub hazards_per_wave: u32,
    /// Extra hazard speed per wave (px/s)
    pub wave_speed_bonus: f32,
    /// Random extra speed (px/s)
    pub speed_jitter: f32,
    /// Offset applied to split children (px, full width)
    pub split_jitter: f32,

    // === Damage ===
    pub contact_damage: f32,
    pub danger_per_hit: f32,
    pub danger_decay: f32,
    pub danger_max: f32,
    pub damage_shake: (f32, f32),

    // === Combo ===
    pub combo_window_ms: f64,
    pub combo_idle_ms: f64,
    pub combo_step: f32,
    pub combo_bonus_cap: f32,
    pub combo_callout_every: u32,

    // === Handling ===
    pub stick_curve: f32,
    pub stick_friction: f32,
    pub accel_scale: f32,
    pub drone_speed_scale: f32,
    pub coarse_accel_multiplier: f32,
    pub coarse_speed_multiplier: f32,
    pub coarse_bullet_multiplier: f32,
    pub edge_padding: f32,
    /// Speed (px/s) above which the drone faces its velocity
    pub facing_speed: f32,

    // === Cosmetics ===
    pub max_effects: usize,
    /// Multiplier on every camera shake magnitude (0 disables shake)
    pub shake_scale: f32,

    // === Tables ===
    pub drones: Vec<DroneArchetype>,
    pub tiers: HazardTiers,
    pub countdown: Vec<CountdownStep>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            bullet_speed: 520.0,
            fire_rate_ms: 220.0,
            shot_life: 1.2,

            max_health: 100.0,
            wave_duration_ms: 20_000.0,
            ready_duration_ms: 2_500.0,
            initial_hazards: 3,

            spawn_rate: 0.35,
            wave_density: 0.15,
            max_hazards: 6,
            hazards_per_wave: 2,
            wave_speed_bonus: 3.0,
            speed_jitter: 8.0,
            split_jitter: 12.0,

            contact_damage: 18.0,
            danger_per_hit: 12.0,
            danger_decay: 6.0,
            danger_max: 100.0,
            damage_shake: (0.2, 12.0),

            combo_window_ms: 1200.0,
            combo_idle_ms: 1400.0,
            combo_step: 0.15,
            combo_bonus_cap: 4.0,
            combo_callout_every: 5,

            stick_curve: 1.6,
            stick_friction: 0.94,
            accel_scale: 0.75,
            drone_speed_scale: 0.85,
            coarse_accel_multiplier: 2.1,
            coarse_speed_multiplier: 1.35,
            coarse_bullet_multiplier: 1.15,
            edge_padding: 26.0,
            facing_speed: 5.0,

            max_effects: 600,
            shake_scale: 1.0,

            drones: default_drones(),
            tiers: HazardTiers::default(),
            countdown: default_countdown(),
        }
    }
}

impl Tuning {
    /// Overlay a JSON document on the defaults and validate the result
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tables the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.drones.is_empty() {
            return Err(TuningError::Empty("drones"));
        }
        if self.countdown.is_empty() {
            return Err(TuningError::Empty("countdown"));
        }
        let positive = [
            ("bullet_speed", self.bullet_speed),
            ("shot_life", self.shot_life),
            ("max_health", self.max_health),
            ("wave_duration_ms", self.wave_duration_ms),
            ("ready_duration_ms", self.ready_duration_ms),
            ("danger_max", self.danger_max),
            ("tiers.large.radius", self.tiers.large.radius),
            ("tiers.medium.radius", self.tiers.medium.radius),
            ("tiers.small.radius", self.tiers.small.radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(TuningError::NonPositive {
                    field,
                    value: value as f64,
                });
            }
        }
        Ok(())
    }

    /// Look up a drone by id, falling back to the first archetype
    pub fn drone(&self, id: &str) -> &DroneArchetype {
        self.drones
            .iter()
            .find(|d| d.id == id)
            .unwrap_or(&self.drones[0])
    }

    /// Tier spawned when `tier` is destroyed. Only strictly smaller tiers
    /// are honoured, so a split chain always terminates.
    pub fn split_of(&self, tier: HazardTier) -> Option<HazardTier> {
        self.tiers.get(tier).split.filter(|child| *child < tier)
    }

    /// Hazard population cap for a wave
    pub fn hazard_cap(&self, wave: u32) -> usize {
        (self.max_hazards + wave * self.hazards_per_wave) as usize
    }

    /// Spawn probability for one tick of `dt` seconds
    pub fn spawn_chance(&self, wave: u32, dt: f32) -> f32 {
        self.spawn_rate * (1.0 + wave as f32 * self.wave_density) * dt
    }
}
