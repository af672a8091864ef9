//! Sats Drone - a browser arcade shooter
//!
//! Core modules:
//! - `sim`: Simulation (entities, collisions, combo scoring, game/wave phases)
//! - `driver`: Per-frame timing and run lifecycle around the simulation
//! - `tuning`: Data-driven game balance
//! - `leaderboard`: Remote leaderboard with on-device fallback
//! - `persistence`: Key-value storage (LocalStorage on web)
//! - `platform`: Input adapters and browser/native differences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod driver;
pub mod error;
pub mod hud;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use driver::{FrameClock, Simulation};
pub use error::{LeaderboardError, SimError, TuningError};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Player spawn point as a fraction of the viewport
    pub const PLAYER_START_X: f32 = 0.5;
    pub const PLAYER_START_Y: f32 = 0.55;
    /// Initial facing (pointing up the screen)
    pub const PLAYER_START_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;

    /// Extra margin beyond a hazard's radius before it wraps
    pub const WRAP_MARGIN: f32 = 20.0;
    /// Shots are culled this far outside the viewport
    pub const SHOT_CULL_MARGIN: f32 = 40.0;
    /// Distance ahead of the drone hull where shots appear
    pub const MUZZLE_OFFSET: f32 = 8.0;

    /// Virtual stick travel in CSS pixels
    pub const STICK_RADIUS: f32 = 80.0;

    /// Background stars
    pub const STAR_COUNT: usize = 140;
    pub const STAR_WRAP: f32 = 4.0;

    /// Frames a fixed-rate reference assumes when scaling per-frame factors
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Username used when the player leaves the field blank
    pub const DEFAULT_USERNAME: &str = "LINGO";
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Clamp a vector to the unit disc, keeping its direction
#[inline]
pub fn clamp_to_unit(v: Vec2) -> Vec2 {
    if v.length_squared() > 1.0 { v.normalize() } else { v }
}

/// Reshape an analog stick vector with a power curve.
///
/// The magnitude `m` becomes `m^k` while the direction is kept, so small
/// deflections are softened and full deflection passes through unchanged.
/// A zero vector maps to exactly zero.
pub fn response_curve(v: Vec2, k: f32) -> Vec2 {
    let magnitude = v.length();
    if magnitude == 0.0 {
        return Vec2::ZERO;
    }
    let curved = magnitude.powf(k);
    v * (curved / magnitude)
}
