//! World state and core simulation types
//!
//! The [`World`] is the single mutable aggregate of a session. Every
//! subsystem receives it explicitly; nothing reaches it through globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::ScoreState;
use crate::consts::*;
use crate::error::SimError;
use crate::tuning::{DroneArchetype, HazardTier, Tuning};

/// Top-level game state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Page loaded, nothing shown yet
    Boot,
    /// Title screen
    Start,
    /// Title screen after the player picked a drone
    SelectDrone,
    /// Pause before a wave
    Ready,
    /// Pre-run countdown sequence
    Countdown,
    /// Active gameplay
    Playing,
    /// Run ended
    GameOver,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Boot => "BOOT",
            GamePhase::Start => "START",
            GamePhase::SelectDrone => "SELECT_DRONE",
            GamePhase::Ready => "READY",
            GamePhase::Countdown => "COUNTDOWN",
            GamePhase::Playing => "PLAYING",
            GamePhase::GameOver => "GAMEOVER",
        }
    }

    /// Phases in which the drone flies and entities move
    pub fn is_flying(&self) -> bool {
        matches!(self, GamePhase::Ready | GamePhase::Playing)
    }
}

/// Screen-edge insets (notches, home indicators) in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeInsets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

/// Play-field dimensions and device traits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub insets: SafeInsets,
    /// Touch-first device: handling and shots get boosted
    pub coarse_pointer: bool,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            insets: SafeInsets::default(),
            coarse_pointer: false,
        }
    }

    /// Where the drone spawns, and what it faces while waiting for a wave
    pub fn home(&self) -> Vec2 {
        Vec2::new(self.width * PLAYER_START_X, self.height * PLAYER_START_Y)
    }
}

/// The player's drone
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing (radians)
    pub angle: f32,
    pub drone: DroneArchetype,
}

impl Player {
    pub fn new(drone: DroneArchetype, viewport: &Viewport) -> Self {
        Self {
            pos: viewport.home(),
            vel: Vec2::ZERO,
            angle: PLAYER_START_ANGLE,
            drone,
        }
    }

    fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.angle.is_finite()
    }
}

/// One vertex of an irregular hazard outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlinePoint {
    pub angle: f32,
    pub radius: f32,
}

/// A drifting hazard (the asteroid-like "sats" the player shoots)
#[derive(Debug, Clone)]
pub struct Hazard {
    pub id: u32,
    pub tier: HazardTier,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Rotation of the outline (radians)
    pub angle: f32,
    /// Angular velocity (radians/sec)
    pub spin: f32,
    /// Fixed at spawn, only rotated afterwards. Empty for round hazards.
    pub outline: Vec<OutlinePoint>,
}

/// A shot fired by the drone
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left before the shot fizzles
    pub life: f32,
    /// Cosmetic hue shift (degrees)
    pub hue: f32,
}

/// What a cosmetic effect draws
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Debris dot
    Particle,
    /// Brief bright ring at an impact
    Flash,
    /// Coin glyph flung out of a destroyed hazard
    Glyph { glyph: char, spin: f32 },
    /// Floating text
    Popup { text: &'static str },
}

/// A purely visual entity. Dropping one never changes gameplay.
#[derive(Debug, Clone)]
pub struct Effect {
    pub kind: EffectKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
}

impl Effect {
    /// Remaining life as 0-1 (for fading)
    pub fn fade(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Background star
#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub pos: Vec2,
    pub size: f32,
    pub speed: f32,
    pub drift: f32,
}

/// Camera shake pulse
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraShake {
    pub time: f32,
    pub duration: f32,
    pub magnitude: f32,
}

impl CameraShake {
    pub fn trigger(&mut self, duration: f32, magnitude: f32) {
        self.time = duration;
        self.duration = duration;
        self.magnitude = magnitude;
    }

    pub fn decay(&mut self, dt: f32) {
        self.time = (self.time - dt).max(0.0);
    }

    /// Current offset amplitude in pixels
    pub fn intensity(&self) -> f32 {
        if self.duration > 0.0 && self.time > 0.0 {
            self.magnitude * (self.time / self.duration)
        } else {
            0.0
        }
    }
}

/// Progress through the countdown sequence
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    pub step: usize,
    pub remaining_ms: f32,
    pub step_ms: f32,
    pub text: String,
}

impl Countdown {
    /// Fraction of the current step already shown (0-1)
    pub fn progress(&self) -> f32 {
        if self.step_ms > 0.0 {
            (1.0 - self.remaining_ms / self.step_ms).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub phase: GamePhase,
    pub viewport: Viewport,
    /// Simulation time spent in READY/PLAYING this run (ms)
    pub elapsed_ms: f64,
    /// 1-based wave number
    pub wave: u32,
    pub wave_timer_ms: f32,
    pub ready_timer_ms: f32,
    pub countdown: Countdown,
    pub score: ScoreState,
    pub health: f32,
    pub max_health: f32,
    /// 0-100 stress meter; the run ends when it fills
    pub danger: f32,
    /// Last-tier hazards destroyed this run
    pub sats_collected: u32,
    pub last_shot_ms: f64,
    pub player: Player,
    pub hazards: Vec<Hazard>,
    pub projectiles: Vec<Projectile>,
    pub effects: Vec<Effect>,
    pub stars: Vec<Star>,
    pub shake: CameraShake,
    pub rng: Pcg32,
    next_id: u32,
}

impl World {
    /// Create a world at boot with the first drone selected
    pub fn new(seed: u64, viewport: Viewport, tuning: &Tuning) -> Self {
        let drone = tuning.drone("").clone();
        let mut world = Self {
            phase: GamePhase::Boot,
            viewport,
            elapsed_ms: 0.0,
            wave: 1,
            wave_timer_ms: 0.0,
            ready_timer_ms: tuning.ready_duration_ms,
            countdown: Countdown::default(),
            score: ScoreState::default(),
            health: tuning.max_health,
            max_health: tuning.max_health,
            danger: 0.0,
            sats_collected: 0,
            last_shot_ms: f64::NEG_INFINITY,
            player: Player::new(drone, &viewport),
            hazards: Vec::new(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            stars: Vec::new(),
            shake: CameraShake::default(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };
        super::entities::init_stars(&mut world);
        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Reset everything a run touches. The phase, viewport, starfield and
    /// selected drone survive.
    pub fn reset(&mut self, tuning: &Tuning) {
        self.elapsed_ms = 0.0;
        self.wave = 1;
        self.wave_timer_ms = 0.0;
        self.ready_timer_ms = tuning.ready_duration_ms;
        self.countdown = Countdown::default();
        self.score = ScoreState::default();
        self.max_health = tuning.max_health;
        self.health = self.max_health;
        self.danger = 0.0;
        self.sats_collected = 0;
        self.last_shot_ms = f64::NEG_INFINITY;
        let drone = self.player.drone.clone();
        self.player = Player::new(drone, &self.viewport);
        self.hazards.clear();
        self.projectiles.clear();
        self.effects.clear();
        self.shake = CameraShake::default();
    }

    /// Swap the drone archetype (unknown ids fall back to the first one)
    pub fn select_drone(&mut self, tuning: &Tuning, id: &str) {
        self.player.drone = tuning.drone(id).clone();
    }

    /// Track a viewport resize and re-seed the starfield
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        super::entities::init_stars(self);
    }

    /// Verify nothing went non-finite during a tick
    pub fn check(&self) -> Result<(), SimError> {
        if !self.player.is_finite() {
            return Err(SimError::NonFinitePlayer);
        }
        if let Some(h) = self.hazards.iter().find(|h| !h.pos.is_finite()) {
            return Err(SimError::NonFiniteHazard { id: h.id });
        }
        Ok(())
    }

    /// Put a world that failed [`World::check`] back into a playable shape
    pub fn repair(&mut self) {
        if !self.player.is_finite() {
            self.player.pos = self.viewport.home();
            self.player.vel = Vec2::ZERO;
            self.player.angle = PLAYER_START_ANGLE;
        }
        self.hazards.retain(|h| h.pos.is_finite() && h.vel.is_finite());
        self.projectiles.retain(|p| p.pos.is_finite() && p.vel.is_finite());
        self.effects.retain(|e| e.pos.is_finite() && e.vel.is_finite());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(7, Viewport::new(800.0, 600.0), &Tuning::default())
    }

    #[test]
    fn test_new_world_boots() {
        let w = world();
        assert_eq!(w.phase, GamePhase::Boot);
        assert_eq!(w.player.drone.id, "cinewhoop");
        assert_eq!(w.stars.len(), STAR_COUNT);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let tuning = Tuning::default();
        let mut w = world();
        w.score.score = 999;
        w.score.combo = 12;
        w.health = 10.0;
        w.wave = 5;
        w.danger = 80.0;
        w.sats_collected = 42;
        w.player.pos = Vec2::new(3.0, 4.0);
        w.player.vel = Vec2::new(50.0, 0.0);
        w.player.angle = 1.0;
        super::super::entities::spawn_hazard(&mut w, &tuning, HazardTier::Large, None);
        w.projectiles.push(Projectile {
            id: 99,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 1.0,
            hue: 0.0,
        });
        w.effects.push(Effect {
            kind: EffectKind::Flash,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 0.1,
            max_life: 0.1,
        });

        w.reset(&tuning);

        assert_eq!(w.score.score, 0);
        assert_eq!(w.score.combo, 0);
        assert_eq!(w.health, tuning.max_health);
        assert_eq!(w.wave, 1);
        assert_eq!(w.danger, 0.0);
        assert_eq!(w.sats_collected, 0);
        assert!(w.hazards.is_empty());
        assert!(w.projectiles.is_empty());
        assert!(w.effects.is_empty());
        assert_eq!(w.player.pos, Vec2::new(400.0, 330.0));
        assert_eq!(w.player.vel, Vec2::ZERO);
        assert_eq!(w.player.angle, -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_select_unknown_drone_uses_default() {
        let tuning = Tuning::default();
        let mut w = world();
        w.select_drone(&tuning, "racer");
        assert_eq!(w.player.drone.id, "racer");
        w.select_drone(&tuning, "x-wing");
        assert_eq!(w.player.drone.id, "cinewhoop");
    }

    #[test]
    fn test_repair_recovers_non_finite_player() {
        let mut w = world();
        w.player.pos.x = f32::NAN;
        assert_eq!(w.check(), Err(SimError::NonFinitePlayer));
        w.repair();
        assert!(w.check().is_ok());
        assert_eq!(w.player.pos, w.viewport.home());
    }

    #[test]
    fn test_shake_decays_to_zero() {
        let mut shake = CameraShake::default();
        shake.trigger(0.2, 12.0);
        assert!((shake.intensity() - 12.0).abs() < 1e-6);
        shake.decay(0.1);
        assert!((shake.intensity() - 6.0).abs() < 1e-4);
        shake.decay(1.0);
        assert_eq!(shake.intensity(), 0.0);
    }
}
