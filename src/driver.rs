//! Frame driver around the simulation
//!
//! Turns display-frame timestamps into clamped deltas, runs one tick per
//! frame, and is the error boundary: a failed tick is logged and the world
//! repaired so the next frame runs normally.

use crate::consts::MAX_FRAME_DT;
use crate::sim::phase::{self, UiEffect};
use crate::sim::snapshot::RenderSnapshot;
use crate::sim::state::{GamePhase, Viewport, World};
use crate::sim::tick::{TickInput, tick};
use crate::sim::{GameEvent, entities};
use crate::tuning::Tuning;

/// Delta-time source fed by display-frame timestamps (ms)
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous timestamp, clamped to [0, MAX_FRAME_DT].
    /// The first call (and any backwards jump) yields 0.
    pub fn delta(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) if now_ms.is_finite() => ((now_ms - last) / 1000.0) as f32,
            _ => 0.0,
        };
        if now_ms.is_finite() {
            self.last_ms = Some(now_ms);
        }
        dt.clamp(0.0, MAX_FRAME_DT)
    }

    /// Forget the last timestamp (e.g. after the tab was hidden)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Rolling frames-per-second estimate for the diagnostics readout
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; 60],
    index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            frame_times: [0.0; 60],
            index: 0,
            fps: 0,
        }
    }
}

impl FpsCounter {
    pub fn record(&mut self, now_ms: f64) -> u32 {
        self.frame_times[self.index] = now_ms;
        self.index = (self.index + 1) % self.frame_times.len();

        // Oldest sample sits at the next write slot
        let oldest = self.frame_times[self.index];
        if oldest > 0.0 {
            let elapsed = now_ms - oldest;
            if elapsed > 0.0 {
                self.fps = ((self.frame_times.len() - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// What one frame produced
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub dt: f32,
    pub events: Vec<GameEvent>,
    pub ui: Vec<UiEffect>,
    /// The tick failed and the world was repaired
    pub recovered: bool,
}

/// A running game session
#[derive(Debug, Clone)]
pub struct Simulation {
    pub world: World,
    pub tuning: Tuning,
    clock: FrameClock,
}

impl Simulation {
    pub fn new(seed: u64, viewport: Viewport, tuning: Tuning) -> Self {
        Self {
            world: World::new(seed, viewport, &tuning),
            tuning,
            clock: FrameClock::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.world.phase
    }

    /// Run one display frame at `timestamp_ms`
    pub fn frame(&mut self, timestamp_ms: f64, input: &TickInput) -> FrameOutput {
        let dt = self.clock.delta(timestamp_ms);
        self.step(dt, input)
    }

    /// Run one frame with an explicit delta (headless and tests)
    pub fn step(&mut self, dt: f32, input: &TickInput) -> FrameOutput {
        let mut out = FrameOutput {
            dt,
            ..Default::default()
        };

        if self.world.phase != GamePhase::Countdown {
            entities::update_stars(&mut self.world, dt);
        }
        self.world.shake.decay(dt);

        let before = self.world.phase;
        match tick(&mut self.world, &self.tuning, input, dt, &mut out.events) {
            Ok(ui) => out.ui = ui,
            Err(e) => {
                log::error!("Frame error: {}", e);
                self.world.repair();
                out.recovered = true;
                // The failed tick may still have changed phase
                if self.world.phase != before {
                    out.ui = phase::ui_effects(self.world.phase);
                }
            }
        }
        out
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.world)
    }

    pub fn boot(&mut self) -> FrameOutput {
        self.lifecycle(|world, _, events| phase::boot(world, events))
    }

    pub fn choose_drone(&mut self, id: &str) -> FrameOutput {
        self.lifecycle(|world, tuning, events| phase::choose_drone(world, tuning, id, events))
    }

    pub fn start_run(&mut self) -> FrameOutput {
        self.lifecycle(phase::start_run)
    }

    pub fn restart(&mut self) -> FrameOutput {
        self.lifecycle(phase::restart)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.world.resize(viewport);
    }

    /// Replace the tuning table (e.g. after settings change)
    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
    }

    fn lifecycle(
        &mut self,
        f: impl FnOnce(&mut World, &Tuning, &mut Vec<GameEvent>) -> Vec<UiEffect>,
    ) -> FrameOutput {
        let mut events = Vec::new();
        let ui = f(&mut self.world, &self.tuning, &mut events);
        FrameOutput {
            events,
            ui,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::control::ControlInput;
    use crate::sim::entities::spawn_hazard;
    use crate::sim::{Panel, SoundCue};
    use crate::tuning::HazardTier;
    use glam::Vec2;

    fn sim() -> Simulation {
        Simulation::new(17, Viewport::new(800.0, 600.0), Tuning::default())
    }

    #[test]
    fn test_clock_clamps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(1_000.0), 0.0);
        assert!((clock.delta(1_016.0) - 0.016).abs() < 1e-6);
        // A long stall (tab hidden) is clamped
        assert_eq!(clock.delta(5_000.0), MAX_FRAME_DT);
        // Time going backwards yields zero
        assert_eq!(clock.delta(4_000.0), 0.0);
    }

    #[test]
    fn test_clock_reset() {
        let mut clock = FrameClock::new();
        clock.delta(100.0);
        clock.reset();
        assert_eq!(clock.delta(9_000.0), 0.0);
    }

    #[test]
    fn test_fps_counter() {
        let mut fps = FpsCounter::default();
        for i in 1..=120 {
            fps.record(i as f64 * 1000.0 / 60.0);
        }
        assert_eq!(fps.fps(), 60);
    }

    #[test]
    fn test_lifecycle_through_countdown() {
        let mut sim = sim();
        let out = sim.boot();
        assert_eq!(sim.phase(), GamePhase::Start);
        assert!(!out.ui.is_empty());

        sim.choose_drone("racer");
        let out = sim.start_run();
        assert_eq!(sim.phase(), GamePhase::Countdown);
        assert_eq!(sim.world.player.drone.id, "racer");
        assert!(out.events.contains(&GameEvent::Sound(SoundCue::CountdownBeep(520.0))));

        let idle = TickInput::default();
        let mut t = 0.0;
        while sim.phase() == GamePhase::Countdown {
            t += 16.0;
            sim.frame(t, &idle);
            assert!(t < 10_000.0);
        }
        assert_eq!(sim.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_stars_frozen_during_countdown() {
        let mut sim = sim();
        sim.boot();
        sim.start_run();
        let before: Vec<Vec2> = sim.world.stars.iter().map(|s| s.pos).collect();
        sim.step(0.016, &TickInput::default());
        let after: Vec<Vec2> = sim.world.stars.iter().map(|s| s.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_bad_frame_is_recovered() {
        let mut sim = sim();
        sim.world.phase = GamePhase::Playing;
        sim.world.player.vel = Vec2::new(f32::INFINITY, 0.0);
        let out = sim.step(0.016, &TickInput::default());
        assert!(out.recovered);
        assert!(sim.world.check().is_ok());

        let input = TickInput {
            control: ControlInput::new(Vec2::new(1.0, 0.0)),
        };
        let out = sim.step(0.016, &input);
        assert!(!out.recovered);
    }

    #[test]
    fn test_recovered_frame_keeps_phase_change() {
        let mut sim = sim();
        sim.world.phase = GamePhase::Playing;
        sim.world.health = 1.0;
        let pos = sim.world.player.pos;
        spawn_hazard(&mut sim.world, &sim.tuning, HazardTier::Small, Some(pos));
        let broken = spawn_hazard(
            &mut sim.world,
            &sim.tuning,
            HazardTier::Large,
            Some(Vec2::new(100.0, 100.0)),
        );
        if let Some(h) = sim.world.hazards.iter_mut().find(|h| h.id == broken) {
            h.vel = Vec2::NAN;
        }

        let out = sim.step(0.016, &TickInput::default());
        assert!(out.recovered);
        assert_eq!(sim.phase(), GamePhase::GameOver);
        assert!(out.ui.contains(&UiEffect::Show(Panel::GameOverScreen)));
        assert!(out.ui.contains(&UiEffect::Hide(Panel::Hud)));
        assert!(out.events.iter().any(|e| matches!(e, GameEvent::RunEnded { .. })));
    }
}
