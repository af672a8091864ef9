//! One simulation step
//!
//! Stages run strictly in order, each reading what the previous one wrote:
//! phase timers, drone, autofire, entity integration, collisions, spawning,
//! the loss check, then combo/danger decay.

use super::collision;
use super::control::{ControlInput, update_player};
use super::entities::{advance, fire_shot, maybe_spawn_hazard};
use super::events::GameEvent;
use super::phase::{self, UiEffect};
use super::state::{GamePhase, World};
use crate::error::SimError;
use crate::tuning::Tuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub control: ControlInput,
}

/// Advance the world by `dt` seconds.
///
/// Events land in `events`; UI effects from any phase change this tick are
/// returned. An error means the world was left in a bad state and should
/// be repaired before the next tick.
pub fn tick(
    world: &mut World,
    tuning: &Tuning,
    input: &TickInput,
    dt: f32,
    events: &mut Vec<GameEvent>,
) -> Result<Vec<UiEffect>, SimError> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(SimError::InvalidDelta(dt));
    }

    let mut effects = phase::advance(world, tuning, dt, events);

    if !world.phase.is_flying() {
        return Ok(effects);
    }

    world.elapsed_ms += dt as f64 * 1000.0;
    let now = world.elapsed_ms;

    update_player(world, tuning, &input.control, dt);
    fire_shot(world, tuning, events);
    advance(world, dt);
    collision::resolve(world, tuning, events);
    if world.phase == GamePhase::Playing {
        maybe_spawn_hazard(world, tuning, dt);
    }

    // Loss is judged before decay so a full danger meter ends the run
    effects.extend(phase::check_loss(world, tuning, events));

    world.score.decay(now, tuning);
    world.danger = (world.danger - tuning.danger_decay * dt).max(0.0);

    world.check()?;
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::spawn_hazard;
    use crate::sim::events::SoundCue;
    use crate::sim::state::Viewport;
    use crate::tuning::HazardTier;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn playing() -> (World, Tuning) {
        let tuning = Tuning::default();
        let mut world = World::new(99, Viewport::new(800.0, 600.0), &tuning);
        world.phase = GamePhase::Playing;
        (world, tuning)
    }

    #[test]
    fn test_rejects_bad_delta() {
        let (mut world, tuning) = playing();
        let input = TickInput::default();
        let mut events = Vec::new();
        assert_eq!(
            tick(&mut world, &tuning, &input, -0.1, &mut events),
            Err(SimError::InvalidDelta(-0.1))
        );
        assert!(tick(&mut world, &tuning, &input, f32::NAN, &mut events).is_err());
    }

    #[test]
    fn test_idle_phases_do_not_move_anything() {
        let tuning = Tuning::default();
        let mut world = World::new(99, Viewport::new(800.0, 600.0), &tuning);
        world.phase = GamePhase::Start;
        spawn_hazard(&mut world, &tuning, HazardTier::Large, Some(Vec2::new(100.0, 100.0)));
        let input = TickInput {
            control: ControlInput::new(Vec2::new(1.0, 0.0)),
        };
        tick(&mut world, &tuning, &input, DT, &mut Vec::new()).unwrap();
        assert_eq!(world.hazards[0].pos, Vec2::new(100.0, 100.0));
        assert_eq!(world.player.vel, Vec2::ZERO);
        assert_eq!(world.elapsed_ms, 0.0);
    }

    #[test]
    fn test_autofire_while_playing() {
        let (mut world, tuning) = playing();
        let mut events = Vec::new();
        for _ in 0..60 {
            tick(&mut world, &tuning, &TickInput::default(), DT, &mut events).unwrap();
        }
        let shots = events
            .iter()
            .filter(|e| **e == GameEvent::Sound(SoundCue::Shoot))
            .count();
        // One second of autofire at a 220 ms cooldown
        assert!((4..=5).contains(&shots), "fired {shots} shots");
    }

    #[test]
    fn test_danger_decays() {
        let (mut world, mut tuning) = playing();
        tuning.spawn_rate = 0.0;
        world.danger = 50.0;
        tick(&mut world, &tuning, &TickInput::default(), 0.5, &mut Vec::new()).unwrap();
        assert!((world.danger - 47.0).abs() < 1e-4);
    }

    #[test]
    fn test_combo_idles_out() {
        let (mut world, mut tuning) = playing();
        tuning.spawn_rate = 0.0;
        world.score.combo = 3;
        world.score.last_combo_ms = 0.0;
        for _ in 0..90 {
            tick(&mut world, &tuning, &TickInput::default(), DT, &mut Vec::new()).unwrap();
        }
        assert_eq!(world.score.combo, 0);
    }

    #[test]
    fn test_ramming_until_game_over() {
        let (mut world, tuning) = playing();
        let mut events = Vec::new();
        let mut ended = false;
        for _ in 0..20 {
            let pos = world.player.pos;
            spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(pos));
            tick(&mut world, &tuning, &TickInput::default(), DT, &mut events).unwrap();
            if world.phase == GamePhase::GameOver {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RunEnded { .. })));
        assert!(world.health <= 0.0 || world.danger >= tuning.danger_max);
    }

    #[test]
    fn test_full_danger_meter_ends_run() {
        let (mut world, mut tuning) = playing();
        tuning.spawn_rate = 0.0;
        tuning.max_health = 1e6;
        world.max_health = tuning.max_health;
        world.health = tuning.max_health;
        let mut events = Vec::new();
        for _ in 0..20 {
            let pos = world.player.pos;
            spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(pos));
            tick(&mut world, &tuning, &TickInput::default(), DT, &mut events).unwrap();
            if world.phase == GamePhase::GameOver {
                break;
            }
        }
        assert_eq!(world.phase, GamePhase::GameOver);
        assert!(world.health > 0.0);
        assert!(events.iter().any(|e| matches!(e, GameEvent::RunEnded { .. })));
    }

    #[test]
    fn test_non_finite_player_is_reported() {
        let (mut world, tuning) = playing();
        world.player.vel = Vec2::new(f32::INFINITY, 0.0);
        let result = tick(&mut world, &tuning, &TickInput::default(), DT, &mut Vec::new());
        assert!(result.is_err());
        world.repair();
        assert!(world.check().is_ok());
    }

    #[test]
    fn test_full_run_from_start() {
        let tuning = Tuning::default();
        let mut world = World::new(2024, Viewport::new(800.0, 600.0), &tuning);
        let mut events = Vec::new();
        phase::boot(&mut world, &mut events);
        phase::start_run(&mut world, &tuning, &mut events);

        let input = TickInput {
            control: ControlInput::new(Vec2::new(0.3, -0.2)),
        };
        for _ in 0..600 {
            tick(&mut world, &tuning, &input, DT, &mut events).unwrap();
        }
        assert!(world.phase.is_flying() || world.phase == GamePhase::GameOver);
        assert!(events.contains(&GameEvent::WaveStarted(1)));
        assert!(world.elapsed_ms > 0.0);
    }
}
