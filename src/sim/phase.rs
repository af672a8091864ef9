//! Game and wave state machine
//!
//! Transitions never touch the page. Each one returns the [`UiEffect`]s a
//! presentation layer should apply, so a headless run simply drops them.

use super::entities::spawn_hazard;
use super::events::{GameEvent, SoundCue};
use super::state::{Countdown, GamePhase, World};
use crate::tuning::{HazardTier, Tuning};

/// UI surfaces whose visibility follows the game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    StartScreen,
    CountdownOverlay,
    ReadyBanner,
    Hud,
    DangerGauge,
    GameOverScreen,
}

impl Panel {
    pub const ALL: [Panel; 6] = [
        Panel::StartScreen,
        Panel::CountdownOverlay,
        Panel::ReadyBanner,
        Panel::Hud,
        Panel::DangerGauge,
        Panel::GameOverScreen,
    ];

    /// DOM id of the element backing this panel
    pub fn element_id(&self) -> &'static str {
        match self {
            Panel::StartScreen => "start-screen",
            Panel::CountdownOverlay => "countdown",
            Panel::ReadyBanner => "ready-banner",
            Panel::Hud => "hud",
            Panel::DangerGauge => "danger-gauge",
            Panel::GameOverScreen => "gameover-screen",
        }
    }
}

/// Declarative side effect of entering a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEffect {
    Show(Panel),
    Hide(Panel),
}

/// Panels visible in `phase`
pub fn visible_panels(phase: GamePhase) -> &'static [Panel] {
    match phase {
        GamePhase::Boot => &[],
        GamePhase::Start | GamePhase::SelectDrone => &[Panel::StartScreen],
        GamePhase::Countdown => &[Panel::CountdownOverlay, Panel::Hud],
        GamePhase::Ready => &[Panel::ReadyBanner, Panel::Hud, Panel::DangerGauge],
        GamePhase::Playing => &[Panel::Hud, Panel::DangerGauge],
        GamePhase::GameOver => &[Panel::GameOverScreen],
    }
}

/// Full show/hide list for entering `phase`
pub fn ui_effects(phase: GamePhase) -> Vec<UiEffect> {
    let visible = visible_panels(phase);
    Panel::ALL
        .iter()
        .map(|panel| {
            if visible.contains(panel) {
                UiEffect::Show(*panel)
            } else {
                UiEffect::Hide(*panel)
            }
        })
        .collect()
}

/// Enter `next`. Re-entering the current phase is a no-op.
pub fn transition(world: &mut World, next: GamePhase, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    let from = world.phase;
    if from == next {
        return Vec::new();
    }
    log::info!("Phase {} -> {}", from.as_str(), next.as_str());
    world.phase = next;
    events.push(GameEvent::PhaseChanged { from, to: next });
    ui_effects(next)
}

/// Page finished loading
pub fn boot(world: &mut World, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    if world.phase != GamePhase::Boot {
        return Vec::new();
    }
    transition(world, GamePhase::Start, events)
}

/// Pick a drone from the title screen. Ignored mid-run.
pub fn choose_drone(
    world: &mut World,
    tuning: &Tuning,
    id: &str,
    events: &mut Vec<GameEvent>,
) -> Vec<UiEffect> {
    if !matches!(world.phase, GamePhase::Start | GamePhase::SelectDrone) {
        return Vec::new();
    }
    world.select_drone(tuning, id);
    transition(world, GamePhase::SelectDrone, events)
}

/// Reset the world and begin the countdown
pub fn start_run(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    if !matches!(world.phase, GamePhase::Start | GamePhase::SelectDrone) {
        return Vec::new();
    }
    world.reset(tuning);
    for _ in 0..tuning.initial_hazards {
        spawn_hazard(world, tuning, HazardTier::Large, None);
    }
    log::info!("Run started with drone {}", world.player.drone.id);

    let mut effects = transition(world, GamePhase::Countdown, events);
    if !enter_countdown_step(world, tuning, 0, events) {
        effects.extend(start_wave(world, tuning, events));
    }
    effects
}

/// Back to the title screen after a run
pub fn restart(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    if world.phase != GamePhase::GameOver {
        return Vec::new();
    }
    world.reset(tuning);
    transition(world, GamePhase::Start, events)
}

/// Load countdown step `step`. Returns false once the sequence is exhausted.
fn enter_countdown_step(
    world: &mut World,
    tuning: &Tuning,
    step: usize,
    events: &mut Vec<GameEvent>,
) -> bool {
    let Some(entry) = tuning.countdown.get(step) else {
        return false;
    };
    world.countdown = Countdown {
        step,
        remaining_ms: entry.duration_ms,
        step_ms: entry.duration_ms,
        text: entry.text.clone(),
    };
    events.push(GameEvent::Sound(SoundCue::CountdownBeep(entry.beep)));
    true
}

/// Switch to PLAYING and open the current wave
fn start_wave(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    world.wave_timer_ms = 0.0;
    world.countdown = Countdown::default();
    log::info!("Wave {} started", world.wave);
    log::debug!(
        "Wave {}: hazard cap {}, spawn chance {:.3}/s",
        world.wave,
        tuning.hazard_cap(world.wave),
        tuning.spawn_chance(world.wave, 1.0)
    );
    let effects = transition(world, GamePhase::Playing, events);
    events.push(GameEvent::WaveStarted(world.wave));
    events.push(GameEvent::wave_callout(world.wave));
    effects
}

/// Run the phase timers for one tick
pub fn advance(world: &mut World, tuning: &Tuning, dt: f32, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    let dt_ms = dt * 1000.0;
    match world.phase {
        GamePhase::Countdown => {
            world.countdown.remaining_ms -= dt_ms;
            // A long frame may cover more than one step
            while world.countdown.remaining_ms <= 0.0 {
                let overshoot = world.countdown.remaining_ms;
                let next = world.countdown.step + 1;
                if !enter_countdown_step(world, tuning, next, events) {
                    return start_wave(world, tuning, events);
                }
                world.countdown.remaining_ms += overshoot;
            }
            Vec::new()
        }
        GamePhase::Ready => {
            world.ready_timer_ms -= dt_ms;
            if world.ready_timer_ms <= 0.0 {
                return start_wave(world, tuning, events);
            }
            Vec::new()
        }
        GamePhase::Playing => {
            world.wave_timer_ms += dt_ms;
            if world.wave_timer_ms >= tuning.wave_duration_ms {
                world.wave += 1;
                world.wave_timer_ms = 0.0;
                world.ready_timer_ms = tuning.ready_duration_ms;
                return transition(world, GamePhase::Ready, events);
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Whether the run is lost
pub fn is_lost(world: &World, tuning: &Tuning) -> bool {
    world.health <= 0.0 || world.danger >= tuning.danger_max
}

/// End the run if it is lost
pub fn check_loss(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> Vec<UiEffect> {
    if !world.phase.is_flying() || !is_lost(world, tuning) {
        return Vec::new();
    }
    log::info!(
        "Game over: score {}, wave {}, combo {}",
        world.score.score,
        world.wave,
        world.score.combo
    );
    let effects = transition(world, GamePhase::GameOver, events);
    events.push(GameEvent::Sound(SoundCue::GameOver));
    events.push(GameEvent::RunEnded {
        score: world.score.score,
        wave: world.wave,
        combo: world.score.combo,
    });
    effects
}
