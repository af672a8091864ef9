//! Events emitted by the simulation
//!
//! Audio, callouts and UI panels react to these. Nothing here feeds back
//! into the simulation.

use super::state::GamePhase;

/// Fire-and-forget sound cues
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoundCue {
    Shoot,
    Hit,
    GameOver,
    /// Countdown step beep at the given frequency (Hz)
    CountdownBeep(f32),
}

/// Something that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Sound(SoundCue),
    /// Radio chatter shown in the HUD
    Callout(String),
    PhaseChanged { from: GamePhase, to: GamePhase },
    WaveStarted(u32),
    /// Final results of a run
    RunEnded { score: u64, wave: u32, combo: u32 },
}

impl GameEvent {
    pub fn wave_callout(wave: u32) -> Self {
        GameEvent::Callout(format!("Lingo Lingo – Wave {wave}"))
    }

    pub fn combo_callout(combo: u32) -> Self {
        GameEvent::Callout(format!("Lingo Lingo – Combo x{combo}"))
    }
}
