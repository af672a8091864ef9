//! Combo multiplier and score accumulation
//!
//! A hit within the combo window of the previous one extends the streak;
//! a later hit restarts it at 1. Damage and long idle spells drop it to 0.

use crate::tuning::Tuning;

/// Score and combo streak of the current run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreState {
    pub score: u64,
    pub combo: u32,
    /// Time of the last combo bump (ms)
    pub last_combo_ms: f64,
}

/// Outcome of a scoring call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreGain {
    pub points: u64,
    pub combo: u32,
    /// Combo reached a callout tier (every Nth step)
    pub callout: bool,
}

impl ScoreState {
    /// Advance the streak for a hit at `now_ms`. Returns true when the new
    /// combo lands on a callout tier.
    pub fn bump_combo(&mut self, now_ms: f64, tuning: &Tuning) -> bool {
        if now_ms - self.last_combo_ms <= tuning.combo_window_ms {
            self.combo = (self.combo + 1).max(1);
        } else {
            self.combo = 1;
        }
        self.last_combo_ms = now_ms;
        tuning.combo_callout_every > 0 && self.combo % tuning.combo_callout_every == 0
    }

    /// Score multiplier for the current combo
    pub fn multiplier(&self, tuning: &Tuning) -> f32 {
        combo_multiplier(self.combo, tuning)
    }

    /// Bump the combo, then award `base` scaled by the new multiplier
    pub fn add_score(&mut self, base: u32, now_ms: f64, tuning: &Tuning) -> ScoreGain {
        let callout = self.bump_combo(now_ms, tuning);
        let points = (base as f32 * self.multiplier(tuning)).round() as u64;
        self.score += points;
        ScoreGain {
            points,
            combo: self.combo,
            callout,
        }
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    /// Drop the streak after too long without a hit
    pub fn decay(&mut self, now_ms: f64, tuning: &Tuning) {
        if now_ms - self.last_combo_ms > tuning.combo_idle_ms {
            self.combo = 0;
        }
    }
}

/// `1 + min(cap, combo * step)`; 5x with the shipped tuning
pub fn combo_multiplier(combo: u32, tuning: &Tuning) -> f32 {
    1.0 + (combo as f32 * tuning.combo_step).min(tuning.combo_bonus_cap)
}
