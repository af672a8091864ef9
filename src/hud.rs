//! HUD readout
//!
//! Plain values pushed to the page once per frame. Nothing flows back.

use crate::sim::state::World;

#[derive(Debug, Clone, PartialEq)]
pub struct HudReadout {
    pub score: String,
    pub combo: String,
    pub health: f32,
    /// 0-1, drives the health bar width
    pub health_fraction: f32,
    pub wave: String,
    /// 0-100, rounded
    pub danger_percent: u32,
    pub sats: String,
    /// Latest radio callout, if any is showing
    pub callout: Option<String>,
}

impl HudReadout {
    pub fn from_world(world: &World) -> Self {
        let health_fraction = if world.max_health > 0.0 {
            (world.health / world.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            score: world.score.score.to_string(),
            combo: format!("COMBO x{}", world.score.combo),
            health: world.health,
            health_fraction,
            wave: format!("WAVE {}", world.wave),
            danger_percent: world.danger.clamp(0.0, 100.0).round() as u32,
            sats: format!("{} SATS", world.sats_collected),
            callout: None,
        }
    }

    pub fn with_callout(mut self, callout: Option<&str>) -> Self {
        self.callout = callout.map(str::to_string);
        self
    }
}

/// FPS and frame time readout, shown when diagnostics are on
pub fn diagnostics_line(fps: u32, dt: f32) -> String {
    format!("{fps} fps  {:.1} ms", dt * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;
    use crate::tuning::Tuning;

    #[test]
    fn test_readout_formats() {
        let tuning = Tuning::default();
        let mut world = World::new(1, Viewport::new(800.0, 600.0), &tuning);
        world.score.score = 1234;
        world.score.combo = 7;
        world.health = 64.0;
        world.wave = 3;
        world.danger = 41.6;
        world.sats_collected = 5;

        let hud = HudReadout::from_world(&world);
        assert_eq!(hud.score, "1234");
        assert_eq!(hud.combo, "COMBO x7");
        assert!((hud.health_fraction - 0.64).abs() < 1e-6);
        assert_eq!(hud.wave, "WAVE 3");
        assert_eq!(hud.danger_percent, 42);
        assert_eq!(hud.sats, "5 SATS");
        assert!(hud.callout.is_none());
    }

    #[test]
    fn test_diagnostics_line() {
        assert_eq!(diagnostics_line(60, 0.0166), "60 fps  16.6 ms");
    }
}
