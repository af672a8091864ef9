//! Player controller: stick input to drone kinematics
//!
//! Velocity eases toward the shaped stick vector with a smoothing factor
//! derived from the drone's acceleration, so handling feels the same at
//! any frame rate.

use glam::Vec2;

use super::state::{GamePhase, World};
use crate::consts::REFERENCE_FPS;
use crate::tuning::Tuning;
use crate::{clamp_to_unit, response_curve};

/// Normalized direction from whichever input adapter is active
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlInput {
    /// Desired direction, anywhere in the unit disc
    pub direction: Vec2,
    /// Whether the player is steering at all this frame
    pub active: bool,
}

impl ControlInput {
    pub fn new(direction: Vec2) -> Self {
        Self {
            direction,
            active: direction != Vec2::ZERO,
        }
    }

    pub fn idle() -> Self {
        Self::default()
    }
}

/// `1 - (1 - rate)^(dt * 60)`: the fraction of the gap closed this tick
#[inline]
pub fn blend_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (1.0 - rate.clamp(0.0, 1.0)).powf(dt * REFERENCE_FPS)
}

/// Fly the drone for one tick
pub fn update_player(world: &mut World, tuning: &Tuning, input: &ControlInput, dt: f32) {
    let coarse = world.viewport.coarse_pointer;
    let drone = &world.player.drone;

    let accel_boost = if coarse { tuning.coarse_accel_multiplier } else { 1.0 };
    let speed_boost = if coarse { tuning.coarse_speed_multiplier } else { 1.0 };
    let accel = (drone.accel * accel_boost * tuning.accel_scale).clamp(0.0, 1.0);
    let max_speed = drone.max_speed * tuning.drone_speed_scale * speed_boost;

    let player = &mut world.player;
    if input.active {
        let shaped = response_curve(clamp_to_unit(input.direction), tuning.stick_curve);
        let desired = shaped * max_speed;
        player.vel = player.vel.lerp(desired, blend_factor(accel, dt));
    } else {
        player.vel *= tuning.stick_friction.powf(dt * REFERENCE_FPS);
    }

    player.pos += player.vel * dt;

    let insets = world.viewport.insets;
    let pad = tuning.edge_padding;
    let min = Vec2::new(pad + insets.left, pad + insets.top);
    let max = Vec2::new(
        world.viewport.width - pad - insets.right,
        world.viewport.height - pad - insets.bottom,
    );
    // Tiny viewports can invert the box; pin to its centre rather than panic
    if min.x <= max.x && min.y <= max.y {
        player.pos = player.pos.clamp(min, max);
    } else {
        player.pos = (min + max) * 0.5;
    }

    if player.vel.length() > tuning.facing_speed {
        player.angle = player.vel.y.atan2(player.vel.x);
    } else if world.phase == GamePhase::Ready {
        let to_home = world.viewport.home() - player.pos;
        if to_home != Vec2::ZERO {
            player.angle = to_home.y.atan2(to_home.x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{SafeInsets, Viewport};
    use proptest::prelude::*;

    fn setup() -> (World, Tuning) {
        let tuning = Tuning::default();
        let mut world = World::new(1, Viewport::new(800.0, 600.0), &tuning);
        world.phase = GamePhase::Playing;
        (world, tuning)
    }

    #[test]
    fn test_blend_factor_endpoints() {
        assert_eq!(blend_factor(0.0, 0.016), 0.0);
        assert_eq!(blend_factor(1.0, 0.016), 1.0);
        // One reference frame closes exactly `rate` of the gap
        assert!((blend_factor(0.3, 1.0 / 60.0) - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_full_stick_reaches_max_speed() {
        let (mut world, tuning) = setup();
        let input = ControlInput::new(Vec2::new(1.0, 0.0));
        for _ in 0..240 {
            update_player(&mut world, &tuning, &input, 1.0 / 60.0);
            world.player.pos = world.viewport.home();
        }
        let max = world.player.drone.max_speed * tuning.drone_speed_scale;
        assert!((world.player.vel.x - max).abs() < 0.5);
        assert!(world.player.vel.y.abs() < 1e-3);
        assert!(world.player.angle.abs() < 1e-3);
    }

    #[test]
    fn test_coarse_pointer_is_faster() {
        let (mut fine, tuning) = setup();
        let (mut coarse, _) = setup();
        coarse.viewport.coarse_pointer = true;
        let input = ControlInput::new(Vec2::new(0.0, 1.0));
        for _ in 0..10 {
            update_player(&mut fine, &tuning, &input, 1.0 / 60.0);
            update_player(&mut coarse, &tuning, &input, 1.0 / 60.0);
        }
        assert!(coarse.player.vel.y > fine.player.vel.y);
    }

    #[test]
    fn test_friction_when_idle() {
        let (mut world, tuning) = setup();
        world.player.vel = Vec2::new(100.0, 0.0);
        update_player(&mut world, &tuning, &ControlInput::idle(), 1.0 / 60.0);
        assert!((world.player.vel.x - 94.0).abs() < 1e-3);
    }

    #[test]
    fn test_clamped_to_padding_and_insets() {
        let (mut world, tuning) = setup();
        world.viewport.insets = SafeInsets {
            top: 40.0,
            right: 0.0,
            bottom: 0.0,
            left: 10.0,
        };
        world.player.pos = Vec2::new(-500.0, -500.0);
        update_player(&mut world, &tuning, &ControlInput::idle(), 0.016);
        assert_eq!(world.player.pos, Vec2::new(36.0, 66.0));

        world.player.pos = Vec2::new(5_000.0, 5_000.0);
        update_player(&mut world, &tuning, &ControlInput::idle(), 0.016);
        assert_eq!(world.player.pos, Vec2::new(774.0, 574.0));
    }

    #[test]
    fn test_ready_faces_home() {
        let (mut world, tuning) = setup();
        world.phase = GamePhase::Ready;
        // Insets do not move the point the drone faces
        world.viewport.insets.top = 100.0;
        world.player.pos = world.viewport.home() + Vec2::new(-100.0, 0.0);
        world.player.angle = 2.0;
        update_player(&mut world, &tuning, &ControlInput::idle(), 0.016);
        assert!(world.player.angle.abs() < 1e-4);
    }

    #[test]
    fn test_idle_angle_persists_outside_ready() {
        let (mut world, tuning) = setup();
        world.player.pos = world.viewport.home() + Vec2::new(-100.0, 0.0);
        world.player.angle = 2.0;
        update_player(&mut world, &tuning, &ControlInput::idle(), 0.016);
        assert_eq!(world.player.angle, 2.0);
    }

    proptest! {
        #[test]
        fn player_stays_in_bounds(x in -1.0f32..1.0, y in -1.0f32..1.0, steps in 1usize..300) {
            let (mut world, tuning) = setup();
            let input = ControlInput::new(Vec2::new(x, y));
            for _ in 0..steps {
                update_player(&mut world, &tuning, &input, 0.033);
            }
            let p = world.player.pos;
            prop_assert!(p.x >= 26.0 && p.x <= 774.0);
            prop_assert!(p.y >= 26.0 && p.y <= 574.0);
        }
    }
}
