//! Collision detection and response
//!
//! Everything collides as circles. Shots are resolved against hazards first
//! in a single pass that records consumed ids, so neither a shot nor a
//! hazard can take part in two destructive events in the same tick. The
//! drone is checked afterwards against whatever survived.

use std::collections::HashSet;

use glam::Vec2;

use super::entities::{apply_damage, hit_hazard};
use super::events::GameEvent;
use super::state::{Hazard, World};
use crate::tuning::Tuning;

/// Strict overlap test between two circles (touching is not a hit)
#[inline]
pub fn circles_overlap(a: Vec2, a_radius: f32, b: Vec2, b_radius: f32) -> bool {
    a.distance_squared(b) < (a_radius + b_radius) * (a_radius + b_radius)
}

/// What a collision pass destroyed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    /// Hazards destroyed by shots
    pub shot_hits: usize,
    /// Hazards that rammed the drone
    pub player_hits: usize,
}

/// Pair every live shot with every live hazard once and collect the
/// consumed ids of both sides
pub fn find_shot_hits(world: &World) -> (HashSet<u32>, Vec<u32>) {
    let mut consumed_shots = HashSet::new();
    let mut consumed_hazards = HashSet::new();
    let mut order = Vec::new();

    for shot in &world.projectiles {
        for hazard in &world.hazards {
            if consumed_hazards.contains(&hazard.id) {
                continue;
            }
            // Shots are points: only the hazard's radius counts
            if circles_overlap(shot.pos, 0.0, hazard.pos, hazard.radius) {
                consumed_shots.insert(shot.id);
                consumed_hazards.insert(hazard.id);
                order.push(hazard.id);
                break;
            }
        }
    }

    (consumed_shots, order)
}

/// Remove the hazards in `ids`, returning them in the given order
fn take_hazards(world: &mut World, ids: &[u32]) -> Vec<Hazard> {
    let wanted: HashSet<u32> = ids.iter().copied().collect();
    let (taken, kept): (Vec<Hazard>, Vec<Hazard>) = world
        .hazards
        .drain(..)
        .partition(|h| wanted.contains(&h.id));
    world.hazards = kept;

    let mut taken = taken;
    taken.sort_by_key(|h| ids.iter().position(|id| *id == h.id));
    taken
}

/// Resolve this tick's collisions
pub fn resolve(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> CollisionReport {
    let mut report = CollisionReport::default();

    // 1. Shots against hazards
    let (consumed_shots, hit_order) = find_shot_hits(world);
    if !consumed_shots.is_empty() {
        world.projectiles.retain(|p| !consumed_shots.contains(&p.id));
    }
    for hazard in take_hazards(world, &hit_order) {
        hit_hazard(world, tuning, &hazard, events);
        report.shot_hits += 1;
    }

    // 2. Drone against survivors. Split children spawned above are
    // eligible; they appear where the parent was.
    let player_pos = world.player.pos;
    let player_radius = world.player.drone.collision_radius;
    let rammed: Vec<u32> = world
        .hazards
        .iter()
        .filter(|h| circles_overlap(player_pos, player_radius, h.pos, h.radius))
        .map(|h| h.id)
        .collect();
    for hazard in take_hazards(world, &rammed) {
        apply_damage(world, tuning, events);
        hit_hazard(world, tuning, &hazard, events);
        report.player_hits += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::spawn_hazard;
    use crate::sim::state::{Projectile, Viewport};
    use crate::tuning::HazardTier;

    fn setup() -> (World, Tuning) {
        let tuning = Tuning::default();
        let mut world = World::new(3, Viewport::new(800.0, 600.0), &tuning);
        // Park the drone in a corner so only the cases under test collide
        world.player.pos = Vec2::new(30.0, 30.0);
        (world, tuning)
    }

    fn shot_at(world: &mut World, pos: Vec2) -> u32 {
        let id = world.next_entity_id();
        world.projectiles.push(Projectile {
            id,
            pos,
            vel: Vec2::ZERO,
            life: 1.0,
            hue: 0.0,
        });
        id
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 5.0, Vec2::new(9.0, 0.0), 5.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(10.0, 0.0), 5.0));
    }

    #[test]
    fn test_shot_destroys_hazard() {
        let (mut world, tuning) = setup();
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(400.0, 300.0)));
        shot_at(&mut world, Vec2::new(405.0, 300.0));
        let mut events = Vec::new();
        let report = resolve(&mut world, &tuning, &mut events);
        assert_eq!(report.shot_hits, 1);
        assert!(world.projectiles.is_empty());
        assert!(world.hazards.is_empty());
        assert_eq!(world.sats_collected, 1);
    }

    #[test]
    fn test_shot_at_radius_misses() {
        let (mut world, tuning) = setup();
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(400.0, 300.0)));
        shot_at(&mut world, Vec2::new(418.0, 300.0));
        let report = resolve(&mut world, &tuning, &mut Vec::new());
        assert_eq!(report.shot_hits, 0);
        assert_eq!(world.projectiles.len(), 1);
    }

    #[test]
    fn test_two_shots_one_hazard_consumes_one_shot() {
        let (mut world, tuning) = setup();
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(400.0, 300.0)));
        shot_at(&mut world, Vec2::new(401.0, 300.0));
        shot_at(&mut world, Vec2::new(399.0, 300.0));
        let report = resolve(&mut world, &tuning, &mut Vec::new());
        assert_eq!(report.shot_hits, 1);
        assert_eq!(world.projectiles.len(), 1);
        assert_eq!(world.sats_collected, 1);
        assert_eq!(world.score.combo, 1);
    }

    #[test]
    fn test_one_shot_two_hazards_destroys_one() {
        let (mut world, tuning) = setup();
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(400.0, 300.0)));
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(405.0, 300.0)));
        shot_at(&mut world, Vec2::new(402.0, 300.0));
        let report = resolve(&mut world, &tuning, &mut Vec::new());
        assert_eq!(report.shot_hits, 1);
        assert_eq!(world.hazards.len(), 1);
    }

    #[test]
    fn test_split_children_not_hit_by_same_shot() {
        let (mut world, tuning) = setup();
        spawn_hazard(&mut world, &tuning, HazardTier::Large, Some(Vec2::new(400.0, 300.0)));
        shot_at(&mut world, Vec2::new(400.0, 300.0));
        resolve(&mut world, &tuning, &mut Vec::new());
        assert_eq!(world.hazards.len(), 2);
        assert!(world.hazards.iter().all(|h| h.tier == HazardTier::Medium));
    }

    #[test]
    fn test_player_ram_damages_and_removes() {
        let (mut world, tuning) = setup();
        world.score.combo = 4;
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(60.0, 30.0)));
        let mut events = Vec::new();
        let report = resolve(&mut world, &tuning, &mut events);
        assert_eq!(report.player_hits, 1);
        assert!(world.hazards.is_empty());
        assert_eq!(world.health, tuning.max_health - tuning.contact_damage);
        assert_eq!(world.danger, tuning.danger_per_hit);
        // Damage zeroes the streak, then the shared hit path scores once
        assert_eq!(world.score.combo, 1);
    }

    #[test]
    fn test_player_clear_of_hazard() {
        let (mut world, tuning) = setup();
        let reach = 18.0 + world.player.drone.collision_radius;
        spawn_hazard(&mut world, &tuning, HazardTier::Small, Some(Vec2::new(30.0 + reach, 30.0)));
        let report = resolve(&mut world, &tuning, &mut Vec::new());
        assert_eq!(report.player_hits, 0);
        assert_eq!(world.health, tuning.max_health);
    }
}
