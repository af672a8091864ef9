//! Entity spawning, integration and expiry
//!
//! Hazards wrap around the play-field; shots and effects expire. The hit
//! and damage paths shared by every collision type also live here.

use glam::Vec2;
use rand::Rng;

use super::events::{GameEvent, SoundCue};
use super::state::{Effect, EffectKind, Hazard, OutlinePoint, Projectile, Star, World};
use crate::consts::*;
use crate::tuning::{HazardTier, Tuning};
use crate::{normalize_angle, polar_to_cartesian};

/// Glyphs flung out of destroyed hazards (weighted toward the coin)
const BURST_GLYPHS: [char; 4] = ['₿', '₿', '₿', '🟠'];
/// Debris particles per hit
const HIT_PARTICLES: usize = 12;
const HIT_PARTICLE_SPEED: f32 = 120.0;
const HIT_PARTICLE_LIFE: f32 = 0.8;
const FLASH_LIFE: f32 = 0.15;
const POPUP_LIFE: f32 = 0.8;

/// Spawn a hazard of `tier`.
///
/// With no `position` the hazard appears just outside a random viewport
/// edge. Returns the new hazard's id.
pub fn spawn_hazard(
    world: &mut World,
    tuning: &Tuning,
    tier: HazardTier,
    position: Option<Vec2>,
) -> u32 {
    let stats = tuning.tiers.get(tier);
    let margin = stats.radius + WRAP_MARGIN;
    let (w, h) = (world.viewport.width, world.viewport.height);

    let pos = match position {
        Some(p) => p,
        None => match world.rng.random_range(0..4) {
            0 => Vec2::new(world.rng.random::<f32>() * w, -margin),
            1 => Vec2::new(w + margin, world.rng.random::<f32>() * h),
            2 => Vec2::new(world.rng.random::<f32>() * w, h + margin),
            _ => Vec2::new(-margin, world.rng.random::<f32>() * h),
        },
    };

    let heading = world.rng.random::<f32>() * std::f32::consts::TAU;
    let speed = stats.speed
        + world.wave as f32 * tuning.wave_speed_bonus
        + world.rng.random::<f32>() * tuning.speed_jitter;
    let spin = (world.rng.random::<f32>() - 0.5) * 1.4;

    // 7-10 vertices, each at 70-120% of the nominal radius
    let point_count = 7 + world.rng.random_range(0..4);
    let outline = (0..point_count)
        .map(|i| OutlinePoint {
            angle: std::f32::consts::TAU * i as f32 / point_count as f32,
            radius: stats.radius * (0.7 + world.rng.random::<f32>() * 0.5),
        })
        .collect();

    let id = world.next_entity_id();
    let angle = world.rng.random::<f32>() * std::f32::consts::TAU;
    world.hazards.push(Hazard {
        id,
        tier,
        pos,
        vel: polar_to_cartesian(speed, heading),
        radius: stats.radius,
        angle,
        spin,
        outline,
    });
    id
}

/// Spawn a large hazard with probability scaled by wave and `dt`,
/// unless the wave's population cap is reached
pub fn maybe_spawn_hazard(world: &mut World, tuning: &Tuning, dt: f32) -> bool {
    if world.hazards.len() >= tuning.hazard_cap(world.wave) {
        return false;
    }
    if world.rng.random::<f32>() < tuning.spawn_chance(world.wave, dt) {
        spawn_hazard(world, tuning, HazardTier::Large, None);
        return true;
    }
    false
}

/// Re-enter a hazard from the opposite edge once it is fully off-screen
pub fn wrap_hazard(hazard: &mut Hazard, width: f32, height: f32) {
    let margin = hazard.radius + WRAP_MARGIN;
    if hazard.pos.x < -margin {
        hazard.pos.x = width + margin;
    }
    if hazard.pos.x > width + margin {
        hazard.pos.x = -margin;
    }
    if hazard.pos.y < -margin {
        hazard.pos.y = height + margin;
    }
    if hazard.pos.y > height + margin {
        hazard.pos.y = -margin;
    }
}

/// Fire along the drone's facing if the cooldown has elapsed
pub fn fire_shot(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) -> bool {
    let now = world.elapsed_ms;
    if now - world.last_shot_ms < tuning.fire_rate_ms as f64 {
        return false;
    }
    let angle = world.player.angle;
    let boost = if world.viewport.coarse_pointer {
        tuning.coarse_bullet_multiplier
    } else {
        1.0
    };
    let offset = world.player.drone.collision_radius + MUZZLE_OFFSET;
    let id = world.next_entity_id();
    let hue = world.rng.random::<f32>() * 40.0;
    world.projectiles.push(Projectile {
        id,
        pos: world.player.pos + polar_to_cartesian(offset, angle),
        vel: polar_to_cartesian(tuning.bullet_speed * boost, angle),
        life: tuning.shot_life,
        hue,
    });
    world.last_shot_ms = now;
    events.push(GameEvent::Sound(SoundCue::Shoot));
    true
}

/// Add a cosmetic effect unless the effect budget is spent
fn push_effect(world: &mut World, tuning: &Tuning, effect: Effect) {
    if world.effects.len() < tuning.max_effects {
        world.effects.push(effect);
    }
}

fn spawn_glyph_burst(world: &mut World, tuning: &Tuning, pos: Vec2) {
    let count = 8 + world.rng.random_range(0..7);
    for _ in 0..count {
        let heading = world.rng.random::<f32>() * std::f32::consts::TAU;
        let speed = 120.0 + world.rng.random::<f32>() * 160.0;
        let life = 0.35 + world.rng.random::<f32>() * 0.25;
        let spin = (world.rng.random::<f32>() - 0.5) * 2.2;
        let glyph = BURST_GLYPHS[world.rng.random_range(0..BURST_GLYPHS.len())];
        push_effect(
            world,
            tuning,
            Effect {
                kind: EffectKind::Glyph { glyph, spin },
                pos,
                vel: polar_to_cartesian(speed, heading),
                life,
                max_life: life,
            },
        );
    }
}

/// Shared hit path: effects, shake, score and split.
///
/// `hazard` has already been removed from the world by the caller.
pub fn hit_hazard(
    world: &mut World,
    tuning: &Tuning,
    hazard: &Hazard,
    events: &mut Vec<GameEvent>,
) {
    let stats = tuning.tiers.get(hazard.tier);

    push_effect(
        world,
        tuning,
        Effect {
            kind: EffectKind::Flash,
            pos: hazard.pos,
            vel: Vec2::ZERO,
            life: FLASH_LIFE,
            max_life: FLASH_LIFE,
        },
    );
    spawn_glyph_burst(world, tuning, hazard.pos);
    events.push(GameEvent::Sound(SoundCue::Hit));

    let (duration, magnitude) = stats.shake;
    world.shake.trigger(duration, magnitude * tuning.shake_scale);

    let gain = world.score.add_score(stats.score, world.elapsed_ms, tuning);
    if gain.callout {
        events.push(GameEvent::combo_callout(gain.combo));
    }

    let split = tuning.split_of(hazard.tier);
    push_effect(
        world,
        tuning,
        Effect {
            kind: EffectKind::Popup {
                text: if split.is_some() { "SPLIT" } else { "+SATS" },
            },
            pos: hazard.pos,
            vel: Vec2::ZERO,
            life: POPUP_LIFE,
            max_life: POPUP_LIFE,
        },
    );

    match split {
        Some(child) => {
            for _ in 0..2 {
                let jitter = Vec2::new(
                    (world.rng.random::<f32>() - 0.5) * tuning.split_jitter,
                    (world.rng.random::<f32>() - 0.5) * tuning.split_jitter,
                );
                spawn_hazard(world, tuning, child, Some(hazard.pos + jitter));
            }
        }
        None => world.sats_collected += 1,
    }

    for _ in 0..HIT_PARTICLES {
        let vel = Vec2::new(
            (world.rng.random::<f32>() - 0.5) * HIT_PARTICLE_SPEED,
            (world.rng.random::<f32>() - 0.5) * HIT_PARTICLE_SPEED,
        );
        push_effect(
            world,
            tuning,
            Effect {
                kind: EffectKind::Particle,
                pos: hazard.pos,
                vel,
                life: HIT_PARTICLE_LIFE,
                max_life: HIT_PARTICLE_LIFE,
            },
        );
    }
}

/// Damage path for the drone running into something
pub fn apply_damage(world: &mut World, tuning: &Tuning, events: &mut Vec<GameEvent>) {
    world.health = (world.health - tuning.contact_damage).max(0.0);
    world.danger = (world.danger + tuning.danger_per_hit).min(tuning.danger_max);
    world.score.reset_combo();
    let (duration, magnitude) = tuning.damage_shake;
    world.shake.trigger(duration, magnitude * tuning.shake_scale);
    events.push(GameEvent::Sound(SoundCue::Hit));
}

/// Integrate every dynamic entity by `dt`, then drop what expired
pub fn advance(world: &mut World, dt: f32) {
    let (w, h) = (world.viewport.width, world.viewport.height);

    for shot in &mut world.projectiles {
        shot.pos += shot.vel * dt;
        shot.life -= dt;
    }
    world.projectiles.retain(|shot| {
        shot.life > 0.0
            && shot.pos.x > -SHOT_CULL_MARGIN
            && shot.pos.x < w + SHOT_CULL_MARGIN
            && shot.pos.y > -SHOT_CULL_MARGIN
            && shot.pos.y < h + SHOT_CULL_MARGIN
    });

    for hazard in &mut world.hazards {
        hazard.pos += hazard.vel * dt;
        hazard.angle = normalize_angle(hazard.angle + hazard.spin * dt);
        wrap_hazard(hazard, w, h);
    }

    for effect in &mut world.effects {
        effect.pos += effect.vel * dt;
        effect.life -= dt;
    }
    world.effects.retain(|e| e.life > 0.0);
}

/// Scatter the background starfield over the viewport
pub fn init_stars(world: &mut World) {
    let (w, h) = (world.viewport.width, world.viewport.height);
    world.stars = (0..STAR_COUNT)
        .map(|_| Star {
            pos: Vec2::new(world.rng.random::<f32>() * w, world.rng.random::<f32>() * h),
            size: world.rng.random::<f32>() * 1.6 + 0.4,
            speed: world.rng.random::<f32>() * 8.0 + 4.0,
            drift: (world.rng.random::<f32>() - 0.5) * 3.0,
        })
        .collect();
}

/// Drift stars downward, recycling them at the edges
pub fn update_stars(world: &mut World, dt: f32) {
    let (w, h) = (world.viewport.width, world.viewport.height);
    for i in 0..world.stars.len() {
        let mut star = world.stars[i];
        star.pos.y += star.speed * dt;
        star.pos.x += star.drift * dt;
        if star.pos.y > h + STAR_WRAP {
            star.pos.y = -STAR_WRAP;
            star.pos.x = world.rng.random::<f32>() * w;
        }
        if star.pos.x < -STAR_WRAP {
            star.pos.x = w + STAR_WRAP;
        }
        if star.pos.x > w + STAR_WRAP {
            star.pos.x = -STAR_WRAP;
        }
        world.stars[i] = star;
    }
}
