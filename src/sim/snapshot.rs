//! Read-only view of the world for renderers
//!
//! Built once per frame after the tick. Entities are flattened into one
//! tagged list so a renderer can dispatch on the kind without knowing the
//! world's layout.

use glam::Vec2;

use super::state::{EffectKind, GamePhase, OutlinePoint, World};
use crate::tuning::HazardTier;

/// Drone pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
}

/// One drawable entity, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum EntityView {
    Hazard {
        pos: Vec2,
        radius: f32,
        angle: f32,
        tier: HazardTier,
        outline: Vec<OutlinePoint>,
    },
    Projectile {
        pos: Vec2,
        vel: Vec2,
        hue: f32,
    },
    Effect {
        kind: EffectKind,
        pos: Vec2,
        /// 1 when fresh, 0 when about to vanish
        fade: f32,
    },
}

/// Background star
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarView {
    pub pos: Vec2,
    pub size: f32,
}

/// Countdown overlay contents
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownView {
    pub text: String,
    pub progress: f32,
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub width: f32,
    pub height: f32,
    pub player: PlayerView,
    /// Hazards, then projectiles, then effects (draw order)
    pub entities: Vec<EntityView>,
    pub stars: Vec<StarView>,
    /// Camera offset amplitude in pixels
    pub shake: f32,
    pub countdown: Option<CountdownView>,
}

impl RenderSnapshot {
    pub fn capture(world: &World) -> Self {
        let mut entities =
            Vec::with_capacity(world.hazards.len() + world.projectiles.len() + world.effects.len());

        entities.extend(world.hazards.iter().map(|h| EntityView::Hazard {
            pos: h.pos,
            radius: h.radius,
            angle: h.angle,
            tier: h.tier,
            outline: h.outline.clone(),
        }));
        entities.extend(world.projectiles.iter().map(|p| EntityView::Projectile {
            pos: p.pos,
            vel: p.vel,
            hue: p.hue,
        }));
        entities.extend(world.effects.iter().map(|e| EntityView::Effect {
            kind: e.kind.clone(),
            pos: e.pos,
            fade: e.fade(),
        }));

        let countdown = (world.phase == GamePhase::Countdown).then(|| CountdownView {
            text: world.countdown.text.clone(),
            progress: world.countdown.progress(),
        });

        Self {
            phase: world.phase,
            width: world.viewport.width,
            height: world.viewport.height,
            player: PlayerView {
                pos: world.player.pos,
                angle: world.player.angle,
                radius: world.player.drone.collision_radius,
            },
            entities,
            stars: world
                .stars
                .iter()
                .map(|s| StarView {
                    pos: s.pos,
                    size: s.size,
                })
                .collect(),
            shake: world.shake.intensity(),
            countdown,
        }
    }

    /// Whether the drone should be drawn at all
    pub fn shows_player(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Countdown | GamePhase::Ready | GamePhase::Playing
        )
    }
}
