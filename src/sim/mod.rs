//! Simulation module
//!
//! All gameplay logic lives here. This module stays platform-free:
//! - The world is passed explicitly to every stage
//! - Seeded RNG only
//! - Side effects leave as events and declarative UI effects
//! - No rendering, audio or DOM dependencies

pub mod collision;
pub mod combo;
pub mod control;
pub mod entities;
pub mod events;
pub mod phase;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{CollisionReport, circles_overlap};
pub use combo::{ScoreGain, ScoreState, combo_multiplier};
pub use control::{ControlInput, update_player};
pub use entities::{apply_damage, fire_shot, hit_hazard, spawn_hazard, wrap_hazard};
pub use events::{GameEvent, SoundCue};
pub use phase::{Panel, UiEffect};
pub use snapshot::{EntityView, RenderSnapshot};
pub use state::{
    CameraShake, Effect, EffectKind, GamePhase, Hazard, Player, Projectile, SafeInsets, Viewport,
    World,
};
pub use tick::{TickInput, tick};
