//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input adapters (virtual stick, keyboard) producing a unit-disc vector
//! - Wall-clock time and timestamps
//! - Device traits (coarse pointer, safe-area insets)

use glam::Vec2;

use crate::consts::STICK_RADIUS;
use crate::sim::control::ControlInput;
#[cfg(target_arch = "wasm32")]
use crate::sim::state::SafeInsets;

/// Floating touch stick: the first contact sets the centre, dragging
/// deflects it up to [`STICK_RADIUS`] pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VirtualStick {
    pub active: bool,
    pub center: Vec2,
    /// Knob offset from the centre, already clamped to the stick radius
    pub offset: Vec2,
}

impl VirtualStick {
    pub fn begin(&mut self, pos: Vec2) {
        self.active = true;
        self.center = pos;
        self.offset = Vec2::ZERO;
    }

    pub fn move_to(&mut self, pos: Vec2) {
        if !self.active {
            return;
        }
        self.offset = (pos - self.center).clamp_length_max(STICK_RADIUS);
    }

    pub fn end(&mut self) {
        self.active = false;
        self.offset = Vec2::ZERO;
    }

    /// Deflection in the unit disc
    pub fn vector(&self) -> Vec2 {
        self.offset / STICK_RADIUS
    }

    pub fn knob(&self) -> Vec2 {
        self.center + self.offset
    }
}

/// Held direction keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardAxes {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyboardAxes {
    /// Track a key by its `KeyboardEvent.code`. Returns false for keys that
    /// do not steer.
    pub fn set(&mut self, code: &str, pressed: bool) -> bool {
        let slot = match code {
            "ArrowUp" | "KeyW" => &mut self.up,
            "ArrowDown" | "KeyS" => &mut self.down,
            "ArrowLeft" | "KeyA" => &mut self.left,
            "ArrowRight" | "KeyD" => &mut self.right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Held keys as a vector of length 0 or 1 (screen y grows down)
    pub fn vector(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)).normalize_or_zero()
    }
}

/// Merge the adapters: the stick wins while it is held
pub fn control_input(stick: &VirtualStick, keys: &KeyboardAxes) -> ControlInput {
    if stick.active {
        return ControlInput {
            direction: stick.vector(),
            active: true,
        };
    }
    ControlInput::new(keys.vector())
}

/// Milliseconds on a monotonic-ish clock
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Wall-clock timestamp for stored scores
#[cfg(target_arch = "wasm32")]
pub fn timestamp_string() -> String {
    String::from(js_sys::Date::new_0().to_iso_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn timestamp_string() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{secs}")
}

/// Seed for a new session's RNG
pub fn session_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * u64::MAX as f64) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5a75)
    }
}

/// Touch-first device (`(pointer: coarse)` matches)
#[cfg(target_arch = "wasm32")]
pub fn coarse_pointer() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(pointer: coarse)").ok().flatten())
        .map(|m| m.matches())
        .unwrap_or(false)
}

/// Safe-area insets published by the page as `--safe-*` CSS properties
#[cfg(target_arch = "wasm32")]
pub fn safe_area_insets() -> SafeInsets {
    let read = || -> Option<SafeInsets> {
        let window = web_sys::window()?;
        let root = window.document()?.document_element()?;
        let styles = window.get_computed_style(&root).ok()??;
        let value = |name: &str| {
            styles
                .get_property_value(name)
                .ok()
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
                .unwrap_or(0.0)
        };
        Some(SafeInsets {
            top: value("--safe-top"),
            right: value("--safe-right"),
            bottom: value("--safe-bottom"),
            left: value("--safe-left"),
        })
    };
    read().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_clamps_to_radius() {
        let mut stick = VirtualStick::default();
        stick.begin(Vec2::new(100.0, 100.0));
        assert_eq!(stick.vector(), Vec2::ZERO);

        stick.move_to(Vec2::new(140.0, 100.0));
        assert!((stick.vector() - Vec2::new(0.5, 0.0)).length() < 1e-6);

        stick.move_to(Vec2::new(100.0, 400.0));
        assert!((stick.vector() - Vec2::new(0.0, 1.0)).length() < 1e-6);
        assert_eq!(stick.knob(), Vec2::new(100.0, 180.0));

        stick.end();
        assert!(!stick.active);
        assert_eq!(stick.vector(), Vec2::ZERO);
    }

    #[test]
    fn test_move_without_begin_is_ignored() {
        let mut stick = VirtualStick::default();
        stick.move_to(Vec2::new(50.0, 0.0));
        assert_eq!(stick.offset, Vec2::ZERO);
    }

    #[test]
    fn test_keyboard_diagonal_is_normalized() {
        let mut keys = KeyboardAxes::default();
        assert!(keys.set("KeyW", true));
        assert!(keys.set("ArrowRight", true));
        assert!(!keys.set("Space", true));
        let v = keys.vector();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.x > 0.0 && v.y < 0.0);

        keys.set("KeyS", true);
        keys.set("KeyW", false);
        assert!(keys.vector().y > 0.0);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut keys = KeyboardAxes::default();
        keys.set("ArrowLeft", true);
        keys.set("ArrowRight", true);
        assert_eq!(keys.vector(), Vec2::ZERO);
        assert!(!control_input(&VirtualStick::default(), &keys).active);
    }

    #[test]
    fn test_stick_overrides_keyboard() {
        let mut keys = KeyboardAxes::default();
        keys.set("ArrowLeft", true);
        let mut stick = VirtualStick::default();
        stick.begin(Vec2::ZERO);
        let input = control_input(&stick, &keys);
        assert!(input.active);
        assert_eq!(input.direction, Vec2::ZERO);

        stick.end();
        assert_eq!(control_input(&stick, &keys).direction, Vec2::new(-1.0, 0.0));
    }
}
