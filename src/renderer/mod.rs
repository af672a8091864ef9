//! Canvas 2D renderer
//!
//! Draws a [`RenderSnapshot`] each frame. Read-only with respect to the
//! simulation; the only randomness here is the per-frame shake jitter.

use std::f64::consts::{FRAC_PI_2, TAU};

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::STICK_RADIUS;
use crate::platform::VirtualStick;
use crate::sim::snapshot::{CountdownView, EntityView, PlayerView, RenderSnapshot};
use crate::sim::state::EffectKind;

const FONT_STACK: &str = "IBM Plex Mono, Courier New, monospace";
const BACKGROUND: &str = "#060a12";
/// Drone sprite size in CSS pixels
const DRONE_SIZE: f64 = 42.0;
/// Trailing length of a shot streak
const SHOT_LENGTH: f64 = 24.0;
/// Radius of a fresh impact flash
const FLASH_RADIUS: f64 = 16.0;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            dpr: 1.0,
        })
    }

    /// Match the backing store to the CSS size at `dpr`
    pub fn resize(&mut self, css_width: f32, css_height: f32, dpr: f64) {
        self.dpr = dpr.max(1.0);
        self.canvas
            .set_width((css_width as f64 * self.dpr).round() as u32);
        self.canvas
            .set_height((css_height as f64 * self.dpr).round() as u32);
    }

    /// Draw one frame
    pub fn render(&self, snap: &RenderSnapshot, stick: Option<&VirtualStick>, starfield: bool) {
        if let Err(e) = self.draw(snap, stick, starfield) {
            log::warn!("Render error: {:?}", e);
        }
    }

    fn draw(
        &self,
        snap: &RenderSnapshot,
        stick: Option<&VirtualStick>,
        starfield: bool,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let (w, h) = (snap.width as f64, snap.height as f64);

        ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)?;
        ctx.clear_rect(0.0, 0.0, w, h);
        ctx.save();

        if snap.shake > 0.0 {
            let m = snap.shake as f64;
            let dx = (js_sys::Math::random() - 0.5) * m;
            let dy = (js_sys::Math::random() - 0.5) * m;
            ctx.translate(dx, dy)?;
        }

        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, w, h);
        if starfield {
            self.draw_stars(snap)?;
        }

        for entity in &snap.entities {
            match entity {
                EntityView::Hazard {
                    pos,
                    radius,
                    angle,
                    outline,
                    ..
                } => self.draw_hazard(pos.x as f64, pos.y as f64, *radius as f64, *angle as f64, outline)?,
                EntityView::Projectile { pos, vel, hue } => {
                    self.draw_shot(pos.x as f64, pos.y as f64, vel.x as f64, vel.y as f64, *hue as f64)?
                }
                EntityView::Effect { kind, pos, fade } => {
                    self.draw_effect(kind, pos.x as f64, pos.y as f64, *fade as f64)?
                }
            }
        }

        if let Some(stick) = stick.filter(|s| s.active) {
            self.draw_stick(stick)?;
        }
        if snap.shows_player() {
            self.draw_player(&snap.player)?;
        }
        if let Some(countdown) = &snap.countdown {
            self.draw_countdown(countdown, w, h)?;
        }

        ctx.restore();
        Ok(())
    }

    fn draw_stars(&self, snap: &RenderSnapshot) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        ctx.set_fill_style_str("rgba(180, 220, 255, 0.9)");
        for star in &snap.stars {
            ctx.set_global_alpha(0.25 + (star.size as f64 / 2.0) * 0.4);
            ctx.begin_path();
            ctx.arc(star.pos.x as f64, star.pos.y as f64, star.size as f64 * 0.6, 0.0, TAU)?;
            ctx.fill();
        }
        ctx.restore();
        Ok(())
    }

    fn draw_hazard(
        &self,
        x: f64,
        y: f64,
        radius: f64,
        angle: f64,
        outline: &[crate::sim::state::OutlinePoint],
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        ctx.translate(x, y)?;
        ctx.rotate(angle)?;
        ctx.set_fill_style_str("rgba(70, 86, 110, 0.9)");
        ctx.set_stroke_style_str("rgba(150, 170, 200, 0.6)");
        ctx.set_line_width(2.0);

        ctx.begin_path();
        if outline.is_empty() {
            ctx.arc(0.0, 0.0, radius, 0.0, TAU)?;
        } else {
            for (i, p) in outline.iter().enumerate() {
                let px = p.angle.cos() as f64 * p.radius as f64;
                let py = p.angle.sin() as f64 * p.radius as f64;
                if i == 0 {
                    ctx.move_to(px, py);
                } else {
                    ctx.line_to(px, py);
                }
            }
            ctx.close_path();
        }
        ctx.fill();
        ctx.stroke();

        ctx.set_fill_style_str("rgba(245, 197, 66, 0.9)");
        ctx.set_font(&format!("700 {}px {}", (radius * 0.6).max(10.0), FONT_STACK));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.fill_text("₿", 0.0, 0.0)?;
        ctx.restore();
        Ok(())
    }

    fn draw_shot(&self, x: f64, y: f64, vx: f64, vy: f64, hue: f64) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let speed = vx.hypot(vy).max(1.0);
        let (dx, dy) = (vx / speed, vy / speed);
        let (x0, y0) = (x - dx * SHOT_LENGTH, y - dy * SHOT_LENGTH);
        let (x1, y1) = (x + dx * 4.0, y + dy * 4.0);

        // Rainbow streak, shifted per shot
        let gradient = ctx.create_linear_gradient(x0, y0, x1, y1);
        let stops = [350.0, 30.0, 55.0, 120.0, 180.0, 220.0, 280.0];
        for (i, stop) in stops.iter().enumerate() {
            let at = i as f32 / (stops.len() - 1) as f32;
            gradient.add_color_stop(at, &format!("hsl({} 100% 60%)", (stop + hue) % 360.0))?;
        }

        ctx.save();
        ctx.set_stroke_style_canvas_gradient(&gradient);
        ctx.set_line_width(3.0);
        ctx.set_shadow_color("rgba(160, 240, 255, 0.65)");
        ctx.set_shadow_blur(8.0);
        ctx.begin_path();
        ctx.move_to(x0, y0);
        ctx.line_to(x1, y1);
        ctx.stroke();
        ctx.restore();
        Ok(())
    }

    fn draw_effect(&self, kind: &EffectKind, x: f64, y: f64, fade: f64) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        match kind {
            EffectKind::Particle => {
                ctx.set_fill_style_str(&format!("rgba(194, 245, 255, {fade})"));
                ctx.begin_path();
                ctx.arc(x, y, 3.0, 0.0, TAU)?;
                ctx.fill();
            }
            EffectKind::Flash => {
                ctx.set_fill_style_str(&format!("rgba(255, 245, 200, {fade})"));
                ctx.begin_path();
                ctx.arc(x, y, FLASH_RADIUS * fade, 0.0, TAU)?;
                ctx.fill();
            }
            EffectKind::Glyph { glyph, spin } => {
                let size = (22.0 * (0.7 + 0.6 * fade)).max(12.0);
                ctx.set_global_alpha(fade);
                ctx.set_fill_style_str("rgba(255, 214, 120, 0.95)");
                ctx.set_font(&format!("700 {size}px {FONT_STACK}"));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                ctx.translate(x, y)?;
                ctx.rotate(*spin as f64 * (1.0 - fade))?;
                ctx.fill_text(&glyph.to_string(), 0.0, 0.0)?;
            }
            EffectKind::Popup { text } => {
                let rise = (1.0 - fade) * 12.0;
                ctx.set_global_alpha(fade);
                ctx.set_fill_style_str("rgba(255, 231, 150, 0.95)");
                ctx.set_shadow_color("rgba(255, 200, 120, 0.7)");
                ctx.set_shadow_blur(8.0);
                ctx.set_font(&format!("700 14px {FONT_STACK}"));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                ctx.fill_text(text, x, y - rise)?;
            }
        }
        ctx.restore();
        Ok(())
    }

    fn draw_stick(&self, stick: &VirtualStick) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let (cx, cy) = (stick.center.x as f64, stick.center.y as f64);
        let knob = stick.knob();
        let (tx, ty) = (knob.x as f64, knob.y as f64);

        ctx.save();
        ctx.set_stroke_style_str("rgba(160, 210, 255, 0.35)");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.arc(cx, cy, STICK_RADIUS as f64, 0.0, TAU)?;
        ctx.stroke();

        ctx.set_stroke_style_str("rgba(200, 240, 255, 0.55)");
        ctx.begin_path();
        ctx.move_to(cx, cy);
        ctx.line_to(tx, ty);
        ctx.stroke();

        ctx.set_fill_style_str("rgba(220, 250, 255, 0.55)");
        ctx.begin_path();
        ctx.arc(tx, ty, 6.0, 0.0, TAU)?;
        ctx.fill();
        ctx.restore();
        Ok(())
    }

    fn draw_player(&self, player: &PlayerView) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let size = DRONE_SIZE;
        ctx.save();
        ctx.translate(player.pos.x as f64, player.pos.y as f64)?;
        // Sprite points up at angle -π/2
        ctx.rotate(player.angle as f64 + FRAC_PI_2)?;

        ctx.set_fill_style_str("#9fd8ff");
        ctx.begin_path();
        ctx.move_to(0.0, -size * 0.55);
        ctx.line_to(-size * 0.45, size * 0.45);
        ctx.line_to(size * 0.45, size * 0.45);
        ctx.close_path();
        ctx.fill();

        let nose = size * 0.45;
        let width = size * 0.18;
        ctx.set_stroke_style_str("rgba(240, 250, 255, 0.85)");
        ctx.set_fill_style_str("rgba(240, 250, 255, 0.35)");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(0.0, -nose);
        ctx.line_to(-width, -nose + width * 1.3);
        ctx.line_to(width, -nose + width * 1.3);
        ctx.close_path();
        ctx.fill();
        ctx.stroke();
        ctx.restore();
        Ok(())
    }

    fn draw_countdown(&self, countdown: &CountdownView, w: f64, h: f64) -> Result<(), JsValue> {
        if countdown.text.is_empty() {
            return Ok(());
        }
        let ctx = &self.ctx;
        let pulse = (std::f64::consts::PI * countdown.progress as f64).sin();
        let scale = 0.92 + 0.1 * pulse;
        let font_size = w.min(h) * 0.14;

        ctx.save();
        ctx.set_global_alpha(pulse);
        ctx.translate(w * 0.5, h * 0.5)?;
        ctx.scale(scale, scale)?;
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_fill_style_str("#f2fbff");
        ctx.set_shadow_color("rgba(130, 220, 255, 0.85)");
        ctx.set_shadow_blur(18.0);
        ctx.set_font(&format!("700 {font_size}px {FONT_STACK}"));

        let lines: Vec<&str> = countdown.text.split('\n').collect();
        let line_height = font_size * 0.9;
        let start_y = -((lines.len() - 1) as f64 * line_height) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            ctx.fill_text(line, 0.0, start_y + i as f64 * line_height)?;
        }
        ctx.restore();
        Ok(())
    }
}
