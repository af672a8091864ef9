//! Audio cues using the Web Audio API
//!
//! Every sound is a short oscillator blip; there are no sample files.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::sim::SoundCue;

/// Output level of the shared bus before settings are applied
const BUS_LEVEL: f32 = 0.4;

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    bus: Option<GainNode>,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        let bus = ctx.as_ref().and_then(|ctx| {
            let gain = ctx.create_gain().ok()?;
            gain.gain().set_value(BUS_LEVEL);
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some(gain)
        });
        Self {
            ctx,
            bus,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a cue. Fire-and-forget: failures are ignored.
    pub fn play(&self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let (Some(ctx), Some(bus)) = (&self.ctx, &self.bus) else {
            return;
        };

        // Browsers suspend the context until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            SoundCue::Shoot => self.tone(ctx, bus, 740.0, 0.08, OscillatorType::Sawtooth, vol * 0.08),
            SoundCue::Hit => self.play_hit(ctx, bus, vol),
            SoundCue::GameOver => {
                self.tone(ctx, bus, 220.0, 0.4, OscillatorType::Sine, vol * 0.18);
                self.tone(ctx, bus, 110.0, 0.5, OscillatorType::Sine, vol * 0.15);
            }
            SoundCue::CountdownBeep(freq) => {
                self.tone(ctx, bus, freq, 0.08, OscillatorType::Square, vol * 0.16)
            }
        }
    }

    /// Create an oscillator routed through a fresh gain node into the bus
    fn create_osc(
        &self,
        ctx: &AudioContext,
        bus: &GainNode,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(bus).ok()?;

        Some((osc, gain))
    }

    /// Plain blip with an exponential tail
    fn tone(
        &self,
        ctx: &AudioContext,
        bus: &GainNode,
        freq: f32,
        duration: f64,
        osc_type: OscillatorType,
        level: f32,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, bus, freq, osc_type) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.001, t + duration)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + duration).ok();
    }

    /// Hit - falling boom plus a square crack
    fn play_hit(&self, ctx: &AudioContext, bus: &GainNode, vol: f32) {
        if let Some((osc, gain)) = self.create_osc(ctx, bus, 220.0, OscillatorType::Sine) {
            let t = ctx.current_time();
            osc.frequency().set_value_at_time(220.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(80.0, t + 0.18)
                .ok();
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + 0.22)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.22).ok();
        }
        self.tone(ctx, bus, 160.0, 0.12, OscillatorType::Square, vol * 0.14);
    }
}
