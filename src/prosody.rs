//! Slider-to-engine parameter mapping.
//!
//! The shell works in slider units: rate and volume in `[-50, 50]`, pitch in
//! `[-12, 12]`. The neural service takes relative deltas as strings
//! (`"+7%"`, `"-3Hz"`) while eSpeak NG takes absolute values, so every
//! backend goes through exactly one of the mappers below.

use std::ops::RangeInclusive;

pub const RATE_RANGE: RangeInclusive<i32> = -50..=50;
pub const PITCH_RANGE: RangeInclusive<i32> = -12..=12;
pub const VOLUME_RANGE: RangeInclusive<i32> = -50..=50;

/// eSpeak NG words-per-minute at slider position 0.
pub const ESPEAK_BASE_RATE: i32 = 200;
const ESPEAK_RATE_STEP: i32 = 4;
const ESPEAK_MIN_RATE: i32 = 50;
const ESPEAK_MAX_RATE: i32 = 400;

/// Slider positions as the shell reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Prosody {
    pub rate: i32,
    pub pitch: i32,
    pub volume: i32,
}

impl Prosody {
    /// Clamps each value into its slider range.
    pub fn new(rate: i32, pitch: i32, volume: i32) -> Self {
        Self {
            rate: clamp_to(rate, &RATE_RANGE),
            pitch: clamp_to(pitch, &PITCH_RANGE),
            volume: clamp_to(volume, &VOLUME_RANGE),
        }
    }
}

/// Prosody attributes for an SSML `<prosody>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeuralProsody {
    pub rate: String,
    pub pitch: String,
    pub volume: String,
}

/// Absolute eSpeak NG parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EspeakProsody {
    /// Words per minute.
    pub rate: u32,
    /// Linear gain in `[0.0, 1.0]`.
    pub volume: f32,
}

impl EspeakProsody {
    /// Amplitude for `espeak-ng -a`, where 100 is the engine's nominal level.
    pub fn amplitude(&self) -> u32 {
        (self.volume * 100.0).round() as u32
    }
}

fn signed(value: i32, unit: &str) -> String {
    format!("{:+}{}", value, unit)
}

pub fn neural(prosody: &Prosody) -> NeuralProsody {
    NeuralProsody {
        rate: signed(prosody.rate, "%"),
        pitch: signed(prosody.pitch, "Hz"),
        volume: signed(prosody.volume, "%"),
    }
}

/// Pitch is dropped: eSpeak NG output here has no pitch control.
pub fn espeak(prosody: &Prosody) -> EspeakProsody {
    EspeakProsody {
        rate: espeak_rate(prosody.rate),
        volume: espeak_volume(prosody.volume),
    }
}

fn clamp_to(value: i32, range: &RangeInclusive<i32>) -> i32 {
    value.clamp(*range.start(), *range.end())
}

/// Out-of-range slider values are clamped first.
pub fn espeak_rate(slider: i32) -> u32 {
    let slider = clamp_to(slider, &RATE_RANGE);
    (ESPEAK_BASE_RATE + slider * ESPEAK_RATE_STEP).clamp(ESPEAK_MIN_RATE, ESPEAK_MAX_RATE) as u32
}

pub fn espeak_volume(slider: i32) -> f32 {
    let slider = clamp_to(slider, &VOLUME_RANGE);
    ((slider + 50) as f32 / 100.0).clamp(0.0, 1.0)
}
