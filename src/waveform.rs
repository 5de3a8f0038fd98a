//! Preset duty sequences: two sine pulses and two linear fades.
//!
//! The tables are computed once by [`WaveformLibrary::generate`] and then only read.
//! Each preset lasts one second at 50 Hz except the fast pulse, which lasts half a second.
//!
//! ```rust
//! use pwm_sequencer::{Preset, PwmSequencer, WaveformLibrary};
//!
//! let library = WaveformLibrary::generate();
//! let sequencer = PwmSequencer::new();
//! sequencer.pulse_slow(0, &library, 10)?; // pulse channel 0 ten times
//! sequencer.fade_in(1, &library)?;        // fade channel 1 up once, then hold full scale
//! sequencer.play(2, &library, Preset::PulseFast, Preset::PulseFast.default_passes())?;
//! # Ok::<(), pwm_sequencer::Error>(())
//! ```

use core::f32::consts::PI;

use crate::{INFINITE_PASSES, MAX_DUTY, Samples};

/// Samples in the slow (one second) pulse.
pub const PULSE_SLOW_LEN: usize = 50;
/// Samples in the fast (half second) pulse.
pub const PULSE_FAST_LEN: usize = 25;
/// Samples in each fade.
pub const FADE_LEN: usize = 50;

/// The four preset sequences.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Preset {
    /// Raised-cosine pulse, 50 samples.
    PulseSlow,
    /// Raised-cosine pulse at half the resolution of [`PulseSlow`](Self::PulseSlow), 25 samples.
    PulseFast,
    /// Linear ramp up to full scale, 50 samples.
    FadeIn,
    /// Linear ramp down to zero, 50 samples.
    FadeOut,
}

impl Preset {
    /// Natural sample count.
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::PulseSlow => PULSE_SLOW_LEN,
            Self::PulseFast => PULSE_FAST_LEN,
            Self::FadeIn | Self::FadeOut => FADE_LEN,
        }
    }

    /// Pass count used when the caller has no preference: pulses repeat forever, fades
    /// play once and hold their final level.
    #[must_use]
    pub const fn default_passes(self) -> u32 {
        match self {
            Self::PulseSlow | Self::PulseFast => INFINITE_PASSES,
            Self::FadeIn | Self::FadeOut => 1,
        }
    }
}

/// The generated preset tables.
#[derive(Clone, Debug)]
pub struct WaveformLibrary {
    pulse_slow: [u16; PULSE_SLOW_LEN],
    pulse_fast: [u16; PULSE_FAST_LEN],
    fade_in: [u16; FADE_LEN],
    fade_out: [u16; FADE_LEN],
}

impl WaveformLibrary {
    /// Compute all preset tables.
    ///
    /// - slow pulse: sample `i` is `(1 - cos(2π(i+1)/50)) / 2` of full scale,
    /// - fast pulse: every second sample of the slow pulse,
    /// - fade in: sample `i` is `MAX_DUTY * (i+1) / 50`,
    /// - fade out: sample `i` is `MAX_DUTY * (49-i) / 50`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "fixed-size tables indexed within bounds; values are in 0.0..=MAX_DUTY"
    )]
    pub fn generate() -> Self {
        let mut pulse_slow = [0u16; PULSE_SLOW_LEN];
        for (i, sample) in pulse_slow.iter_mut().enumerate() {
            let phase = 2.0 * PI * (i + 1) as f32 / PULSE_SLOW_LEN as f32;
            let level = (1.0 - libm::cosf(phase)) / 2.0;
            *sample = (level.clamp(0.0, 1.0) * f32::from(MAX_DUTY)) as u16;
        }

        let pulse_fast = core::array::from_fn(|i| pulse_slow[2 * i]);

        // u32 intermediate: MAX_DUTY * 50 overflows u16.
        let max = u32::from(MAX_DUTY);
        let len = FADE_LEN as u32;
        let fade_in = core::array::from_fn(|i| (max * (i as u32 + 1) / len) as u16);
        let fade_out = core::array::from_fn(|i| (max * (len - 1 - i as u32) / len) as u16);

        Self {
            pulse_slow,
            pulse_fast,
            fade_in,
            fade_out,
        }
    }

    /// Slow pulse (50 samples, one second at 50 Hz).
    #[must_use]
    pub fn pulse_slow(&self) -> Samples<'_> {
        Samples::Integer(&self.pulse_slow)
    }

    /// Fast pulse (25 samples, half a second at 50 Hz).
    #[must_use]
    pub fn pulse_fast(&self) -> Samples<'_> {
        Samples::Integer(&self.pulse_fast)
    }

    /// Fade in (50 samples), ending at full scale.
    #[must_use]
    pub fn fade_in(&self) -> Samples<'_> {
        Samples::Integer(&self.fade_in)
    }

    /// Fade out (50 samples), ending at zero.
    #[must_use]
    pub fn fade_out(&self) -> Samples<'_> {
        Samples::Integer(&self.fade_out)
    }

    /// Samples of `preset`.
    #[must_use]
    pub fn samples(&self, preset: Preset) -> Samples<'_> {
        match preset {
            Preset::PulseSlow => self.pulse_slow(),
            Preset::PulseFast => self.pulse_fast(),
            Preset::FadeIn => self.fade_in(),
            Preset::FadeOut => self.fade_out(),
        }
    }
}
