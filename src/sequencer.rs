//! The per-period update and the configuration API.
//!
//! A [`PwmSequencer`] is shared by reference between two contexts:
//!
//! - application code, which reprograms channels with [`set_constant`](PwmSequencer::set_constant),
//!   [`set_sequence`](PwmSequencer::set_sequence) and friends, and
//! - the period context (a PWM interrupt or a high-priority task), which calls
//!   [`advance_one_period`](PwmSequencer::advance_one_period) exactly once per PWM period.
//!
//! Reconfiguration builds a complete replacement channel and publishes it with a single
//! assignment inside a critical section, so the period update never sees half of an old
//! program and half of a new one. The period update itself takes the same critical section;
//! it never waits, allocates, or does more than a constant amount of work per channel.
//!
//! # Example
//!
//! ```rust
//! use pwm_sequencer::{INFINITE_PASSES, MAX_DUTY, Mode, PwmSequencer};
//!
//! static BLINK: [u16; 2] = [MAX_DUTY, 0];
//!
//! let sequencer = PwmSequencer::new();
//! sequencer.set_constant(0, MAX_DUTY / 2)?;
//! sequencer.set_sequence(1, &BLINK, INFINITE_PASSES)?;
//!
//! sequencer.advance_one_period();
//! assert_eq!(sequencer.duty_image().snapshot(), [MAX_DUTY / 2, MAX_DUTY, 0, 0]);
//! assert_eq!(sequencer.channel_state(1)?.mode, Mode::Sequence);
//! # Ok::<(), pwm_sequencer::Error>(())
//! ```

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::channel::{ChannelPlayback, fraction_to_duty};
use crate::waveform::{Preset, WaveformLibrary};
use crate::{CHANNEL_COUNT, ChannelIndex, ChannelState, DutyRegisterImage, Result, Samples};

type Channels<'a> = [ChannelPlayback<'a>; CHANNEL_COUNT];

/// Four sequenced channels and the duty values they produce.
///
/// `'a` is the lifetime of the sample sources channels may play. Sources are borrowed,
/// never copied; on hardware they are typically `'static`.
pub struct PwmSequencer<'a> {
    channels: Mutex<CriticalSectionRawMutex, RefCell<Channels<'a>>>,
    duty_image: DutyRegisterImage,
}

impl Default for PwmSequencer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PwmSequencer<'a> {
    /// All channels constant at duty 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: Mutex::new(RefCell::new([ChannelPlayback::constant(0); CHANNEL_COUNT])),
            duty_image: DutyRegisterImage::new(),
        }
    }

    // ------------------------------------------------------------------
    // Period context
    // ------------------------------------------------------------------

    /// Advance every sequencing channel by one sample, in channel order.
    ///
    /// Call exactly once per PWM period. Constant channels are left untouched.
    pub fn advance_one_period(&self) {
        self.channels.lock(|channels| {
            let mut channels = channels.borrow_mut();
            for (channel, playback) in ChannelIndex::ALL.into_iter().zip(channels.iter_mut()) {
                if let Some(duty) = playback.advance() {
                    self.duty_image.store(channel, duty);
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Configuration API
    // ------------------------------------------------------------------

    /// Hold `channel` at `duty` (clamped to [`MAX_DUTY`](crate::MAX_DUTY)), starting now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn set_constant(&self, channel: usize, duty: u16) -> Result<()> {
        let channel = ChannelIndex::new(channel)?;
        let replacement = ChannelPlayback::constant(duty);
        self.with_channel(channel, |playback| {
            *playback = replacement;
            self.duty_image.store(channel, replacement.last_value());
        });
        Ok(())
    }

    /// Hold `channel` at `fraction` of full scale (clamped to `0.0..=1.0`), starting now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn set_constant_fraction(&self, channel: usize, fraction: f32) -> Result<()> {
        self.set_constant(channel, fraction_to_duty(fraction))
    }

    /// Play raw duty `samples` on `channel`, `passes` times
    /// ([`INFINITE_PASSES`](crate::INFINITE_PASSES) loops forever).
    ///
    /// The first sample appears at the next [`advance_one_period`](Self::advance_one_period).
    /// After the last pass the channel holds the final sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of
    /// range, or [`Error::InvalidSequence`](crate::Error::InvalidSequence) if `samples` is empty.
    pub fn set_sequence(&self, channel: usize, samples: &'a [u16], passes: u32) -> Result<()> {
        self.set_samples(channel, Samples::Integer(samples), passes)
    }

    /// Like [`set_sequence`](Self::set_sequence), for samples given as fractions of full scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of
    /// range, or [`Error::InvalidSequence`](crate::Error::InvalidSequence) if `samples` is empty.
    pub fn set_sequence_fraction(
        &self,
        channel: usize,
        samples: &'a [f32],
        passes: u32,
    ) -> Result<()> {
        self.set_samples(channel, Samples::Fraction(samples), passes)
    }

    /// Play `samples` of either kind on `channel`, `passes` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of
    /// range, or [`Error::InvalidSequence`](crate::Error::InvalidSequence) if `samples` is empty.
    pub fn set_samples(&self, channel: usize, samples: Samples<'a>, passes: u32) -> Result<()> {
        let channel = ChannelIndex::new(channel)?;
        let replacement = ChannelPlayback::sequence(samples, passes)?;
        self.with_channel(channel, |playback| {
            *playback = replacement.continuing_from(playback);
        });
        Ok(())
    }

    /// Play `preset` from `library` on `channel`, `passes` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn play(
        &self,
        channel: usize,
        library: &'a WaveformLibrary,
        preset: Preset,
        passes: u32,
    ) -> Result<()> {
        self.set_samples(channel, library.samples(preset), passes)
    }

    /// Pulse `channel` slowly (one second per pulse), `passes` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn pulse_slow(&self, channel: usize, library: &'a WaveformLibrary, passes: u32) -> Result<()> {
        self.play(channel, library, Preset::PulseSlow, passes)
    }

    /// Pulse `channel` quickly (half a second per pulse), `passes` times.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn pulse_fast(&self, channel: usize, library: &'a WaveformLibrary, passes: u32) -> Result<()> {
        self.play(channel, library, Preset::PulseFast, passes)
    }

    /// Fade `channel` from off to full scale over one second, then hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn fade_in(&self, channel: usize, library: &'a WaveformLibrary) -> Result<()> {
        self.play(channel, library, Preset::FadeIn, 1)
    }

    /// Fade `channel` from full scale to off over one second, then hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn fade_out(&self, channel: usize, library: &'a WaveformLibrary) -> Result<()> {
        self.play(channel, library, Preset::FadeOut, 1)
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Snapshot of `channel`'s playback state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`](crate::Error::InvalidChannel) if `channel` is out of range.
    pub fn channel_state(&self, channel: usize) -> Result<ChannelState> {
        let channel = ChannelIndex::new(channel)?;
        Ok(self.with_channel(channel, |playback| playback.state()))
    }

    /// The duty values the outputs should transmit.
    #[must_use]
    pub const fn duty_image(&self) -> &DutyRegisterImage {
        &self.duty_image
    }

    #[allow(
        clippy::indexing_slicing,
        reason = "ChannelIndex is always below CHANNEL_COUNT"
    )]
    fn with_channel<R>(
        &self,
        channel: ChannelIndex,
        f: impl FnOnce(&mut ChannelPlayback<'a>) -> R,
    ) -> R {
        self.channels
            .lock(|channels| f(&mut channels.borrow_mut()[channel.get()]))
    }
}
