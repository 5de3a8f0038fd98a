//! Per-channel playback: sample sources and the constant/sequence state machine.
//!
//! See [`ChannelPlayback`] for the exact per-period rules.

use crate::{CHANNEL_COUNT, Error, INFINITE_PASSES, MAX_DUTY, Result};

/// A validated channel number in `0..CHANNEL_COUNT`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct ChannelIndex(usize);

impl ChannelIndex {
    /// All channel indices, in update order.
    pub const ALL: [Self; CHANNEL_COUNT] = [Self(0), Self(1), Self(2), Self(3)];

    /// Validate a raw channel number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChannel`] if `index >= CHANNEL_COUNT`.
    pub const fn new(index: usize) -> Result<Self> {
        if index < CHANNEL_COUNT {
            Ok(Self(index))
        } else {
            Err(Error::InvalidChannel(index))
        }
    }

    /// The raw channel number.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for ChannelIndex {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        Self::new(index)
    }
}

/// A borrowed sequence of duty samples.
///
/// The sequencer never copies or owns samples; it plays them in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Samples<'a> {
    /// Raw duty values in `0..=MAX_DUTY` (larger values are clamped).
    Integer(&'a [u16]),
    /// Fractions of full scale in `0.0..=1.0` (out-of-range values are clamped, NaN reads as 0).
    Fraction(&'a [f32]),
}

impl Samples<'_> {
    /// Number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Integer(samples) => samples.len(),
            Self::Fraction(samples) => samples.len(),
        }
    }

    /// Whether there are no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duty value of the sample at `index`, clamped to `0..=MAX_DUTY`.
    #[must_use]
    pub fn duty_at(&self, index: usize) -> Option<u16> {
        match self {
            Self::Integer(samples) => samples.get(index).map(|&duty| duty.min(MAX_DUTY)),
            Self::Fraction(samples) => samples.get(index).map(|&fraction| fraction_to_duty(fraction)),
        }
    }
}

/// Scale a fraction of full scale to a duty value, truncating toward zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0.0..=MAX_DUTY before the cast"
)]
pub fn fraction_to_duty(fraction: f32) -> u16 {
    // `max`/`min` map NaN to 0.0.
    let clamped = fraction.max(0.0).min(1.0);
    (clamped * f32::from(MAX_DUTY)) as u16
}

/// Whether a channel holds a level or plays samples.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Mode {
    /// Holds its last duty value; untouched by the period update.
    Constant,
    /// Plays one sample per period.
    Sequence,
}

/// Read-only snapshot of a channel, for diagnostics and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub struct ChannelState {
    /// Current mode.
    pub mode: Mode,
    /// Index of the next sample to play (0 in constant mode).
    pub position: usize,
    /// Sample count of the bound sequence (0 in constant mode).
    pub length: usize,
    /// Passes left before freezing; [`INFINITE_PASSES`] loops forever.
    pub remaining_passes: u32,
    /// Last duty value written for this channel.
    pub last_value: u16,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Playback<'a> {
    Constant,
    Sequence {
        samples: Samples<'a>,
        position: usize,
        remaining_passes: u32,
    },
}

/// The per-channel state machine.
///
/// In sequence mode, each [`advance`](Self::advance):
/// 1. plays the sample at `position` and remembers it as the last value,
/// 2. moves `position` forward,
/// 3. at the end of a pass rewinds to 0; with a finite pass count it first decrements the
///    count and freezes (switches to constant mode) when the count reaches zero.
///
/// So `passes = N` plays the sequence exactly `N` times, and `passes = 1` plays it once and
/// holds the final sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelPlayback<'a> {
    playback: Playback<'a>,
    last_value: u16,
}

impl Default for ChannelPlayback<'_> {
    fn default() -> Self {
        Self::constant(0)
    }
}

impl<'a> ChannelPlayback<'a> {
    /// A channel holding `duty` (clamped to [`MAX_DUTY`]).
    #[must_use]
    pub const fn constant(duty: u16) -> Self {
        let duty = if duty > MAX_DUTY { MAX_DUTY } else { duty };
        Self {
            playback: Playback::Constant,
            last_value: duty,
        }
    }

    /// A channel about to play `samples` from the start, `passes` times
    /// ([`INFINITE_PASSES`] loops forever).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSequence`] if `samples` is empty.
    pub const fn sequence(samples: Samples<'a>, passes: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InvalidSequence);
        }
        Ok(Self {
            playback: Playback::Sequence {
                samples,
                position: 0,
                remaining_passes: passes,
            },
            last_value: 0,
        })
    }

    /// Keep `previous`'s last value, which is still on the output until this channel's
    /// first sample plays.
    #[must_use]
    pub const fn continuing_from(self, previous: &Self) -> Self {
        Self {
            playback: self.playback,
            last_value: previous.last_value,
        }
    }

    /// Advance one period. Returns the duty value to output, or `None` in constant mode.
    pub fn advance(&mut self) -> Option<u16> {
        let Playback::Sequence {
            samples,
            position,
            remaining_passes,
        } = &mut self.playback
        else {
            return None;
        };

        // Empty sources are rejected at construction, so `position` is always in range.
        let duty = samples.duty_at(*position)?;
        self.last_value = duty;
        *position = position.saturating_add(1);

        if *position >= samples.len() {
            *position = 0;
            if *remaining_passes != INFINITE_PASSES {
                *remaining_passes = remaining_passes.saturating_sub(1);
                if *remaining_passes == 0 {
                    self.playback = Playback::Constant;
                }
            }
        }
        Some(duty)
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self.playback {
            Playback::Constant => Mode::Constant,
            Playback::Sequence { .. } => Mode::Sequence,
        }
    }

    /// Last duty value written.
    #[must_use]
    pub const fn last_value(&self) -> u16 {
        self.last_value
    }

    /// Snapshot of the channel's fields.
    #[must_use]
    pub const fn state(&self) -> ChannelState {
        match self.playback {
            Playback::Constant => ChannelState {
                mode: Mode::Constant,
                position: 0,
                length: 0,
                remaining_passes: 0,
                last_value: self.last_value,
            },
            Playback::Sequence {
                samples,
                position,
                remaining_passes,
            } => ChannelState {
                mode: Mode::Sequence,
                position,
                length: samples.len(),
                remaining_passes,
                last_value: self.last_value,
            },
        }
    }
}
