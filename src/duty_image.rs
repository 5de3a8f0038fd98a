//! The duty values the PWM outputs transmit, one slot per channel.

use portable_atomic::{AtomicU16, Ordering};

use crate::{CHANNEL_COUNT, ChannelIndex, MAX_DUTY};

/// Current duty value of every channel.
///
/// Written by the sequencer, read by the output path. Slots are atomics so the output path
/// never waits on the sequencer.
#[derive(Debug)]
pub struct DutyRegisterImage {
    slots: [AtomicU16; CHANNEL_COUNT],
}

impl Default for DutyRegisterImage {
    fn default() -> Self {
        Self::new()
    }
}

impl DutyRegisterImage {
    /// All slots at 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
                AtomicU16::new(0),
            ],
        }
    }

    /// Duty value currently held for `channel`.
    #[must_use]
    pub fn get(&self, channel: ChannelIndex) -> u16 {
        self.slot(channel).load(Ordering::Relaxed)
    }

    /// Copy of all slots, in channel order.
    #[must_use]
    pub fn snapshot(&self) -> [u16; CHANNEL_COUNT] {
        ChannelIndex::ALL.map(|channel| self.get(channel))
    }

    pub(crate) fn store(&self, channel: ChannelIndex, duty: u16) {
        self.slot(channel).store(duty.min(MAX_DUTY), Ordering::Relaxed);
    }

    #[allow(
        clippy::indexing_slicing,
        reason = "ChannelIndex is always below CHANNEL_COUNT"
    )]
    fn slot(&self, channel: ChannelIndex) -> &AtomicU16 {
        &self.slots[channel.get()]
    }
}
