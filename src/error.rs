//! Error type shared by every part of the sequencer.

use embedded_hal::pwm::ErrorKind;

use crate::CHANNEL_COUNT;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by the sequencer and its output binding.
///
/// Configuration mistakes (bad channel, empty sequence) are reported to the caller rather
/// than ignored, so a typo in a channel number shows up at the call site.
#[derive(derive_more::Debug, derive_more::Display, derive_more::Error)]
pub enum Error {
    /// Channel index outside `0..CHANNEL_COUNT`.
    #[display("channel {_0} is out of range (0..{})", CHANNEL_COUNT)]
    InvalidChannel(#[error(not(source))] usize),

    /// A sequence with no samples was supplied.
    #[display("sequence must contain at least one sample")]
    InvalidSequence,

    /// Between 1 and [`CHANNEL_COUNT`] outputs must be bound.
    #[display("{_0} outputs supplied; expected 1..={}", CHANNEL_COUNT)]
    OutputCount(#[error(not(source))] usize),

    /// An output refused its initial duty value while being bound.
    #[display("PWM output rejected initialization: {_0:?}")]
    HardwareInit(#[error(not(source))] ErrorKind),

    /// An output refused a duty value while transmitting.
    #[display("PWM output rejected duty value: {_0:?}")]
    Output(#[error(not(source))] ErrorKind),

    /// The background player task could not be spawned.
    #[cfg(feature = "embassy")]
    #[display("failed to spawn PWM player task")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),
}
