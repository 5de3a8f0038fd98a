//! A four-channel PWM duty-cycle sequencer for Pico 1 and 2.
//!
//! Each channel either holds a constant duty value or plays a sequence of duty samples,
//! one sample per PWM period, a given number of passes (or forever). The sequence advance
//! runs once per period from a high-priority context, while application code reprograms
//! channels at any time.
//!
//! - [`waveform`] — preset pulses and fades, generated once at start-up.
//! - [`sequencer`] — the per-period update and the configuration API.
//! - [`output`] — binding of channels to `embedded-hal` PWM outputs.
//! - [`pacing`] — one update per period, phase-locked to the PWM wrap.
//! - `pwm_player` — the embassy task that drives everything on real hardware (embedded builds).
//!
//! # Glossary
//!
//! - **Duty value:** the number of PWM ticks (out of [`MAX_DUTY`]) an output stays active each period.
//! - **Period:** one PWM cycle; the reference configuration uses 1 µs ticks, so [`MAX_DUTY`] ticks is 20 ms.
//! - **Pass:** one complete traversal of a sequence, first sample to last.
//! - **Freeze:** a channel's switch to constant mode after its last pass, holding the final sample.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time checks: exactly one architecture must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "arm", feature = "riscv")), not(feature = "host")))]
compile_error!("Must enable exactly one architecture feature: 'arm' or 'riscv'");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

pub mod channel;
pub mod duty_image;
mod error;
pub mod output;
pub mod pacing;
#[cfg(not(feature = "host"))]
pub mod pwm_player;
pub mod sequencer;
pub mod waveform;

/// Number of independently sequenced channels.
pub const CHANNEL_COUNT: usize = 4;

/// Full-scale duty value. With 1 µs PWM ticks this is a 20 ms (50 Hz) period.
pub const MAX_DUTY: u16 = 20_000;

/// Pass count meaning "repeat forever".
pub const INFINITE_PASSES: u32 = 0;

// Re-export error types and result (used throughout)
pub use crate::channel::{ChannelIndex, ChannelState, Mode, Samples};
pub use crate::duty_image::DutyRegisterImage;
pub use crate::error::{Error, Result};
pub use crate::output::{Polarity, PwmOutputs};
pub use crate::sequencer::PwmSequencer;
pub use crate::waveform::{Preset, WaveformLibrary};
