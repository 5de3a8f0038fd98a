//! Binding of sequencer channels to physical PWM outputs.
//!
//! Any [`SetDutyCycle`] implementation works as an output: on the Pico that is
//! `embassy_rp::pwm::PwmOutput`, on the host a test double. Output `i` carries channel `i`.
//!
//! ```rust
//! use core::convert::Infallible;
//! use embedded_hal::pwm::{ErrorType, SetDutyCycle};
//! use pwm_sequencer::{MAX_DUTY, Polarity, PwmOutputs, PwmSequencer};
//!
//! struct Led(u16);
//!
//! impl ErrorType for Led {
//!     type Error = Infallible;
//! }
//!
//! impl SetDutyCycle for Led {
//!     fn max_duty_cycle(&self) -> u16 {
//!         1000
//!     }
//!
//!     fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
//!         self.0 = duty;
//!         Ok(())
//!     }
//! }
//!
//! let sequencer = PwmSequencer::new();
//! let mut outputs = PwmOutputs::new([(Led(0), Polarity::Normal), (Led(0), Polarity::Inverted)])?;
//! sequencer.set_constant(0, MAX_DUTY / 4)?;
//! outputs.transmit(sequencer.duty_image())?;
//! assert_eq!(outputs.output(0).map(|led| led.0), Some(250));
//! assert_eq!(outputs.output(1).map(|led| led.0), Some(1000));
//! # Ok::<(), pwm_sequencer::Error>(())
//! ```

use embedded_hal::pwm::{Error as _, SetDutyCycle};
use heapless::Vec;

use crate::{CHANNEL_COUNT, ChannelIndex, DutyRegisterImage, Error, MAX_DUTY, Result};

/// Whether an output is active-high or active-low.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(not(feature = "host"), derive(defmt::Format))]
pub enum Polarity {
    /// Duty value is the active (high) time.
    #[default]
    Normal,
    /// Duty value is the low time, e.g. for an LED wired between the pin and 3.3V.
    Inverted,
}

impl Polarity {
    const fn apply(self, duty: u16) -> u16 {
        match self {
            Self::Normal => duty,
            Self::Inverted => MAX_DUTY.saturating_sub(duty),
        }
    }
}

struct BoundOutput<O> {
    output: O,
    polarity: Polarity,
    last_sent: Option<u16>,
}

/// Between 1 and [`CHANNEL_COUNT`] PWM outputs, one per channel in order.
pub struct PwmOutputs<O> {
    outputs: Vec<BoundOutput<O>, CHANNEL_COUNT>,
}

impl<O: SetDutyCycle> PwmOutputs<O> {
    /// Bind outputs to channels 0, 1, … and drive each to duty 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputCount`] unless 1 to [`CHANNEL_COUNT`] outputs are given, and
    /// [`Error::HardwareInit`] if an output rejects its initial duty value.
    pub fn new(outputs: impl IntoIterator<Item = (O, Polarity)>) -> Result<Self> {
        let mut outputs = outputs.into_iter();
        let mut bound = Vec::new();
        for (output, polarity) in outputs.by_ref().take(CHANNEL_COUNT) {
            bound
                .push(BoundOutput {
                    output,
                    polarity,
                    last_sent: None,
                })
                .map_err(|_| Error::OutputCount(CHANNEL_COUNT.saturating_add(1)))?;
        }
        // Surplus outputs are only counted, so the error reports the real number.
        let surplus = outputs.count();
        if bound.is_empty() || surplus > 0 {
            return Err(Error::OutputCount(bound.len().saturating_add(surplus)));
        }

        let mut this = Self { outputs: bound };
        for bound_output in &mut this.outputs {
            bound_output
                .send(0)
                .map_err(Error::HardwareInit)?;
        }
        Ok(this)
    }

    /// Number of bound outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no outputs are bound (never true for a successfully built value).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Write every bound channel's current duty value to its output.
    ///
    /// Outputs whose value has not changed since the last call are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Output`] for the first output that rejects its duty value; later
    /// outputs are not written in that call.
    pub fn transmit(&mut self, image: &DutyRegisterImage) -> Result<()> {
        for (channel, bound_output) in ChannelIndex::ALL.into_iter().zip(self.outputs.iter_mut()) {
            let duty = image.get(channel);
            if bound_output.last_sent != Some(duty) {
                bound_output.send(duty).map_err(Error::Output)?;
            }
        }
        Ok(())
    }

    /// The output bound to `channel`, if any.
    #[must_use]
    pub fn output(&self, channel: usize) -> Option<&O> {
        self.outputs.get(channel).map(|bound_output| &bound_output.output)
    }
}

impl<O: SetDutyCycle> BoundOutput<O> {
    fn send(&mut self, duty: u16) -> core::result::Result<(), embedded_hal::pwm::ErrorKind> {
        let level = self.polarity.apply(duty.min(MAX_DUTY));
        self.output
            .set_duty_cycle_fraction(level, MAX_DUTY)
            .map_err(|err| err.kind())?;
        self.last_sent = Some(duty);
        Ok(())
    }
}
