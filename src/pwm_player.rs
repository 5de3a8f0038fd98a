//! A device abstraction that plays a [`PwmSequencer`] on up to four Pico PWM outputs.
//!
//! A background task advances the sequencer one sample per PWM period and writes the
//! resulting duty values to the outputs. Application code keeps reprogramming channels
//! through the [`PwmPlayer`] handle, which derefs to the sequencer.
//!
//! # Period timing
//!
//! The task is phase-locked to the PWM wrap: [`wait_for_wrap`] observes one wrap of a
//! slice, and the task then wakes half a period after every wrap (see
//! [`PeriodPacer`]). Compare registers latch at the wrap, so each write is on the pins for
//! exactly one period. A late wake-up never produces a burst of updates; the skipped
//! periods are logged and the task carries on in phase.
//!
//! Spawn the player on an `InterruptExecutor` so application code cannot delay it.
//!
//! # PWM Slices
//!
//! Each [PWM slice](https://www.raspberrypi.com/documentation/microcontrollers/silicon.html)
//! drives two pins (A and B). Configure every slice used here with [`pwm_config`] so one
//! duty unit is one microsecond and a period is [`MAX_DUTY`] units (20 ms). Slices
//! created one after another wrap within microseconds of each other, far inside the
//! half-period margin.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! # use panic_probe as _;
//! use embassy_executor::SendSpawner;
//! use embassy_rp::pwm::Pwm;
//! use pwm_sequencer::pwm_player::{PwmPlayer, pwm_config, wait_for_wrap};
//! use pwm_sequencer::{Polarity, PwmOutputs, PwmSequencer, Result, WaveformLibrary};
//! use static_cell::StaticCell;
//!
//! static SEQUENCER: PwmSequencer<'static> = PwmSequencer::new();
//! static LIBRARY: StaticCell<WaveformLibrary> = StaticCell::new();
//!
//! async fn example(high_priority: SendSpawner) -> Result<()> {
//!     let p = embassy_rp::init(Default::default());
//!     let library = LIBRARY.init(WaveformLibrary::generate());
//!
//!     let mut pwm = Pwm::new_output_ab(p.PWM_SLICE0, p.PIN_16, p.PIN_17, pwm_config());
//!     let wrap = wait_for_wrap(&mut pwm);
//!     let (a, b) = pwm.split();
//!     let outputs = PwmOutputs::new(
//!         [(a, Polarity::Normal), (b, Polarity::Inverted)]
//!             .into_iter()
//!             .filter_map(|(output, polarity)| Some((output?, polarity))),
//!     )?;
//!     let player = PwmPlayer::new(&SEQUENCER, outputs, wrap, high_priority)?;
//!
//!     player.pulse_slow(0, library, 10)?;
//!     player.fade_in(1, library)?;
//!     Ok(())
//! }
//! ```

use core::ops::Deref;

use defmt::{info, warn};
use embassy_executor::SendSpawner;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm, PwmOutput};
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::pwm::SetDutyCycle;
use fixed::FixedU16;
use fixed::types::extra::U4;

use crate::pacing::{PeriodPacer, divider_sixteenths};
use crate::{Error, MAX_DUTY, PwmOutputs, PwmSequencer, Result};

/// PWM period: [`MAX_DUTY`] ticks of one microsecond.
pub const PERIOD: Duration = Duration::from_micros(MAX_DUTY as u64);

/// PWM slice configuration for the sequencer: 1 µs ticks, [`MAX_DUTY`] ticks per period.
///
/// The divider keeps its fractional part, so the period stays at 20 ms for system clocks
/// that are not a whole number of MHz. Outputs start at duty 0; the player writes real
/// values on its first period.
#[must_use]
pub fn pwm_config() -> Config {
    let clk = clk_sys_freq(); // Hz
    let divider = divider_sixteenths(clk);

    let mut cfg = Config::default();
    cfg.top = MAX_DUTY - 1; // 19999 -> 20_000 ticks/period
    cfg.phase_correct = false; // edge-aligned => exact 1 µs steps
    cfg.divider = FixedU16::<U4>::from_bits(divider);
    cfg.compare_a = 0;
    cfg.compare_b = 0;
    cfg.enable = true;

    info!("pwm_config clk={}Hz div={}/16 top={}", clk, divider, cfg.top);
    cfg
}

/// Busy-wait for the next wrap of `pwm`'s slice and return when it happened.
///
/// Blocks for at most one [`PERIOD`]. Call it once, before splitting the slice, and pass
/// the result to [`PwmPlayer::new`].
pub fn wait_for_wrap(pwm: &mut Pwm<'_>) -> Instant {
    pwm.clear_wrapped();
    while !pwm.wrapped() {
        core::hint::spin_loop();
    }
    let wrap = Instant::now();
    pwm.clear_wrapped();
    wrap
}

/// Handle to a running PWM player.
///
/// Derefs to [`PwmSequencer`], so all configuration methods
/// ([`set_constant`](PwmSequencer::set_constant), [`set_sequence`](PwmSequencer::set_sequence),
/// [`pulse_slow`](PwmSequencer::pulse_slow), …) are available directly.
///
/// See the [module documentation](mod@crate::pwm_player) for usage.
#[derive(Clone, Copy)]
pub struct PwmPlayer {
    sequencer: &'static PwmSequencer<'static>,
}

impl PwmPlayer {
    /// Start playing `sequencer` on `outputs`, one update per period, half a period after
    /// each wrap of the slice `wrap` was taken from (see [`wait_for_wrap`]).
    ///
    /// Pass the spawner of a high-priority `InterruptExecutor`. A thread-mode
    /// `Spawner::make_send()` also works, but then any task that holds the executor for
    /// more than half a period costs samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskSpawn`] if the background task is already running.
    pub fn new(
        sequencer: &'static PwmSequencer<'static>,
        outputs: PwmOutputs<PwmOutput<'static>>,
        wrap: Instant,
        spawner: SendSpawner,
    ) -> Result<Self> {
        let output_count = outputs.len();
        let pacer = PeriodPacer::after_wrap(wrap.as_micros(), PERIOD.as_micros());
        let token = pwm_player_task(sequencer, outputs, pacer);
        spawner.spawn(token).map_err(Error::TaskSpawn)?;
        info!(
            "PwmPlayer::new: {} outputs, period {} us",
            output_count,
            PERIOD.as_micros()
        );
        Ok(Self { sequencer })
    }
}

impl Deref for PwmPlayer {
    type Target = PwmSequencer<'static>;

    fn deref(&self) -> &Self::Target {
        self.sequencer
    }
}

#[embassy_executor::task]
async fn pwm_player_task(
    sequencer: &'static PwmSequencer<'static>,
    outputs: PwmOutputs<PwmOutput<'static>>,
    pacer: PeriodPacer,
) -> ! {
    device_loop(sequencer, outputs, pacer).await
}

/// Advance and transmit once per period at the deadlines `pacer` gives, forever.
///
/// Public so callers with their own [`SetDutyCycle`] outputs can run it in their own task.
pub async fn device_loop<O: SetDutyCycle>(
    sequencer: &PwmSequencer<'_>,
    mut outputs: PwmOutputs<O>,
    mut pacer: PeriodPacer,
) -> ! {
    info!("pwm player: device loop started");
    loop {
        Timer::at(Instant::from_micros(pacer.deadline())).await;
        let now = Instant::now();
        sequencer.advance_one_period();
        if let Err(err) = outputs.transmit(sequencer.duty_image()) {
            warn!("pwm player: {}", defmt::Display2Format(&err));
        }
        let missed = pacer.tick(now.as_micros());
        if missed > 0 {
            warn!("pwm player: woke {} period(s) late, resynced", missed);
        }
    }
}
