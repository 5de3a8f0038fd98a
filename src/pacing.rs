//! Period timing: keeping the update locked to the PWM wrap, and the slice clock divider.
//!
//! The PWM compare registers are double-buffered and latch at the slice wrap, so one write
//! per period anywhere inside the period reaches the pins for exactly one period. The
//! player therefore schedules its update half a period after a known wrap and keeps that
//! phase for as long as it runs.
//!
//! [`PeriodPacer`] does the bookkeeping in plain microseconds so it can be exercised off
//! the board. When the player wakes late it still advances the sequencer only once, then
//! skips to the next slot in phase instead of catching up with back-to-back updates that
//! the hardware would never latch.
//!
//! ```rust
//! use pwm_sequencer::pacing::PeriodPacer;
//!
//! // Wrap seen at t = 1_000 µs, 20 ms period: updates at 11_000, 31_000, 51_000, …
//! let mut pacer = PeriodPacer::after_wrap(1_000, 20_000);
//! assert_eq!(pacer.deadline(), 11_000);
//! assert_eq!(pacer.tick(11_004), 0);
//! assert_eq!(pacer.deadline(), 31_000);
//!
//! // Woken 65 ms late: three wraps went by, the next slot keeps the phase.
//! assert_eq!(pacer.tick(96_000), 3);
//! assert_eq!(pacer.deadline(), 111_000);
//! ```

/// PWM tick rate the slices are configured for: one duty unit per microsecond.
pub const TICK_HZ: u64 = 1_000_000;

// Slice divider limits, in sixteenths: 1.0 ..= 255 + 15/16.
const MIN_DIVIDER_SIXTEENTHS: u64 = 16;
const MAX_DIVIDER_SIXTEENTHS: u64 = 0x0FFF;

/// Slice clock divider, in sixteenths (8.4 fixed point), that turns `clk_sys_hz` into
/// [`TICK_HZ`], rounded to the nearest sixteenth.
///
/// At 125 MHz this is exactly `125.0`. At clocks that are not a whole number of MHz the
/// fractional part keeps the period within 0.1% of 20 ms for any clock above 32 MHz, where
/// an integer divider alone can be off by a few percent. Clocks above ~255.9 MHz saturate
/// at the largest divider.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    reason = "clamped to MAX_DIVIDER_SIXTEENTHS, which fits in u16"
)]
pub fn divider_sixteenths(clk_sys_hz: u32) -> u16 {
    let sixteenths = u64::from(clk_sys_hz)
        .saturating_mul(16)
        .saturating_add(TICK_HZ / 2)
        / TICK_HZ;
    sixteenths.clamp(MIN_DIVIDER_SIXTEENTHS, MAX_DIVIDER_SIXTEENTHS) as u16
}

/// Deadlines for one update per period, at a fixed phase from the PWM wrap.
///
/// Times are microseconds on any monotonic clock (on the board, `embassy_time::Instant`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PeriodPacer {
    deadline: u64,
    period: u64,
}

impl PeriodPacer {
    /// Schedule updates half a period after each wrap, given the time `wrap_us` at which
    /// a wrap was observed.
    ///
    /// A `period_us` of 0 is treated as 1.
    #[must_use]
    pub const fn after_wrap(wrap_us: u64, period_us: u64) -> Self {
        let period = if period_us == 0 { 1 } else { period_us };
        Self {
            deadline: wrap_us.saturating_add(period / 2),
            period,
        }
    }

    /// When the next update is due.
    #[must_use]
    pub const fn deadline(&self) -> u64 {
        self.deadline
    }

    /// The period length.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Record one update performed at `now_us` and move to the next slot.
    ///
    /// Returns the number of wraps that passed between the deadline and `now_us`, i.e.
    /// how many periods the previous duty values stayed on the pins longer than planned.
    /// Those slots are not replayed: the next deadline is the first slot after the wrap
    /// that latches this update, in phase with the original wrap, so no period ever gets
    /// two updates.
    pub fn tick(&mut self, now_us: u64) -> u64 {
        let missed = now_us
            .saturating_sub(self.deadline)
            .saturating_add(self.period / 2)
            .checked_div(self.period)
            .unwrap_or(0);
        self.deadline = self
            .deadline
            .saturating_add(missed.saturating_add(1).saturating_mul(self.period));
        missed
    }
}
