#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pwm::Pwm;
use embassy_time::Timer;
use pwm_sequencer::{
    INFINITE_PASSES, MAX_DUTY, Polarity, PwmOutputs, PwmSequencer, Result, WaveformLibrary,
    pwm_player::{PwmPlayer, pwm_config, wait_for_wrap},
};
use static_cell::StaticCell;
use {defmt::info, defmt_rtt as _, panic_probe as _};

static SEQUENCER: PwmSequencer<'static> = PwmSequencer::new();
static LIBRARY: StaticCell<WaveformLibrary> = StaticCell::new();

// The player runs here, above the thread-mode demo loop.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[allow(unsafe_code, reason = "interrupt handler entry point")]
#[interrupt]
unsafe fn SWI_IRQ_1() {
    // SAFETY: SWI_IRQ_1 is used only by EXECUTOR_HIGH.
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

// A quick blink written as fractions of full scale.
static BLINK: [f32; 8] = [0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25, 0.0];

#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let err = inner_main().await.unwrap_err();
    panic!("{err}");
}

async fn inner_main() -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());
    let library = LIBRARY.init(WaveformLibrary::generate());

    // LEDs on GPIO 16..=19 (slices 0 and 1). GPIO 19's LED is wired to 3.3V, so it is inverted.
    info!("Starting PWM sequencer demo (GPIO 16-19)");
    let mut slice0 = Pwm::new_output_ab(p.PWM_SLICE0, p.PIN_16, p.PIN_17, pwm_config());
    let slice1 = Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_18, p.PIN_19, pwm_config());
    let wrap = wait_for_wrap(&mut slice0);
    let (out0, out1) = slice0.split();
    let (out2, out3) = slice1.split();
    let outputs = PwmOutputs::new(
        [
            (out0, Polarity::Normal),
            (out1, Polarity::Normal),
            (out2, Polarity::Normal),
            (out3, Polarity::Inverted),
        ]
        .into_iter()
        .filter_map(|(output, polarity)| Some((output?, polarity))),
    )?;
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_priority = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    let player = PwmPlayer::new(&SEQUENCER, outputs, wrap, high_priority)?;

    player.set_constant(0, MAX_DUTY / 2)?;
    player.pulse_slow(1, library, INFINITE_PASSES)?;
    player.set_sequence_fraction(2, &BLINK, 6)?;
    player.fade_in(3, library)?;

    loop {
        Timer::after_secs(5).await;
        info!("fade out / pulse fast x6");
        player.fade_out(3, library)?;
        player.pulse_fast(0, library, 6)?;

        Timer::after_secs(5).await;
        info!("fade in / constant");
        player.fade_in(3, library)?;
        player.set_constant_fraction(0, 0.5)?;
    }
}
