#![allow(missing_docs)]
//! Host-level tests for the period update and the configuration API.

use pwm_sequencer::{
    ChannelState, Error, INFINITE_PASSES, MAX_DUTY, Mode, PwmSequencer, WaveformLibrary,
    waveform::{FADE_LEN, PULSE_FAST_LEN},
};

static RAMP: [u16; 3] = [100, 200, 300];

fn advance(sequencer: &PwmSequencer<'_>, periods: usize) {
    for _ in 0..periods {
        sequencer.advance_one_period();
    }
}

#[test]
fn new_sequencer_is_constant_zero() {
    let sequencer = PwmSequencer::new();
    for channel in 0..4 {
        assert_eq!(
            sequencer.channel_state(channel).unwrap(),
            ChannelState {
                mode: Mode::Constant,
                position: 0,
                length: 0,
                remaining_passes: 0,
                last_value: 0,
            }
        );
    }
    assert_eq!(sequencer.duty_image().snapshot(), [0; 4]);
}

#[test]
fn constant_channels_are_untouched_by_period_update() {
    let sequencer = PwmSequencer::new();
    sequencer.set_constant(0, 1234).unwrap();
    sequencer.set_constant(2, MAX_DUTY).unwrap();
    let before = [0, 1, 2, 3].map(|channel| sequencer.channel_state(channel).unwrap());

    advance(&sequencer, 500);

    let after = [0, 1, 2, 3].map(|channel| sequencer.channel_state(channel).unwrap());
    assert_eq!(before, after);
    assert_eq!(sequencer.duty_image().snapshot(), [1234, 0, MAX_DUTY, 0]);
}

#[test]
fn set_constant_then_one_period_keeps_value() {
    let sequencer = PwmSequencer::new();
    sequencer.set_constant(3, 777).unwrap();
    let image = sequencer.duty_image();
    assert_eq!(image.snapshot()[3], 777);

    sequencer.advance_one_period();
    assert_eq!(image.snapshot()[3], 777);
}

#[test]
fn set_constant_clamps_to_max_duty() {
    let sequencer = PwmSequencer::new();
    sequencer.set_constant(0, u16::MAX).unwrap();
    sequencer.set_constant_fraction(1, 2.5).unwrap();
    sequencer.set_constant_fraction(2, -0.5).unwrap();
    sequencer.set_constant_fraction(3, f32::NAN).unwrap();
    assert_eq!(sequencer.duty_image().snapshot(), [MAX_DUTY, MAX_DUTY, 0, 0]);
}

#[test]
fn set_constant_fraction_scales_by_max_duty() {
    let sequencer = PwmSequencer::new();
    sequencer.set_constant_fraction(0, 0.5).unwrap();
    sequencer.set_constant_fraction(1, 0.25).unwrap();
    sequencer.set_constant_fraction(2, 1.0).unwrap();
    assert_eq!(
        sequencer.duty_image().snapshot(),
        [MAX_DUTY / 2, MAX_DUTY / 4, MAX_DUTY, 0]
    );
    assert_eq!(sequencer.channel_state(1).unwrap().last_value, MAX_DUTY / 4);
}

#[test]
fn set_sequence_waits_for_next_period() {
    let sequencer = PwmSequencer::new();
    sequencer.set_constant(0, 55).unwrap();
    sequencer.set_sequence(0, &RAMP, 1).unwrap();

    let state = sequencer.channel_state(0).unwrap();
    assert_eq!(state.mode, Mode::Sequence);
    assert_eq!(state.position, 0);
    assert_eq!(state.length, 3);
    assert_eq!(state.remaining_passes, 1);
    assert_eq!(state.last_value, 55);
    assert_eq!(sequencer.duty_image().snapshot()[0], 55);

    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], 100);
    assert_eq!(sequencer.channel_state(0).unwrap().position, 1);
}

#[test]
fn finite_passes_freeze_after_exactly_n_times_length_periods() {
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(1, &RAMP, 2).unwrap();

    advance(&sequencer, 5);
    let state = sequencer.channel_state(1).unwrap();
    assert_eq!(state.mode, Mode::Sequence);
    assert_eq!(state.position, 2);
    assert_eq!(state.remaining_passes, 1);
    assert_eq!(sequencer.duty_image().snapshot()[1], 200);

    sequencer.advance_one_period();
    let frozen = sequencer.channel_state(1).unwrap();
    assert_eq!(frozen.mode, Mode::Constant);
    assert_eq!(frozen.last_value, 300);
    assert_eq!(sequencer.duty_image().snapshot()[1], 300);

    advance(&sequencer, 100);
    assert_eq!(sequencer.channel_state(1).unwrap(), frozen);
    assert_eq!(sequencer.duty_image().snapshot()[1], 300);
}

#[test]
fn single_pass_plays_once_and_holds_final_sample() {
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(2, &RAMP, 1).unwrap();

    let mut played = Vec::new();
    for _ in 0..6 {
        sequencer.advance_one_period();
        played.push(sequencer.duty_image().snapshot()[2]);
    }
    assert_eq!(played, [100, 200, 300, 300, 300, 300]);
    assert_eq!(sequencer.channel_state(2).unwrap().mode, Mode::Constant);
}

#[test]
fn infinite_passes_loop_forever() {
    let sequencer = PwmSequencer::new();
    sequencer
        .set_sequence(0, &RAMP, INFINITE_PASSES)
        .unwrap();

    for pass in 1..=50 {
        advance(&sequencer, RAMP.len());
        let state = sequencer.channel_state(0).unwrap();
        assert_eq!(state.mode, Mode::Sequence, "pass {pass}");
        assert_eq!(state.position, 0, "pass {pass}");
        assert_eq!(state.remaining_passes, INFINITE_PASSES);
        assert_eq!(state.last_value, 300);
    }
}

#[test]
fn fade_in_reaches_full_scale_on_fiftieth_period() {
    let library = WaveformLibrary::generate();
    let sequencer = PwmSequencer::new();
    sequencer.fade_in(0, &library).unwrap();

    advance(&sequencer, FADE_LEN - 1);
    assert_eq!(sequencer.duty_image().snapshot()[0], MAX_DUTY / 50 * 49);
    assert_eq!(sequencer.channel_state(0).unwrap().mode, Mode::Sequence);

    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], MAX_DUTY);
    assert_eq!(sequencer.channel_state(0).unwrap().mode, Mode::Constant);
}

#[test]
fn fast_pulse_six_times_freezes_after_150_periods() {
    let library = WaveformLibrary::generate();
    let sequencer = PwmSequencer::new();
    sequencer.pulse_fast(1, &library, 6).unwrap();

    advance(&sequencer, 6 * PULSE_FAST_LEN - 1);
    let state = sequencer.channel_state(1).unwrap();
    assert_eq!(state.mode, Mode::Sequence);
    assert_eq!(state.remaining_passes, 1);
    assert_eq!(state.position, PULSE_FAST_LEN - 1);

    sequencer.advance_one_period();
    let state = sequencer.channel_state(1).unwrap();
    assert_eq!(state.mode, Mode::Constant);
    let pulse_fast = library.pulse_fast();
    assert_eq!(Some(state.last_value), pulse_fast.duty_at(PULSE_FAST_LEN - 1));
}

#[test]
fn fraction_sequences_are_scaled_and_truncated() {
    static LEVELS: [f32; 5] = [0.5, 0.25, 1.5, -1.0, f32::NAN];
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence_fraction(3, &LEVELS, 1).unwrap();

    let mut played = Vec::new();
    for _ in 0..LEVELS.len() {
        sequencer.advance_one_period();
        played.push(sequencer.duty_image().snapshot()[3]);
    }
    assert_eq!(played, [MAX_DUTY / 2, MAX_DUTY / 4, MAX_DUTY, 0, 0]);
}

#[test]
fn integer_samples_above_max_duty_are_clamped() {
    static LOUD: [u16; 2] = [MAX_DUTY + 1, u16::MAX];
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(0, &LOUD, INFINITE_PASSES).unwrap();

    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], MAX_DUTY);
    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], MAX_DUTY);
}

#[test]
fn channels_advance_independently() {
    static LONG: [u16; 5] = [1, 2, 3, 4, 5];
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(0, &RAMP, 1).unwrap();
    sequencer.set_sequence(1, &LONG, INFINITE_PASSES).unwrap();
    sequencer.set_constant(2, 42).unwrap();

    advance(&sequencer, 4);
    assert_eq!(sequencer.duty_image().snapshot(), [300, 4, 42, 0]);
    assert_eq!(sequencer.channel_state(0).unwrap().mode, Mode::Constant);
    assert_eq!(sequencer.channel_state(1).unwrap().position, 4);
}

#[test]
fn reprogramming_mid_sequence_restarts_from_first_sample() {
    static OTHER: [u16; 2] = [7, 8];
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(0, &RAMP, INFINITE_PASSES).unwrap();
    advance(&sequencer, 2);

    sequencer.set_sequence(0, &OTHER, 3).unwrap();
    let state = sequencer.channel_state(0).unwrap();
    assert_eq!(state.position, 0);
    assert_eq!(state.length, 2);
    assert_eq!(state.remaining_passes, 3);
    assert_eq!(state.last_value, 200);

    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], 7);
}

#[test]
fn set_constant_stops_a_running_sequence() {
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(1, &RAMP, INFINITE_PASSES).unwrap();
    advance(&sequencer, 1);

    sequencer.set_constant(1, 9).unwrap();
    advance(&sequencer, 10);
    assert_eq!(sequencer.channel_state(1).unwrap().mode, Mode::Constant);
    assert_eq!(sequencer.duty_image().snapshot()[1], 9);
}

#[test]
fn out_of_range_channel_is_rejected() {
    let sequencer = PwmSequencer::new();
    assert!(matches!(
        sequencer.set_constant(4, 1),
        Err(Error::InvalidChannel(4))
    ));
    assert!(matches!(
        sequencer.set_constant_fraction(usize::MAX, 0.5),
        Err(Error::InvalidChannel(usize::MAX))
    ));
    assert!(matches!(
        sequencer.set_sequence(7, &RAMP, 1),
        Err(Error::InvalidChannel(7))
    ));
    assert!(matches!(
        sequencer.set_sequence_fraction(4, &[0.5], 1),
        Err(Error::InvalidChannel(4))
    ));
    assert!(matches!(
        sequencer.channel_state(4),
        Err(Error::InvalidChannel(4))
    ));
    assert_eq!(sequencer.duty_image().snapshot(), [0; 4]);
}

#[test]
fn empty_sequence_is_rejected_and_channel_keeps_playing() {
    let sequencer = PwmSequencer::new();
    sequencer.set_sequence(0, &RAMP, INFINITE_PASSES).unwrap();
    advance(&sequencer, 1);
    let before = sequencer.channel_state(0).unwrap();

    assert!(matches!(
        sequencer.set_sequence(0, &[], 1),
        Err(Error::InvalidSequence)
    ));
    assert!(matches!(
        sequencer.set_sequence_fraction(0, &[], INFINITE_PASSES),
        Err(Error::InvalidSequence)
    ));
    assert_eq!(sequencer.channel_state(0).unwrap(), before);

    sequencer.advance_one_period();
    assert_eq!(sequencer.duty_image().snapshot()[0], 200);
}

#[test]
fn error_messages_name_the_problem() {
    assert_eq!(
        Error::InvalidChannel(9).to_string(),
        "channel 9 is out of range (0..4)"
    );
    assert_eq!(
        Error::InvalidSequence.to_string(),
        "sequence must contain at least one sample"
    );
}

#[test]
fn reconfiguration_from_another_thread_never_tears_a_channel() {
    static SHORT: [u16; 3] = [1, 2, 3];
    static LONG: [u16; 7] = [10, 20, 30, 40, 50, 60, 70];
    static SEQUENCER: PwmSequencer<'static> = PwmSequencer::new();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..2_000 {
                let samples: &'static [u16] = if round % 2 == 0 { &SHORT } else { &LONG };
                SEQUENCER.set_sequence(0, samples, 2).unwrap();
                SEQUENCER.set_constant(1, 5).unwrap();
            }
        });

        for _ in 0..20_000 {
            SEQUENCER.advance_one_period();
            let state = SEQUENCER.channel_state(0).unwrap();
            if state.mode == Mode::Sequence {
                assert!(state.length == SHORT.len() || state.length == LONG.len());
                assert!(state.position < state.length);
            }
            let duty = SEQUENCER.duty_image().snapshot()[0];
            assert!(duty == 0 || SHORT.contains(&duty) || LONG.contains(&duty));
        }
    });
}
