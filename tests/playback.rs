mod common;

use common::*;
use pretty_assertions::assert_eq;
use smfseq::prelude::*;

fn track(events: &[&[u8]]) -> Vec<u8> {
    let mut body: Vec<u8> = events.concat();
    body.extend_from_slice(&END_OF_TRACK);
    body
}

fn loaded(bytes: Vec<u8>, config: SequencerConfig) -> (TestSequencer, ManualClock) {
    let (mut seq, clock) = sequencer(bytes, config);
    seq.load("song.mid").unwrap();
    (seq, clock)
}

#[test]
fn nothing_happens_when_unloaded() {
    let (mut seq, clock) = sequencer(Vec::new(), SequencerConfig::default());
    clock.advance(UMicros::from_secs(1));
    assert!(!seq.get_next_event());
    assert!(seq.is_eof());
    seq.restart();
    seq.dump();
    assert!(!seq.get_next_event());
}

#[test]
fn reports_progress_once_per_tick() {
    let body = track(&[&[0x30, 0x90, 0x3C, 0x64]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    // the first call only synchronises with the clock
    clock.advance(UMicros::from_ms(1));
    assert!(!seq.get_next_event());

    clock.advance(UMicros::from_ms(5));
    assert!(!seq.get_next_event());
    clock.advance(UMicros::from_ms(6));
    assert!(seq.get_next_event());
    // a tick must pass again before the next report
    assert!(!seq.get_next_event());
}

#[test]
fn events_play_at_their_delta_times() {
    let body = track(&[&[0x00, 0x90, 0x3C, 0x64], &[0x30, 0x80, 0x3C, 0x00]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 2_000);
    assert!(seq.is_eof());

    let sink = seq.sink();
    assert!(sink.ms_of(&[0x90, 0x3C, 0x64]).unwrap() <= 12);
    let off = sink.ms_of(&[0x80, 0x3C, 0x00]).unwrap();
    assert!((500..=512).contains(&off), "note off at {off} ms");
}

#[test]
fn tempo_meta_changes_timing() {
    let body = track(&[
        &[0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40],
        &[0x30, 0x90, 0x3C, 0x64],
    ]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 3_000);
    assert_eq!(seq.tempo(), 60);
    assert_eq!(seq.micros_per_quarter_note(), 1_000_000);
    assert_eq!(seq.tick_time(), 20_833);

    let on = seq.sink().ms_of(&[0x90, 0x3C, 0x64]).unwrap();
    assert!((1_000..=1_022).contains(&on), "note on at {on} ms");
}

#[test]
fn time_signature_meta_is_tracked() {
    let body = track(&[&[0x00, 0xFF, 0x58, 0x04, 0x03, 0x03, 0x18, 0x08]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 100);
    assert_eq!(seq.time_signature(), TimeSignature::new(3, 8));
}

#[test]
fn sysex_continuation_packets_are_joined() {
    let body = track(&[
        &[0x00, 0xF0, 0x03, 0x43, 0x10, 0x4C],
        &[0x00, 0xF7, 0x02, 0x00, 0xF7],
    ]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 100);
    assert_eq!(
        seq.sink().played(),
        vec![Played::SysEx {
            track: 0,
            data: vec![0x43, 0x10, 0x4C, 0x00],
        }]
    );
}

#[test]
fn sysex_split_into_escape_packets() {
    let body = track(&[&[0x00, 0xF7, 0x02, 0x43, 0x10], &[0x00, 0xF7, 0x02, 0x4C, 0xF7]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 100);
    assert_eq!(
        seq.sink().played(),
        vec![Played::SysEx {
            track: 0,
            data: vec![0x43, 0x10, 0x4C],
        }]
    );
}

#[test]
fn truncated_track_stops_alone() {
    // the second note on is cut off by the chunk length
    let broken: &[u8] = &[0x00, 0x90, 0x3C, 0x64, 0x00, 0x90, 0x40];
    let healthy = track(&[&[0x00, 0xC1, 0x05], &[0x60, 0x91, 0x3C, 0x64]]);
    let (mut seq, clock) = loaded(smf(1, 48, &[broken, &healthy]), SequencerConfig::default());

    run_for(&mut seq, &clock, 100);
    assert!(seq.track(0).unwrap().is_end_of_track());
    assert!(!seq.track(1).unwrap().is_end_of_track());
    assert!(!seq.is_eof());

    run_for(&mut seq, &clock, 2_000);
    assert!(seq.is_eof());
    assert_eq!(
        seq.sink().played(),
        vec![
            Played::Channel {
                track: 0,
                bytes: vec![0x90, 0x3C, 0x64],
            },
            Played::Channel {
                track: 1,
                bytes: vec![0xC1, 0x05],
            },
            Played::Channel {
                track: 1,
                bytes: vec![0x91, 0x3C, 0x64],
            },
        ]
    );
}

fn simultaneous_programs() -> Vec<u8> {
    let t0 = track(&[&[0x00, 0xC0, 0x01], &[0x00, 0xC0, 0x02], &[0x00, 0xC0, 0x03]]);
    let t1 = track(&[&[0x00, 0xC1, 0x01], &[0x00, 0xC1, 0x02], &[0x00, 0xC1, 0x03]]);
    smf(1, 48, &[&t0, &t1])
}

#[test]
fn track_priority_drains_each_track_in_turn() {
    let (mut seq, clock) = loaded(simultaneous_programs(), SequencerConfig::default());
    assert_eq!(seq.merge_policy(), MergePolicy::TrackPriority);

    run_for(&mut seq, &clock, 50);
    assert_eq!(
        seq.sink().channel_bytes(),
        vec![
            vec![0xC0, 0x01],
            vec![0xC0, 0x02],
            vec![0xC0, 0x03],
            vec![0xC1, 0x01],
            vec![0xC1, 0x02],
            vec![0xC1, 0x03],
        ]
    );
}

#[test]
fn event_priority_interleaves_tracks() {
    let config = SequencerConfig::default().with_merge(MergePolicy::EventPriority);
    let (mut seq, clock) = loaded(simultaneous_programs(), config);

    run_for(&mut seq, &clock, 50);
    assert_eq!(
        seq.sink().channel_bytes(),
        vec![
            vec![0xC0, 0x01],
            vec![0xC1, 0x01],
            vec![0xC0, 0x02],
            vec![0xC1, 0x02],
            vec![0xC0, 0x03],
            vec![0xC1, 0x03],
        ]
    );
}

#[test]
fn bursts_are_bounded_per_call() {
    let mut events = vec![0x00, 0xC0, 0x00];
    for program in 1..150u8 {
        events.extend([0x00, program % 128]);
    }
    let body = track(&[events.as_slice()]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    clock.advance(UMicros::from_ms(1));
    seq.get_next_event();
    clock.advance(UMicros::from_ms(20));
    assert!(seq.get_next_event());
    assert_eq!(seq.sink().events.len(), 100);

    clock.advance(UMicros::from_ms(20));
    assert!(seq.get_next_event());
    assert_eq!(seq.sink().events.len(), 150);
    assert!(seq.is_eof());
}

#[test]
fn restart_replays_the_same_sequence() {
    let t0 = track(&[&[0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40], &[0x00, 0xC0, 0x07]]);
    let t1 = track(&[
        &[0x00, 0x91, 0x3C, 0x64],
        &[0x0C, 0x40, 0x64],
        &[0x0C, 0x81, 0x3C, 0x00],
        &[0x00, 0x40, 0x00],
    ]);
    let (mut seq, clock) = loaded(smf(1, 48, &[&t0, &t1]), SequencerConfig::default());

    // event times relative to the start of the run
    let timeline = |seq: &TestSequencer, start: UMicros| -> Vec<(u64, Played)> {
        seq.sink()
            .events
            .iter()
            .map(|(at, played)| (at.saturating_sub(start).us(), played.clone()))
            .collect()
    };

    let start = clock.now();
    run_for(&mut seq, &clock, 5_000);
    assert!(seq.is_eof());
    assert_eq!(seq.tempo(), 60);
    let first = timeline(&seq, start);
    assert_eq!(first.len(), 5);
    // 12 ticks at one second per quarter note
    assert!(first[2].0 >= 250_000);

    seq.restart();
    assert!(!seq.is_eof());
    assert_eq!(seq.tempo(), 120);
    assert!(seq.track(1).unwrap().running_status().is_none());
    seq.sink_mut().clear();

    let start = clock.now();
    run_for(&mut seq, &clock, 5_000);
    assert_eq!(timeline(&seq, start), first);
}

#[test]
fn status_byte_in_a_data_slot_stops_the_track() {
    let body = track(&[&[0x00, 0x90, 0x3C, 0x90], &[0x00, 0x80, 0x3C, 0x00]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    run_for(&mut seq, &clock, 100);
    assert!(seq.is_eof());
    assert!(seq.sink().events.is_empty());
}

#[test]
fn format_1_loop_skips_the_conductor_track() {
    let conductor = track(&[&[0x00, 0xC0, 0x05]]);
    let melody = track(&[&[0x00, 0x91, 0x3C, 0x64], &[0x18, 0x81, 0x3C, 0x00]]);
    let config = SequencerConfig::default().with_looping(true);
    let (mut seq, clock) = loaded(smf(1, 48, &[&conductor, &melody]), config);

    poll_for(&mut seq, &clock, 2_000);
    assert!(seq.is_looping());
    assert!(!seq.is_eof());

    let played = seq.sink().channel_bytes();
    let count = |bytes: &[u8]| played.iter().filter(|p| p.as_slice() == bytes).count();
    assert_eq!(count(&[0xC0, 0x05]), 1);
    assert!(count(&[0x91, 0x3C, 0x64]) >= 4);
}

#[test]
fn format_0_loop_replays_the_only_track() {
    let body = track(&[&[0x00, 0xC0, 0x05], &[0x18, 0x90, 0x3C, 0x64]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());
    seq.looping(true);

    poll_for(&mut seq, &clock, 2_000);
    let played = seq.sink().channel_bytes();
    let programs = played.iter().filter(|p| p.as_slice() == [0xC0, 0x05]).count();
    assert!(programs >= 4, "{programs} loops");

    seq.looping(false);
    run_for(&mut seq, &clock, 2_000);
    assert!(seq.is_eof());
}

#[test]
fn paused_time_is_not_charged() {
    let body = track(&[&[0x30, 0x90, 0x3C, 0x64]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    poll_for(&mut seq, &clock, 200);
    seq.pause(true);
    assert!(seq.is_paused());
    assert!(!seq.get_next_event());

    poll_for(&mut seq, &clock, 1_000);
    assert!(seq.sink().events.is_empty());
    assert!(!seq.is_eof());

    seq.pause(false);
    let resumed = clock.now().us() / 1_000;
    run_for(&mut seq, &clock, 2_000);

    let on = seq.sink().ms_of(&[0x90, 0x3C, 0x64]).unwrap();
    assert!(
        (resumed + 500..=resumed + 520).contains(&on),
        "resumed at {resumed} ms, note on at {on} ms"
    );
}

#[test]
fn tempo_adjust_is_reversible() {
    let body = track(&[&[0x30, 0x90, 0x3C, 0x64]]);
    let (mut seq, clock) = loaded(smf(0, 48, &[&body]), SequencerConfig::default());

    seq.set_tempo_adjust(120);
    assert_eq!(seq.tick_time(), 5_208);
    assert_eq!(seq.tempo(), 120);
    seq.set_tempo_adjust(0);
    assert_eq!(seq.tick_time(), 10_416);

    seq.set_tempo_adjust(120);
    run_for(&mut seq, &clock, 2_000);
    let on = seq.sink().ms_of(&[0x90, 0x3C, 0x64]).unwrap();
    assert!((250..=260).contains(&on), "note on at {on} ms");
}

#[test]
fn configured_tempo_adjust_survives_load() {
    let config = SequencerConfig::default().with_tempo_adjust(-60);
    let (seq, _clock) = loaded(smf(0, 48, &[&END_OF_TRACK]), config);

    assert_eq!(seq.tempo_adjust(), -60);
    assert_eq!(seq.tick_time(), 20_833);
    assert_eq!(seq.time_base().effective_tempo(), 60);
}

#[test]
fn manual_overrides_and_state() {
    let (mut seq, _clock) = loaded(smf(0, 96, &[&END_OF_TRACK]), SequencerConfig::default());

    seq.set_tempo(60);
    assert_eq!(seq.micros_per_quarter_note(), 1_000_000);
    seq.set_micros_per_quarter_note(480_000);
    seq.set_ticks_per_quarter_note(480);
    assert_eq!(seq.tick_time(), 1_000);
    seq.set_time_signature(7, 8);
    seq.set_merge_policy(MergePolicy::EventPriority);
    seq.dump();

    let state = seq.state();
    assert_eq!(state.tempo, 125);
    assert_eq!(state.micros_per_quarter_note, 480_000);
    assert_eq!(state.ticks_per_quarter_note, 480);
    assert_eq!(state.micros_per_tick, 1_000);
    assert_eq!(state.time_signature, TimeSignature::new(7, 8));
    assert_eq!(state.file_name, "song.mid");
    assert!(!state.paused);
    assert_eq!(seq.merge_policy(), MergePolicy::EventPriority);
}
