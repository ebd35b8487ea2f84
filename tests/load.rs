mod common;

use common::*;
use pretty_assertions::assert_eq;
use smfseq::prelude::*;

fn load_code(bytes: Vec<u8>) -> i32 {
    let (mut seq, _clock) = sequencer(bytes, SequencerConfig::default());
    let err = seq.load("song.mid").unwrap_err();
    assert!(!seq.is_loaded());
    assert!(seq.is_eof());
    assert_eq!(seq.track_count(), 0);
    err.code()
}

#[test]
fn loads_a_format_1_file() {
    let (mut seq, _clock) = sequencer(
        smf(1, 96, &[&END_OF_TRACK, &[0x00, 0x90, 0x3C, 0x64]]),
        SequencerConfig::default(),
    );
    seq.load("song.mid").unwrap();

    assert!(seq.is_loaded());
    assert!(!seq.is_eof());
    assert_eq!(seq.format(), Some(Format::Simultaneous));
    assert_eq!(seq.track_count(), 2);
    assert_eq!(seq.file_name(), "song.mid");
    assert_eq!(seq.ticks_per_quarter_note(), 96);
    assert_eq!(seq.tempo(), 120);
    assert_eq!(seq.tick_time(), 5_208);
    assert_eq!(seq.time_signature(), TimeSignature::new(4, 4));
    assert_eq!(seq.track(1).map(|t| t.chunk().length), Some(4));
    assert!(seq.track(2).is_none());
}

#[test]
fn blank_and_missing_names() {
    let (mut seq, _clock) = sequencer(smf(0, 48, &[&END_OF_TRACK]), SequencerConfig::default());

    let err = seq.load("").unwrap_err();
    assert!(matches!(err, LoadError::BlankName));
    assert_eq!(err.code(), 0);
    assert!(matches!(seq.load("   "), Err(LoadError::BlankName)));

    let err = seq.load("nope.mid").unwrap_err();
    assert!(matches!(err, LoadError::Open(StorageError::NotFound)));
    assert_eq!(err.code(), 2);
}

#[test]
fn header_problems_have_distinct_codes() {
    let mut riff = smf(0, 48, &[&END_OF_TRACK]);
    riff[..4].copy_from_slice(b"RIFF");
    assert_eq!(load_code(riff), 3);
    assert_eq!(load_code(b"MTh".to_vec()), 3);

    let mut long_header = smf(0, 48, &[&END_OF_TRACK]);
    long_header[7] = 8;
    assert_eq!(load_code(long_header), 4);

    assert_eq!(load_code(smf(2, 48, &[&END_OF_TRACK])), 5);
    assert_eq!(load_code(smf(0, 0xE728, &[&END_OF_TRACK])), 5);
    assert_eq!(load_code(smf(0, 48, &[&END_OF_TRACK, &END_OF_TRACK])), 6);
    assert_eq!(load_code(smf_with_count(1, 0, 48, &[])), 8);
}

#[test]
fn too_many_tracks_initializes_nothing() {
    let bodies = [END_OF_TRACK; 17];
    let refs: Vec<&[u8]> = bodies.iter().map(|b| b.as_slice()).collect();
    let (mut seq, _clock) = sequencer(smf(1, 48, &refs), SequencerConfig::default());

    let err = seq.load("song.mid").unwrap_err();
    assert!(matches!(err, LoadError::TooManyTracks(17)));
    assert_eq!(err.code(), 7);
    assert_eq!(seq.track_count(), 0);
    assert!(seq.track(0).is_none());
    assert!(!seq.get_next_event());
}

#[test]
fn track_chunk_problems_carry_the_track_number() {
    let mut bytes = smf_with_count(1, 3, 48, &[&END_OF_TRACK, &END_OF_TRACK]);
    bytes.extend_from_slice(b"XXXX");
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    assert_eq!(load_code(bytes), 20);

    let mut bytes = smf_with_count(1, 2, 48, &[&END_OF_TRACK]);
    bytes.extend(track_chunk(&END_OF_TRACK, 40));
    assert_eq!(load_code(bytes), 11);
}

#[test]
fn failed_load_unloads_the_previous_file() {
    let (mut seq, _clock) = sequencer(smf(0, 48, &[&END_OF_TRACK]), SequencerConfig::default());
    seq.storage_mut().insert("bad.mid", b"not a midi file".to_vec());

    seq.load("song.mid").unwrap();
    assert!(seq.is_loaded());

    assert_eq!(seq.load("bad.mid").unwrap_err().code(), 3);
    assert!(!seq.is_loaded());
    assert_eq!(seq.file_name(), "");
    assert!(!seq.get_next_event());

    // and a good file loads straight after
    seq.load("song.mid").unwrap();
    assert_eq!(seq.track_count(), 1);
}

#[test]
fn loading_replaces_the_current_file() {
    let (mut seq, _clock) = sequencer(smf(0, 48, &[&END_OF_TRACK]), SequencerConfig::default());
    seq.storage_mut()
        .insert("other.mid", smf(1, 120, &[&END_OF_TRACK, &END_OF_TRACK]));

    seq.load("song.mid").unwrap();
    seq.load("other.mid").unwrap();
    assert_eq!(seq.file_name(), "other.mid");
    assert_eq!(seq.track_count(), 2);
    assert_eq!(seq.ticks_per_quarter_note(), 120);

    seq.close();
    assert!(!seq.is_loaded());
    assert!(seq.is_eof());
    assert_eq!(seq.ticks_per_quarter_note(), 48);
}

#[test]
fn zero_division_falls_back_to_48() {
    let (mut seq, _clock) = sequencer(smf(0, 0, &[&END_OF_TRACK]), SequencerConfig::default());
    seq.load("song.mid").unwrap();
    assert_eq!(seq.ticks_per_quarter_note(), 48);
    assert_eq!(seq.tick_time(), 10_416);
}

#[test]
fn loads_from_the_filesystem() {
    init_tracing();
    let dir = std::env::temp_dir().join(format!("smfseq-load-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("disk.mid"),
        smf(0, 48, &[&[0x00, 0x90, 0x3C, 0x64, 0x00, 0xFF, 0x2F, 0x00]]),
    )
    .unwrap();

    let clock = ManualClock::new();
    let mut seq = Sequencer::new(
        FsStorage::new(&dir),
        Recorder::new(&clock),
        clock.clone(),
        SequencerConfig::default(),
    );
    assert!(matches!(
        seq.load("missing.mid"),
        Err(LoadError::Open(StorageError::NotFound))
    ));
    seq.load("disk.mid").unwrap();
    for _ in 0..50 {
        clock.advance(UMicros::from_ms(1));
        seq.get_next_event();
    }
    assert!(seq.is_eof());
    assert_eq!(seq.sink().channel_bytes(), vec![vec![0x90, 0x3C, 0x64]]);

    std::fs::remove_dir_all(&dir).unwrap();
}
