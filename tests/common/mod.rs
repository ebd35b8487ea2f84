#![allow(dead_code)]

use smfseq::prelude::*;

/// Route `tracing` output through the test harness. Filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assemble a file from a format, a ticks-per-quarter-note division and track bodies.
pub fn smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    smf_with_count(format, tracks.len() as u16, division, tracks)
}

/// Like [`smf`], but with an explicit (possibly wrong) track count in the header.
pub fn smf_with_count(format: u16, count: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&count.to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for body in tracks {
        bytes.extend_from_slice(&track_chunk(body, body.len() as u32));
    }
    bytes
}

/// An `MTrk` chunk whose declared length may differ from the body.
pub fn track_chunk(body: &[u8], declared: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&declared.to_be_bytes());
    bytes.extend_from_slice(body);
    bytes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Played {
    Channel { track: u8, bytes: Vec<u8> },
    SysEx { track: u8, data: Vec<u8> },
}

/// Records every event with the clock reading at delivery.
pub struct Recorder {
    clock: ManualClock,
    pub events: Vec<(UMicros, Played)>,
}

impl Recorder {
    pub fn new(clock: &ManualClock) -> Self {
        Self {
            clock: clock.clone(),
            events: Vec::new(),
        }
    }

    pub fn played(&self) -> Vec<Played> {
        self.events.iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn channel_bytes(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|(_, p)| match p {
                Played::Channel { bytes, .. } => Some(bytes.clone()),
                Played::SysEx { .. } => None,
            })
            .collect()
    }

    /// Clock reading (in ms) when the first event with these wire bytes played
    pub fn ms_of(&self, wanted: &[u8]) -> Option<u64> {
        self.events.iter().find_map(|(at, p)| match p {
            Played::Channel { bytes, .. } if bytes == wanted => Some(at.us() / 1_000),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for Recorder {
    fn on_channel_event(&mut self, event: &ChannelEvent) {
        self.events.push((
            self.clock.now(),
            Played::Channel {
                track: event.track(),
                bytes: event.wire_bytes().to_vec(),
            },
        ));
    }

    fn on_sysex_event(&mut self, event: &SysExEvent) {
        self.events.push((
            self.clock.now(),
            Played::SysEx {
                track: event.track(),
                data: event.data().to_vec(),
            },
        ));
    }
}

pub type TestSequencer = Sequencer<MemoryStorage, Recorder, ManualClock>;

/// A sequencer over a single in-memory file named `song.mid`.
pub fn sequencer(bytes: Vec<u8>, config: SequencerConfig) -> (TestSequencer, ManualClock) {
    init_tracing();
    let clock = ManualClock::new();
    let mut storage = MemoryStorage::new();
    storage.insert("song.mid", bytes);
    let seq = Sequencer::new(storage, Recorder::new(&clock), clock.clone(), config);
    (seq, clock)
}

/// Poll once per millisecond for `ms` milliseconds, stopping early at end of file.
pub fn run_for(seq: &mut TestSequencer, clock: &ManualClock, ms: u64) {
    for _ in 0..ms {
        if seq.is_eof() {
            break;
        }
        clock.advance(UMicros::from_ms(1));
        seq.get_next_event();
    }
}

/// Poll once per millisecond without looking at end of file.
pub fn poll_for(seq: &mut TestSequencer, clock: &ManualClock, ms: u64) {
    for _ in 0..ms {
        clock.advance(UMicros::from_ms(1));
        seq.get_next_event();
    }
}

pub const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];
