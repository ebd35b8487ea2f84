#![doc = r#"
Real-time playback of a loaded file

The [`Sequencer`] owns everything a playback session needs: the storage device
and the open file, one [`TrackCursor`] per track, the [`TimeBase`], a [`Clock`]
and the [`EventSink`]. The host calls [`Sequencer::get_next_event`] as often as
it can; each call looks at the clock, lets due events through and returns.

```text
get_next_event
 ├─ paused or nothing loaded?            → false
 ├─ first call after load/resume/restart → re-sync clock and cursors
 ├─ less than one tick since last call?  → false (time keeps accumulating)
 ├─ visit tracks by MergePolicy, decode due events, feed the sink
 ├─ all tracks ended and looping?        → re-arm tracks
 └─ true
```
"#]

mod config;
pub use config::*;

mod sink;
pub use sink::*;

use crate::{
    UMicros,
    clock::Clock,
    file::{
        DEFAULT_TICKS_PER_QUARTER_NOTE, Format, LoadError, MAX_TRACKS, SmfHeader, SmfLayout,
        TimeBase, TimeSignature,
    },
    message::{ChannelEvent, SysExEvent},
    storage::{Storage, StorageFile},
    track::{TrackContext, TrackCursor},
};
use alloc::string::String;

/// A snapshot of the playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState<'a> {
    /// Base tempo in beats per minute
    pub tempo: u16,
    /// Base tempo as microseconds per quarter note
    pub micros_per_quarter_note: u32,
    /// Ticks per quarter note
    pub ticks_per_quarter_note: u16,
    /// Current time signature
    pub time_signature: TimeSignature,
    /// Tempo adjustment in beats per minute
    pub tempo_adjust: i16,
    /// Derived tick length
    pub micros_per_tick: u32,
    /// Event delivery suspended
    pub paused: bool,
    /// Restart automatically at the end
    pub looping: bool,
    /// Name of the loaded file, empty when nothing is loaded
    pub file_name: &'a str,
}

/// The services a cursor borrows for one call.
struct Session<'a, F: ?Sized, K> {
    file: &'a mut F,
    time: &'a mut TimeBase,
    sink: &'a mut K,
}

impl<F: StorageFile + ?Sized, K: EventSink> TrackContext for Session<'_, F, K> {
    type File = F;

    fn file(&mut self) -> &mut F {
        self.file
    }

    fn time_base(&self) -> &TimeBase {
        self.time
    }

    fn set_micros_per_quarter_note(&mut self, micros: u32) {
        self.time.set_micros_per_quarter_note(micros);
    }

    fn set_time_signature(&mut self, signature: TimeSignature) {
        self.time.set_time_signature(signature);
    }

    fn channel_event(&mut self, event: &ChannelEvent) {
        self.sink.on_channel_event(event);
    }

    fn sysex_event(&mut self, event: &SysExEvent) {
        self.sink.on_sysex_event(event);
    }
}

#[doc = r#"
Plays a Standard MIDI File in real time

# Example
```rust
# use smfseq::prelude::*;
#[derive(Default)]
struct Count(usize);

impl EventSink for Count {
    fn on_channel_event(&mut self, _: &ChannelEvent) {
        self.0 += 1;
    }
}

let mut storage = MemoryStorage::new();
storage.insert(
    "two_notes.mid",
    [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 48,
        b'M', b'T', b'r', b'k', 0, 0, 0, 12,
        0x00, 0x90, 0x3C, 0x64,
        0x30, 0x3C, 0x00,        // running status, one quarter note later
        0x00, 0xFF, 0x2F, 0x00,
        0x00,
    ],
);

let clock = ManualClock::new();
let mut seq = Sequencer::new(storage, Count::default(), clock.clone(), SequencerConfig::default());
seq.load("two_notes.mid").unwrap();
assert_eq!(seq.tick_time(), 10_416);

seq.get_next_event(); // syncs to the clock
clock.advance(UMicros::from_ms(20));
assert!(seq.get_next_event());
assert_eq!(seq.sink().0, 1);

clock.advance(UMicros::from_ms(500));
seq.get_next_event();
assert_eq!(seq.sink().0, 2);
assert!(seq.is_eof());
```
"#]
pub struct Sequencer<S: Storage, K, C> {
    storage: S,
    sink: K,
    clock: C,
    config: SequencerConfig,
    file: Option<S::File>,
    file_name: String,
    header: Option<SmfHeader>,
    tracks: [TrackCursor; MAX_TRACKS],
    time: TimeBase,
    last_check: UMicros,
    sync_pending: bool,
    paused: bool,
    looping: bool,
}

impl<S: Storage, K: EventSink, C: Clock> Sequencer<S, K, C> {
    /// Create an idle sequencer. Nothing is opened until [`Sequencer::load`].
    pub fn new(storage: S, sink: K, clock: C, config: SequencerConfig) -> Self {
        let mut time = TimeBase::default();
        time.set_tempo_adjust(config.tempo_adjust);
        Self {
            storage,
            sink,
            clock,
            config,
            file: None,
            file_name: String::new(),
            header: None,
            tracks: core::array::from_fn(|id| TrackCursor::new(id as u8)),
            time,
            last_check: UMicros::ZERO,
            sync_pending: false,
            paused: false,
            looping: config.looping,
        }
    }

    /// Open `name`, validate its header and prepare every track for playback.
    ///
    /// Any file already loaded is closed first. On error the sequencer is left
    /// unloaded.
    pub fn load(&mut self, name: &str) -> Result<(), LoadError> {
        self.close();
        if name.trim().is_empty() {
            return Err(LoadError::BlankName);
        }

        let mut file = self.storage.open(name).map_err(LoadError::Open)?;
        let layout = match SmfLayout::read(&mut file) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::debug!(file = name, error = %e, code = e.code(), "load failed");
                return Err(e);
            }
        };

        for (cursor, chunk) in self.tracks.iter_mut().zip(layout.tracks()) {
            cursor.load(*chunk);
        }
        let header = *layout.header();
        self.time.reset(header.ticks_per_quarter_note());
        self.header = Some(header);
        self.file = Some(file);
        self.file_name.push_str(name);
        self.sync_pending = true;

        tracing::debug!(
            file = name,
            format = header.format().number(),
            tracks = header.track_count(),
            tpqn = header.ticks_per_quarter_note(),
            "loaded"
        );
        Ok(())
    }

    /// Stop playback and release the file.
    ///
    /// Looping and the tempo adjustment are kept for the next file.
    pub fn close(&mut self) {
        if self.file.is_some() {
            tracing::debug!(file = self.file_name.as_str(), "closing");
        }
        self.file = None;
        self.header = None;
        self.file_name.clear();
        self.tracks.iter_mut().for_each(TrackCursor::close);
        self.time.reset(DEFAULT_TICKS_PER_QUARTER_NOTE);
        self.sync_pending = false;
        self.paused = false;
    }

    /// Play whatever has become due since the previous call.
    ///
    /// Returns true if at least one tick elapsed since the last call that
    /// returned true, whether or not any event was due.
    pub fn get_next_event(&mut self) -> bool {
        if self.file.is_none() || self.paused {
            return false;
        }

        let now = self.clock.now();
        if self.sync_pending {
            self.sync_tracks(now);
        }

        let elapsed = now.saturating_sub(self.last_check);
        if elapsed.us() < self.time.micros_per_tick() as u64 {
            return false;
        }
        self.last_check = now;

        self.play_due(elapsed);

        if self.looping && self.is_eof() {
            self.rearm();
        }
        true
    }

    fn play_due(&mut self, elapsed: UMicros) {
        let Self {
            file,
            header,
            tracks,
            time,
            sink,
            config,
            ..
        } = self;
        let (Some(file), Some(header)) = (file.as_mut(), header.as_ref()) else {
            return;
        };
        let count = header.track_count() as usize;
        let tracks = &mut tracks[..count];
        let mut session = Session { file, time, sink };
        let burst = config.max_events_per_call.max(1);

        match config.merge {
            MergePolicy::TrackPriority => {
                for track in tracks.iter_mut() {
                    let mut elapsed = elapsed;
                    for _ in 0..burst {
                        if !track.next_event(&mut session, elapsed) {
                            break;
                        }
                        elapsed = UMicros::ZERO;
                    }
                }
            }
            MergePolicy::EventPriority => {
                let mut elapsed = elapsed;
                for _ in 0..burst {
                    let mut any = false;
                    for track in tracks.iter_mut() {
                        any |= track.next_event(&mut session, elapsed);
                    }
                    if !any {
                        break;
                    }
                    elapsed = UMicros::ZERO;
                }
            }
        }
    }

    /// Restart the tracks that a loop replays.
    fn rearm(&mut self) {
        let Some(header) = self.header else {
            return;
        };
        let count = header.track_count() as usize;
        let first = match header.format() {
            Format::Simultaneous if count > 1 => 1,
            _ => 0,
        };
        tracing::debug!(file = self.file_name.as_str(), first, "looping");
        self.tracks[first..count]
            .iter_mut()
            .for_each(TrackCursor::restart);
    }

    fn sync_tracks(&mut self, now: UMicros) {
        self.last_check = now;
        self.tracks.iter_mut().for_each(TrackCursor::sync_time);
        self.sync_pending = false;
    }

    /// True when every track has finished (or nothing is loaded).
    pub fn is_eof(&self) -> bool {
        self.loaded_tracks().iter().all(TrackCursor::is_end_of_track)
    }

    /// Suspend (`true`) or resume (`false`) event delivery.
    ///
    /// Time spent paused is not charged to the tracks. On resume every track
    /// continues from the event it was waiting on, timed from the first call
    /// after resuming.
    pub fn pause(&mut self, paused: bool) {
        if self.paused && !paused {
            self.sync_pending = true;
        }
        self.paused = paused;
    }

    /// Rewind every track to the start of the file.
    ///
    /// Tempo, time signature and resolution return to the values the file
    /// starts with. The tempo adjustment is kept.
    pub fn restart(&mut self) {
        let Some(header) = self.header else {
            return;
        };
        self.tracks.iter_mut().for_each(TrackCursor::restart);
        self.time.reset(header.ticks_per_quarter_note());
        self.sync_pending = true;
        tracing::debug!(file = self.file_name.as_str(), "restarted");
    }

    /// Enable or disable looping.
    pub fn looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Change how simultaneous events are ordered.
    pub fn set_merge_policy(&mut self, merge: MergePolicy) {
        self.config.merge = merge;
    }

    /// Speed up (positive) or slow down (negative) playback by `delta` BPM.
    ///
    /// Takes effect from the next call to [`Sequencer::get_next_event`],
    /// including for time already banked toward the next event.
    pub fn set_tempo_adjust(&mut self, delta: i16) {
        self.time.set_tempo_adjust(delta);
    }

    /// Override the tempo in beats per minute.
    pub fn set_tempo(&mut self, bpm: u16) {
        self.time.set_tempo(bpm);
    }

    /// Override the tempo in microseconds per quarter note.
    pub fn set_micros_per_quarter_note(&mut self, micros: u32) {
        self.time.set_micros_per_quarter_note(micros);
    }

    /// Override the file's resolution.
    pub fn set_ticks_per_quarter_note(&mut self, ticks: u16) {
        let from = self.time.ticks_per_quarter_note();
        self.time.set_ticks_per_quarter_note(ticks);
        let to = self.time.ticks_per_quarter_note();
        for track in self.tracks.iter_mut() {
            track.rescale(from, to);
        }
    }

    /// Override the time signature.
    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) {
        self.time
            .set_time_signature(TimeSignature::new(numerator, denominator));
    }

    /// Microseconds per tick at the current tempo
    pub fn tick_time(&self) -> u32 {
        self.time.micros_per_tick()
    }

    /// Base tempo in beats per minute
    pub fn tempo(&self) -> u16 {
        self.time.tempo()
    }

    /// Base tempo in microseconds per quarter note
    pub fn micros_per_quarter_note(&self) -> u32 {
        self.time.micros_per_quarter_note()
    }

    /// Current tempo adjustment in beats per minute
    pub fn tempo_adjust(&self) -> i16 {
        self.time.tempo_adjust()
    }

    /// Ticks per quarter note
    pub fn ticks_per_quarter_note(&self) -> u16 {
        self.time.ticks_per_quarter_note()
    }

    /// Current time signature
    pub fn time_signature(&self) -> TimeSignature {
        self.time.time_signature()
    }

    /// The full time base
    pub fn time_base(&self) -> &TimeBase {
        &self.time
    }

    /// Format of the loaded file
    pub fn format(&self) -> Option<Format> {
        self.header.map(|h| h.format())
    }

    /// Number of tracks in the loaded file, zero when unloaded
    pub fn track_count(&self) -> u8 {
        self.header.map_or(0, |h| h.track_count())
    }

    /// Header of the loaded file
    pub fn header(&self) -> Option<&SmfHeader> {
        self.header.as_ref()
    }

    /// Name of the loaded file, empty when unloaded
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// True while a file is loaded
    pub fn is_loaded(&self) -> bool {
        self.file.is_some()
    }

    /// True while paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True if playback loops
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// The merge policy in use
    pub fn merge_policy(&self) -> MergePolicy {
        self.config.merge
    }

    /// A read-only view of track `id`, if the file has that many tracks
    pub fn track(&self, id: u8) -> Option<&TrackCursor> {
        self.loaded_tracks().get(id as usize)
    }

    fn loaded_tracks(&self) -> &[TrackCursor] {
        &self.tracks[..self.track_count() as usize]
    }

    /// A snapshot of the playback settings
    pub fn state(&self) -> PlaybackState<'_> {
        PlaybackState {
            tempo: self.time.tempo(),
            micros_per_quarter_note: self.time.micros_per_quarter_note(),
            ticks_per_quarter_note: self.time.ticks_per_quarter_note(),
            time_signature: self.time.time_signature(),
            tempo_adjust: self.time.tempo_adjust(),
            micros_per_tick: self.time.micros_per_tick(),
            paused: self.paused,
            looping: self.looping,
            file_name: &self.file_name,
        }
    }

    /// The event sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// The event sink, mutably
    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// The storage device, e.g. to add files to a [`MemoryStorage`](crate::storage::MemoryStorage)
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// The clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Log the header, playback state and every track at debug level.
    pub fn dump(&self) {
        tracing::debug!(state = ?self.state(), header = ?self.header, "sequencer");
        for track in self.loaded_tracks() {
            let chunk = track.chunk();
            tracing::debug!(
                track = track.id(),
                start = chunk.start,
                length = chunk.length,
                position = track.position(),
                state = ?track.state(),
                elapsed = %track.elapsed(&self.time),
                "track"
            );
        }
    }
}
