#![doc = r#"
A real-time player for Standard MIDI Files.

`smfseq` reads an SMF from some [`Storage`](storage::Storage) and replays its
events against an [`EventSink`](sequencer::EventSink) as wall-clock time passes.
Nothing is decoded ahead of need: each track keeps a byte cursor into the file
and decodes a single event whenever enough time has elapsed for it.

# Overview

```text
 Storage ──► Sequencer ──► TrackCursor × 16 ──► EventSink
                 │               │
               Clock          TimeBase
```

The caller polls [`Sequencer::get_next_event`](sequencer::Sequencer::get_next_event)
from its control loop. Every call performs a bounded amount of work and never
allocates.

# Example
```rust
# use smfseq::prelude::*;
#[derive(Default)]
struct Printer;

impl EventSink for Printer {
    fn on_channel_event(&mut self, event: &ChannelEvent) {
        // forward event.wire_bytes() to a serial port, a synth, ...
        let _ = event.wire_bytes();
    }
}

let mut storage = MemoryStorage::new();
storage.insert(
    "tune.mid",
    [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 48,
        b'M', b'T', b'r', b'k', 0, 0, 0, 8,
        0x00, 0x90, 0x3C, 0x64,
        0x00, 0xFF, 0x2F, 0x00,
    ],
);

let clock = ManualClock::new();
let mut seq = Sequencer::new(storage, Printer, clock.clone(), SequencerConfig::default());
seq.load("tune.mid").unwrap();

while !seq.is_eof() {
    clock.advance(UMicros::from_ms(1));
    seq.get_next_event();
}
```
"#]
#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod clock;
pub mod file;
pub mod message;
pub mod reader;
pub mod sequencer;
pub mod storage;
pub mod track;

mod micros;
pub use micros::*;

#[doc = r#"
Common re-exports for driving a [`Sequencer`](crate::sequencer::Sequencer)
"#]
pub mod prelude {
    pub use crate::clock::*;
    pub use crate::file::{Format, LoadError, MAX_TRACKS, SmfHeader, TimeBase, TimeSignature};
    pub use crate::message::{ChannelEvent, ChannelStatus, SYSEX_CAPACITY, SysExEvent};
    pub use crate::micros::*;
    pub use crate::sequencer::{
        EventSink, MergePolicy, PlaybackState, Sequencer, SequencerConfig,
    };
    pub use crate::storage::{MemoryStorage, Storage, StorageError, StorageFile};

    #[cfg(feature = "std")]
    pub use crate::storage::FsStorage;
}
