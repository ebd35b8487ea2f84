#![doc = r#"
Standard MIDI File structure: header chunk, track chunk layout and time base

Loading a file only walks the chunk headers:

```text
[Header Chunk: "MThd" 6 format tracks division]
[Track Chunk 0: "MTrk" length <events...>]
[Track Chunk 1: "MTrk" length <events...>]
...
```

For each track the start offset and byte length of its body are recorded in a
[`TrackChunk`]. Event data is read later, one event at a time, by the
[`TrackCursor`](crate::track::TrackCursor) that owns that window.
"#]

mod error;
pub use error::*;

mod format;
pub use format::*;

mod header;
pub use header::*;

mod timing;
pub use timing::*;

use crate::{reader::Reader, storage::StorageFile};

/// The most tracks a file may declare.
pub const MAX_TRACKS: usize = 16;

/// Position of one track chunk body within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackChunk {
    /// Absolute offset of the first event byte
    pub start: u32,
    /// Length of the body in bytes
    pub length: u32,
}

impl TrackChunk {
    /// Absolute offset one past the last byte of the body
    pub const fn end(&self) -> u32 {
        self.start.saturating_add(self.length)
    }

    /// Read the `MTrk` chunk header at the reader's position and skip its body.
    pub(crate) fn read<F: StorageFile + ?Sized>(
        reader: &mut Reader<'_, F>,
        track: u8,
    ) -> Result<Self, LoadError> {
        let missing = || LoadError::TrackChunkMissing { track };

        let tag: [u8; 4] = reader
            .read_exact_size()
            .map_err(|e| LoadError::from_read(e, missing()))?;
        if &tag != b"MTrk" {
            return Err(missing());
        }
        let length = reader
            .read_u32_be()
            .map_err(|e| LoadError::from_read(e, missing()))?;

        let start = reader.buffer_position();
        if length > reader.remaining() {
            return Err(LoadError::TrackPastEof { track });
        }
        reader
            .skip(length)
            .map_err(|e| LoadError::from_read(e, LoadError::TrackPastEof { track }))?;

        Ok(Self { start, length })
    }
}

/// The header and the track chunk positions of a loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmfLayout {
    header: SmfHeader,
    tracks: [TrackChunk; MAX_TRACKS],
}

impl SmfLayout {
    /// Validate the header and locate every declared track chunk.
    pub fn read<F: StorageFile + ?Sized>(file: &mut F) -> Result<Self, LoadError> {
        let mut reader = Reader::whole(file);
        let header = SmfHeader::read(&mut reader)?;

        let mut tracks = [TrackChunk::default(); MAX_TRACKS];
        for (id, slot) in tracks
            .iter_mut()
            .take(header.track_count() as usize)
            .enumerate()
        {
            *slot = TrackChunk::read(&mut reader, id as u8)?;
        }

        Ok(Self { header, tracks })
    }

    /// The validated header
    pub const fn header(&self) -> &SmfHeader {
        &self.header
    }

    /// One entry per declared track
    pub fn tracks(&self) -> &[TrackChunk] {
        &self.tracks[..self.header.track_count() as usize]
    }
}

#[cfg(test)]
fn layout_of(bytes: &[u8]) -> Result<SmfLayout, LoadError> {
    use crate::storage::{MemoryStorage, Storage};
    let mut storage = MemoryStorage::new();
    storage.insert("f", bytes);
    let mut file = storage.open("f").unwrap();
    SmfLayout::read(&mut file)
}

#[test]
fn locates_track_chunks_without_reading_events() {
    use pretty_assertions::assert_eq;
    #[rustfmt::skip]
    let bytes = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0, 96,
        b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00,
        // garbage in the body is not looked at during load
        b'M', b'T', b'r', b'k', 0, 0, 0, 3, 0xF5, 0xF5, 0xF5,
    ];
    let layout = layout_of(&bytes).unwrap();
    assert_eq!(layout.header().format(), Format::Simultaneous);
    assert_eq!(
        layout.tracks(),
        &[
            TrackChunk { start: 22, length: 4 },
            TrackChunk { start: 34, length: 3 },
        ]
    );
}

#[test]
fn track_chunk_errors_carry_the_track_id() {
    #[rustfmt::skip]
    let wrong_tag = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0, 96,
        b'M', b'T', b'r', b'k', 0, 0, 0, 0,
        b'X', b'T', b'r', b'k', 0, 0, 0, 0,
    ];
    assert!(matches!(
        layout_of(&wrong_tag),
        Err(LoadError::TrackChunkMissing { track: 1 })
    ));

    #[rustfmt::skip]
    let truncated = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0, 96,
        b'M', b'T', b'r', b'k', 0, 0, 0, 0,
    ];
    assert!(matches!(
        layout_of(&truncated),
        Err(LoadError::TrackChunkMissing { track: 1 })
    ));

    #[rustfmt::skip]
    let overrun = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
        b'M', b'T', b'r', b'k', 0, 0, 0, 9, 0x00, 0xFF, 0x2F, 0x00,
    ];
    assert!(matches!(
        layout_of(&overrun),
        Err(LoadError::TrackPastEof { track: 0 })
    ));
}

#[test]
fn chunk_end_saturates() {
    use pretty_assertions::assert_eq;
    let chunk = TrackChunk {
        start: u32::MAX - 2,
        length: 10,
    };
    assert_eq!(chunk.end(), u32::MAX);
    assert_eq!(TrackChunk { start: 22, length: 4 }.end(), 26);
}
