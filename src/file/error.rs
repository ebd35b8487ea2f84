use crate::{
    reader::{ReaderError, ReaderErrorKind},
    storage::StorageError,
};
use thiserror::Error;

#[doc = r#"
Structural problems found while loading a Standard MIDI File

Each variant corresponds to one way [`Sequencer::load`](crate::sequencer::Sequencer::load)
can refuse a file. Nothing is retried internally: after an error the sequencer
is left unloaded and a different file may be loaded straight away.

[`LoadError::code`] returns the numeric code used by the classic Arduino
`MD_MIDIFile` player, for hosts that display or log those codes.
"#]
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file name was empty
    #[error("No file name given")]
    BlankName,
    /// The storage device could not open the file
    #[error("Can't open file: {0}")]
    Open(#[source] StorageError),
    /// The file does not start with an `MThd` chunk
    #[error("File is not in MIDI format")]
    NotMidi,
    /// The header chunk is not 6 bytes long
    #[error("Header length is {0}, expected 6")]
    HeaderLength(u32),
    /// Format 2, or a format word outside 0..=2
    #[error("Format {0} is not supported")]
    UnsupportedFormat(u16),
    /// The division word describes SMPTE timing rather than ticks per quarter note
    #[error("SMPTE timing ({0:#06X}) is not supported")]
    UnsupportedTiming(u16),
    /// Format 0 must hold exactly one track
    #[error("Format 0 file declares {0} tracks")]
    MultipleTracksForSingleMultiChannel(u16),
    /// More tracks than the sequencer can play
    #[error("File declares {0} tracks, at most {max} are supported", max = super::MAX_TRACKS)]
    TooManyTracks(u16),
    /// The header declares zero tracks
    #[error("File declares no tracks")]
    NoTracks,
    /// The `MTrk` chunk for a declared track is missing or malformed
    #[error("Track {track}: track chunk not found")]
    TrackChunkMissing {
        /// Zero-based track number
        track: u8,
    },
    /// A track chunk's declared length runs past the end of the file
    #[error("Track {track}: chunk size past end of file")]
    TrackPastEof {
        /// Zero-based track number
        track: u8,
    },
    /// The storage device failed while reading chunk headers
    #[error("Storage {0}")]
    Storage(#[source] StorageError),
}

impl LoadError {
    /// Numeric code of the classic player.
    ///
    /// - `0` blank file name
    /// - `2` can't open file
    /// - `3` not MIDI format
    /// - `4` header size incorrect
    /// - `5` format (or timing) not supported
    /// - `6` format 0 with more than one track
    /// - `7` too many tracks
    /// - `8` no tracks
    /// - `n0` track `n` chunk not found
    /// - `n1` track `n` chunk past end of file
    /// - `9` storage failure
    pub const fn code(&self) -> i32 {
        use LoadError::*;
        match self {
            BlankName => 0,
            Open(_) => 2,
            NotMidi => 3,
            HeaderLength(_) => 4,
            UnsupportedFormat(_) | UnsupportedTiming(_) => 5,
            MultipleTracksForSingleMultiChannel(_) => 6,
            TooManyTracks(_) => 7,
            NoTracks => 8,
            Storage(_) => 9,
            TrackChunkMissing { track } => *track as i32 * 10,
            TrackPastEof { track } => *track as i32 * 10 + 1,
        }
    }

    /// Turn a failed read into `structural`, unless storage itself failed.
    pub(crate) fn from_read(err: ReaderError, structural: LoadError) -> LoadError {
        match err.error_kind() {
            ReaderErrorKind::Storage(StorageError::OutOfBounds { .. }) => structural,
            ReaderErrorKind::Storage(_) => err
                .into_storage()
                .map(LoadError::Storage)
                .unwrap_or(structural),
            _ => structural,
        }
    }
}

#[test]
fn codes_follow_the_classic_numbering() {
    use pretty_assertions::assert_eq;
    assert_eq!(LoadError::BlankName.code(), 0);
    assert_eq!(LoadError::Open(StorageError::NotFound).code(), 2);
    assert_eq!(LoadError::TooManyTracks(17).code(), 7);
    assert_eq!(LoadError::TrackChunkMissing { track: 3 }.code(), 30);
    assert_eq!(LoadError::TrackPastEof { track: 12 }.code(), 121);
}
