use super::{Format, LoadError, MAX_TRACKS};
use crate::{
    reader::{Reader, ReaderError},
    storage::StorageFile,
};

/// Length of the header chunk body
pub const HEADER_LENGTH: u32 = 6;

#[doc = r#"
The validated contents of an `MThd` chunk

```text
"MThd" <len:4 = 6> <format:2> <track count:2> <ticks per quarter note:2>
```

Only headers that the sequencer can actually play are representable: the
format is 0 or 1, the track count is `1..=MAX_TRACKS`, format 0 has exactly one
track, and the division word is a tick count rather than SMPTE timing.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SmfHeader {
    format: Format,
    track_count: u8,
    ticks_per_quarter_note: u16,
}

impl SmfHeader {
    /// Validate raw header fields.
    pub fn new(format: u16, track_count: u16, division: u16) -> Result<Self, LoadError> {
        let format = match Format::try_from(format) {
            Ok(f) if f.is_playable() => f,
            _ => return Err(LoadError::UnsupportedFormat(format)),
        };
        if format == Format::SingleMultiChannel && track_count > 1 {
            return Err(LoadError::MultipleTracksForSingleMultiChannel(track_count));
        }
        if track_count as usize > MAX_TRACKS {
            return Err(LoadError::TooManyTracks(track_count));
        }
        if track_count == 0 {
            return Err(LoadError::NoTracks);
        }
        if division & 0x8000 != 0 {
            return Err(LoadError::UnsupportedTiming(division));
        }

        Ok(Self {
            format,
            track_count: track_count as u8,
            ticks_per_quarter_note: division,
        })
    }

    /// Read and validate the header chunk at the start of the file.
    pub(crate) fn read<F: StorageFile + ?Sized>(
        reader: &mut Reader<'_, F>,
    ) -> Result<Self, LoadError> {
        let tag: [u8; 4] = reader
            .read_exact_size()
            .map_err(|e| LoadError::from_read(e, LoadError::NotMidi))?;
        if &tag != b"MThd" {
            return Err(LoadError::NotMidi);
        }

        let length = reader
            .read_u32_be()
            .map_err(|e| LoadError::from_read(e, LoadError::HeaderLength(0)))?;
        if length != HEADER_LENGTH {
            return Err(LoadError::HeaderLength(length));
        }

        let truncated = |e: ReaderError| LoadError::from_read(e, LoadError::HeaderLength(length));
        let format = reader.read_u16_be().map_err(truncated)?;
        let track_count = reader.read_u16_be().map_err(truncated)?;
        let division = reader.read_u16_be().map_err(truncated)?;
        Self::new(format, track_count, division)
    }

    /// The file format, 0 or 1
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Number of track chunks
    pub const fn track_count(&self) -> u8 {
        self.track_count
    }

    /// Ticks per quarter note declared by the file.
    ///
    /// A value of zero is replaced by the default of 48 when the file is played.
    pub const fn ticks_per_quarter_note(&self) -> u16 {
        self.ticks_per_quarter_note
    }
}

#[test]
fn header_field_validation() {
    use pretty_assertions::assert_eq;

    let header = SmfHeader::new(1, 16, 96).unwrap();
    assert_eq!(header.format(), Format::Simultaneous);
    assert_eq!(header.track_count(), 16);
    assert_eq!(header.ticks_per_quarter_note(), 96);

    assert!(matches!(
        SmfHeader::new(2, 1, 96),
        Err(LoadError::UnsupportedFormat(2))
    ));
    assert!(matches!(
        SmfHeader::new(7, 1, 96),
        Err(LoadError::UnsupportedFormat(7))
    ));
    assert!(matches!(
        SmfHeader::new(0, 2, 96),
        Err(LoadError::MultipleTracksForSingleMultiChannel(2))
    ));
    assert!(matches!(
        SmfHeader::new(1, 17, 96),
        Err(LoadError::TooManyTracks(17))
    ));
    assert!(matches!(SmfHeader::new(1, 0, 96), Err(LoadError::NoTracks)));
    assert!(matches!(
        SmfHeader::new(1, 1, 0xE728),
        Err(LoadError::UnsupportedTiming(0xE728))
    ));
}
