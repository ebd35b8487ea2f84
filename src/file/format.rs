use num_enum::{IntoPrimitive, TryFromPrimitive};

#[doc = r#"
The SMF format word from the header chunk

- A format 0 file contains the entire performance merged onto a single track.
- A format 1 file contains any number of tracks played simultaneously.
- A format 2 file contains independent single-track patterns played one after
  another. It is recognised here only so that it can be rejected by name.

Track 0 of a format 1 file conventionally carries the tempo map and other
one-time setup, which is why looping playback does not replay it.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum Format {
    /// Format 0
    SingleMultiChannel = 0,
    /// Format 1
    Simultaneous = 1,
    /// Format 2
    SequentiallyIndependent = 2,
}

impl Format {
    /// True if the sequencer can play this format.
    pub const fn is_playable(&self) -> bool {
        !matches!(self, Format::SequentiallyIndependent)
    }

    /// The raw format number
    pub fn number(self) -> u16 {
        self.into()
    }
}

#[test]
fn format_words() {
    use pretty_assertions::assert_eq;
    assert_eq!(Format::try_from(0u16).unwrap(), Format::SingleMultiChannel);
    assert_eq!(Format::try_from(1u16).unwrap(), Format::Simultaneous);
    assert!(!Format::try_from(2u16).unwrap().is_playable());
    assert!(Format::try_from(3u16).is_err());
    assert_eq!(Format::Simultaneous.number(), 1);
}
