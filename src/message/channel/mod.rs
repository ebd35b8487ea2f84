#![doc = r#"
Channel messages as delivered to an [`EventSink`](crate::sequencer::EventSink)

# Status byte
```text
 1 t t t c c c c
   └─┬─┘ └──┬──┘
  message   channel (0-15)
```
The message type decides how many data bytes follow:

| Status | Message                 | Data bytes |
|--------|-------------------------|------------|
| `0x8n` | Note Off                | 2          |
| `0x9n` | Note On                 | 2          |
| `0xAn` | Polyphonic Key Pressure | 2          |
| `0xBn` | Control Change          | 2          |
| `0xCn` | Program Change          | 1          |
| `0xDn` | Channel Pressure        | 1          |
| `0xEn` | Pitch Bend              | 2          |
"#]

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The message type nibble of a channel status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ChannelStatus {
    /// `0x8n`
    NoteOff = 0x8,
    /// `0x9n`
    NoteOn = 0x9,
    /// `0xAn`
    PolyPressure = 0xA,
    /// `0xBn`
    ControlChange = 0xB,
    /// `0xCn`
    ProgramChange = 0xC,
    /// `0xDn`
    ChannelPressure = 0xD,
    /// `0xEn`
    PitchBend = 0xE,
}

impl ChannelStatus {
    /// Split a status byte into message type and channel.
    ///
    /// Returns `None` for data bytes and for system messages (`0xF0..=0xFF`).
    pub fn from_status(status: u8) -> Option<(Self, u8)> {
        let kind = Self::try_from(status >> 4).ok()?;
        Some((kind, status & 0x0F))
    }

    /// Number of data bytes following the status byte
    pub const fn data_len(&self) -> u8 {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            _ => 2,
        }
    }

    /// Combine with a channel into a status byte.
    pub fn status(self, channel: u8) -> u8 {
        (u8::from(self) << 4) | (channel & 0x0F)
    }
}

#[doc = r#"
A decoded channel message

`size` counts data bytes only (1 or 2). [`ChannelEvent::wire_bytes`] prepends
the status byte, rebuilt from the message type and channel, giving the exact
bytes to put on a MIDI cable.

When a track uses running status the stored status is reused, so two events
decoded from `90 3C 64 40 64` both report `NoteOn` on channel 0.
"#]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelEvent {
    track: u8,
    channel: u8,
    kind: ChannelStatus,
    size: u8,
    bytes: [u8; 3],
}

impl ChannelEvent {
    /// Build an event. Only the first `kind.data_len()` bytes of `data` are kept.
    ///
    /// Data bytes are stored as given and must be below `0x80`.
    pub fn new(track: u8, kind: ChannelStatus, channel: u8, data: [u8; 2]) -> Self {
        let channel = channel & 0x0F;
        let size = kind.data_len();
        let mut bytes = [kind.status(channel), data[0], data[1]];
        if size == 1 {
            bytes[2] = 0;
        }
        Self {
            track,
            channel,
            kind,
            size,
            bytes,
        }
    }

    /// The track this event was read from
    pub const fn track(&self) -> u8 {
        self.track
    }

    /// The MIDI channel, 0-15
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// The message type
    pub const fn kind(&self) -> ChannelStatus {
        self.kind
    }

    /// Status byte with the channel in the low nibble
    pub const fn status(&self) -> u8 {
        self.bytes[0]
    }

    /// Number of data bytes, 1 or 2
    pub const fn size(&self) -> u8 {
        self.size
    }

    /// The data bytes without the status byte
    pub fn data(&self) -> &[u8] {
        &self.bytes[1..=self.size as usize]
    }

    /// Status and data bytes, ready to transmit
    pub fn wire_bytes(&self) -> &[u8] {
        &self.bytes[..=self.size as usize]
    }
}

#[test]
fn arity_follows_the_message_type() {
    use pretty_assertions::assert_eq;

    let (kind, channel) = ChannelStatus::from_status(0x93).unwrap();
    assert_eq!((kind, channel), (ChannelStatus::NoteOn, 3));
    assert_eq!(kind.data_len(), 2);

    let (kind, _) = ChannelStatus::from_status(0xC0).unwrap();
    assert_eq!(kind.data_len(), 1);
    let (kind, _) = ChannelStatus::from_status(0xDF).unwrap();
    assert_eq!(kind.data_len(), 1);

    assert_eq!(ChannelStatus::from_status(0x7F), None);
    assert_eq!(ChannelStatus::from_status(0xF0), None);
}

#[test]
fn wire_bytes_rebuild_the_status() {
    use pretty_assertions::assert_eq;

    let note = ChannelEvent::new(2, ChannelStatus::NoteOn, 9, [36, 100]);
    assert_eq!(note.status(), 0x99);
    assert_eq!(note.data(), &[36, 100]);
    assert_eq!(note.wire_bytes(), &[0x99, 36, 100]);

    let program = ChannelEvent::new(0, ChannelStatus::ProgramChange, 1, [5, 0x55]);
    assert_eq!(program.size(), 1);
    assert_eq!(program.wire_bytes(), &[0xC1, 5]);
}
