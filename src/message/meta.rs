use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Status byte introducing a meta event
pub const META_STATUS: u8 = 0xFF;

/// The meta event types the sequencer acts on.
///
/// Every other type (text, track name, key signature, sequencer specific, ...)
/// is read past and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MetaKind {
    /// `FF 2F 00`
    EndOfTrack = 0x2F,
    /// `FF 51 03 tttttt`, microseconds per quarter note
    SetTempo = 0x51,
    /// `FF 58 04 nn dd cc bb`
    TimeSignature = 0x58,
}

/// Largest meta payload read into memory. Longer payloads of interpreted
/// types are malformed and skipped.
pub(crate) const META_CAPACITY: usize = 4;
