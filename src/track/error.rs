use crate::reader::ReaderError;
use thiserror::Error;

/// Why a cursor stopped a track early.
///
/// These never reach the caller of the sequencer: the track is marked
/// end-of-track and the error is logged.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A read left the track chunk or storage failed
    #[error("{0}")]
    Read(#[from] ReaderError),
    /// A data byte appeared with no running status to attach it to
    #[error("Data byte {0:#04X} without running status")]
    MissingRunningStatus(u8),
    /// A status byte where a channel message expects a data byte
    #[error("Status byte {0:#04X} inside a channel message")]
    UnexpectedStatus(u8),
    /// A system common or realtime status, which may not appear in a file
    #[error("Invalid status byte {0:#04X}")]
    InvalidStatus(u8),
}
