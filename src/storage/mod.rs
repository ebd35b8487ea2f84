#![doc = r#"
Block storage contract used to read Standard MIDI Files

The sequencer only ever needs four things from storage: open a file by name,
learn its size, seek to an absolute offset and read an exact number of bytes.
Closing happens when the [`StorageFile`] is dropped.

Two implementations ship with the crate:
- [`MemoryStorage`], named byte images held in memory
- [`FsStorage`] (feature `std`), files under a directory on the host
"#]

mod memory;
pub use memory::*;

#[cfg(feature = "std")]
mod fs;
#[cfg(feature = "std")]
pub use fs::*;

use thiserror::Error;

/// Errors reported by a [`Storage`] implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file with this name exists
    #[error("File not found")]
    NotFound,
    /// A seek or read went past the end of the file
    #[error("Access out of bounds at offset {offset} ({len} bytes)")]
    OutOfBounds {
        /// Offset where the access started
        offset: u32,
        /// Number of bytes requested
        len: usize,
    },
    /// The file is larger than the 32 bit offsets used by SMF
    #[error("File is too large ({0} bytes)")]
    TooLarge(u64),
    /// Any other device error
    #[cfg(feature = "std")]
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// A named-file provider.
pub trait Storage {
    /// The handle returned by [`Storage::open`].
    type File: StorageFile;

    /// Open `name` for reading.
    fn open(&mut self, name: &str) -> Result<Self::File, StorageError>;
}

/// An open file. Dropping it closes the file.
pub trait StorageFile {
    /// Total size of the file in bytes
    fn size(&self) -> u32;

    /// Move the read position to `offset` bytes from the start of the file.
    fn seek(&mut self, offset: u32) -> Result<(), StorageError>;

    /// Fill `buf` from the current position, advancing the position.
    ///
    /// Fails without a partial read guarantee if fewer than `buf.len()` bytes remain.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Seek then read.
    fn read_at(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), StorageError> {
        self.seek(offset)?;
        self.read_exact(buf)
    }
}
