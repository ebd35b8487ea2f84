use crate::storage::StorageError;
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while reading bytes out of a file window
"#]
#[derive(Debug, Error)]
#[error("Read failed at offset {position}: {kind}")]
pub struct ReaderError {
    position: u32,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce
#[derive(Debug, Error)]
pub enum ReaderErrorKind {
    /// Reading past the end of the window.
    #[error("Read past the end of the window")]
    OutOfBounds,
    /// A variable length quantity longer than four bytes.
    #[error("Variable length quantity is longer than 4 bytes")]
    VarLenOverflow,
    /// The storage device failed
    #[error("Storage {0}")]
    Storage(#[from] StorageError),
}

impl ReaderError {
    /// Create a reader error from a position and kind
    pub const fn new(position: u32, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }
    /// True if the read ran past the end of its window
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }
    /// What went wrong
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }
    /// Returns the absolute file offset where the read error occurred.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// A read past the end of the window starting at `position`
    pub const fn oob(position: u32) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::OutOfBounds,
        }
    }

    pub(crate) fn into_storage(self) -> Option<StorageError> {
        match self.kind {
            ReaderErrorKind::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// The Read Result type (see [`ReaderError`])
pub type ReadResult<T> = Result<T, ReaderError>;
