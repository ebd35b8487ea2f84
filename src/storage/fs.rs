use super::{Storage, StorageError, StorageFile};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::PathBuf,
};

/// Files under a directory on the host filesystem.
#[derive(Clone, Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Resolve file names relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Storage for FsStorage {
    type File = FsFile;

    fn open(&mut self, name: &str) -> Result<Self::File, StorageError> {
        let file = File::open(self.root.join(name)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound,
            _ => StorageError::Io(e),
        })?;
        let size = file.metadata()?.len();
        if size > u32::MAX as u64 {
            return Err(StorageError::TooLarge(size));
        }
        Ok(FsFile {
            file: BufReader::new(file),
            size: size as u32,
            position: 0,
        })
    }
}

/// An open file from [`FsStorage`]
///
/// Reads are buffered; seeks that stay close to the current position reuse
/// the buffer.
#[derive(Debug)]
pub struct FsFile {
    file: BufReader<File>,
    size: u32,
    position: u32,
}

impl StorageFile for FsFile {
    fn size(&self) -> u32 {
        self.size
    }

    fn seek(&mut self, offset: u32) -> Result<(), StorageError> {
        if offset > self.size {
            return Err(StorageError::OutOfBounds { offset, len: 0 });
        }
        if offset != self.position {
            let delta = offset as i64 - self.position as i64;
            if delta.unsigned_abs() < self.file.capacity() as u64 {
                self.file.seek_relative(delta)?;
            } else {
                self.file.seek(SeekFrom::Start(offset as u64))?;
            }
            self.position = offset;
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StorageError> {
        let len = buf.len();
        if let Err(e) = self.file.read_exact(buf) {
            let offset = self.position;
            // position is unknown after a failed read
            self.position = u32::MAX;
            return Err(match e.kind() {
                std::io::ErrorKind::UnexpectedEof => StorageError::OutOfBounds { offset, len },
                _ => StorageError::Io(e),
            });
        }
        self.position = self.position.saturating_add(len as u32);
        Ok(())
    }
}
