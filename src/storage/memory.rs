use super::{Storage, StorageError, StorageFile};
use alloc::{collections::BTreeMap, rc::Rc, string::String, vec::Vec};

/// An in-memory storage device.
///
/// Useful for files baked into firmware with `include_bytes!`, files already
/// fetched over the network, and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, Rc<[u8]>>,
}

impl MemoryStorage {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `name`, replacing any file of that name.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), Rc::from(bytes.into()));
    }

    /// Remove a file. Open handles keep their own copy alive.
    pub fn remove(&mut self, name: &str) -> bool {
        self.files.remove(name).is_some()
    }

    /// Returns true if a file named `name` exists
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

impl Storage for MemoryStorage {
    type File = MemoryFile;

    fn open(&mut self, name: &str) -> Result<Self::File, StorageError> {
        let data = self.files.get(name).ok_or(StorageError::NotFound)?;
        if data.len() as u64 > u32::MAX as u64 {
            return Err(StorageError::TooLarge(data.len() as u64));
        }
        Ok(MemoryFile {
            data: Rc::clone(data),
            position: 0,
        })
    }
}

/// An open handle into a [`MemoryStorage`] file.
#[derive(Clone, Debug)]
pub struct MemoryFile {
    data: Rc<[u8]>,
    position: u32,
}

impl StorageFile for MemoryFile {
    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn seek(&mut self, offset: u32) -> Result<(), StorageError> {
        if offset > self.size() {
            return Err(StorageError::OutOfBounds { offset, len: 0 });
        }
        self.position = offset;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StorageError> {
        let start = self.position as usize;
        let Some(src) = self.data.get(start..start + buf.len()) else {
            return Err(StorageError::OutOfBounds {
                offset: self.position,
                len: buf.len(),
            });
        };
        buf.copy_from_slice(src);
        self.position += buf.len() as u32;
        Ok(())
    }
}

#[test]
fn reads_past_the_end_fail_without_moving() {
    use pretty_assertions::assert_eq;
    let mut storage = MemoryStorage::new();
    storage.insert("a", [1u8, 2, 3]);

    let mut file = storage.open("a").unwrap();
    let mut buf = [0u8; 2];
    file.read_at(1, &mut buf).unwrap();
    assert_eq!(buf, [2, 3]);

    assert!(matches!(
        file.read_at(2, &mut buf),
        Err(StorageError::OutOfBounds { offset: 2, len: 2 })
    ));
    assert!(matches!(storage.open("b"), Err(StorageError::NotFound)));
}
