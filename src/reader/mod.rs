#![doc = r#"
Bounds-checked binary reads over a window of a storage file

Every SMF structure is read through a [`Reader`], which is confined to a
`[start, end)` byte window. For the header that window is the whole file, for
a track it is the track chunk body. A read that would leave the window fails
with [`ReaderErrorKind::OutOfBounds`] before touching storage.

# Variable length quantities

Delta times and meta/sysex lengths are stored as big-endian 7-bit groups where
a set high bit means another byte follows:

```text
0x00       -> 0
0x7F       -> 127
0x81 0x00  -> 128
0xFF 0x7F  -> 16383
```

At most four bytes are allowed (`0x0FFF_FFFF`).
"#]

mod error;
pub use error::*;

use crate::storage::StorageFile;

/// Largest encodable variable length quantity
pub const MAX_VARLEN: u32 = 0x0FFF_FFFF;

/// A cursor over `[position, end)` of a file.
pub struct Reader<'f, F: ?Sized> {
    file: &'f mut F,
    position: u32,
    end: u32,
}

impl<'f, F: StorageFile + ?Sized> Reader<'f, F> {
    /// Read `file` from `position` up to (but excluding) `end`.
    pub fn new(file: &'f mut F, position: u32, end: u32) -> Self {
        Self {
            file,
            position,
            end,
        }
    }

    /// Read the whole file.
    pub fn whole(file: &'f mut F) -> Self {
        let end = file.size();
        Self::new(file, 0, end)
    }

    /// The absolute file offset of the next byte to read.
    pub const fn buffer_position(&self) -> u32 {
        self.position
    }

    /// Bytes left in the window
    pub const fn remaining(&self) -> u32 {
        self.end.saturating_sub(self.position)
    }

    fn claim(&self, len: u32) -> ReadResult<()> {
        if len > self.remaining() {
            return Err(ReaderError::oob(self.position));
        }
        Ok(())
    }

    /// Fill `buf` completely.
    pub fn read_into(&mut self, buf: &mut [u8]) -> ReadResult<()> {
        let len = u32::try_from(buf.len()).map_err(|_| ReaderError::oob(self.position))?;
        self.claim(len)?;
        self.file
            .read_at(self.position, buf)
            .map_err(|e| ReaderError::new(self.position, e.into()))?;
        self.position += len;
        Ok(())
    }

    /// Read a fixed number of bytes.
    pub fn read_exact_size<const N: usize>(&mut self) -> ReadResult<[u8; N]> {
        let mut bytes = [0; N];
        self.read_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> ReadResult<u8> {
        let [byte] = self.read_exact_size()?;
        Ok(byte)
    }

    /// Read a big-endian u16
    pub fn read_u16_be(&mut self) -> ReadResult<u16> {
        Ok(u16::from_be_bytes(self.read_exact_size()?))
    }

    /// Read a big-endian u32
    pub fn read_u32_be(&mut self) -> ReadResult<u32> {
        Ok(u32::from_be_bytes(self.read_exact_size()?))
    }

    /// Read a big-endian 24 bit value into a u32
    pub fn read_u24_be(&mut self) -> ReadResult<u32> {
        let [a, b, c] = self.read_exact_size()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    /// Read a variable length quantity of at most four bytes.
    pub fn read_varlen(&mut self) -> ReadResult<u32> {
        let start = self.position;
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(ReaderError::new(start, ReaderErrorKind::VarLenOverflow))
    }

    /// Advance past `len` bytes without reading them.
    pub fn skip(&mut self, len: u32) -> ReadResult<()> {
        self.claim(len)?;
        self.position += len;
        Ok(())
    }
}

#[cfg(test)]
fn varlen(bytes: &[u8]) -> ReadResult<(u32, u32)> {
    use crate::storage::{MemoryStorage, Storage};
    let mut storage = MemoryStorage::new();
    storage.insert("v", bytes);
    let mut file = storage.open("v").unwrap();
    let mut reader = Reader::whole(&mut file);
    let value = reader.read_varlen()?;
    Ok((value, reader.buffer_position()))
}

#[test]
fn reads_variable_length_quantities() {
    use pretty_assertions::assert_eq;
    assert_eq!(varlen(&[0x00]).unwrap(), (0, 1));
    assert_eq!(varlen(&[0x40]).unwrap(), (0x40, 1));
    assert_eq!(varlen(&[0x7F]).unwrap(), (0x7F, 1));
    assert_eq!(varlen(&[0x81, 0x00]).unwrap(), (0x80, 2));
    assert_eq!(varlen(&[0xC0, 0x00]).unwrap(), (0x2000, 2));
    assert_eq!(varlen(&[0xFF, 0x7F]).unwrap(), (0x3FFF, 2));
    assert_eq!(varlen(&[0x81, 0x80, 0x00]).unwrap(), (0x4000, 3));
    assert_eq!(varlen(&[0xFF, 0xFF, 0xFF, 0x7F]).unwrap(), (MAX_VARLEN, 4));
}

#[test]
fn rejects_overlong_and_truncated_quantities() {
    let err = varlen(&[0xFF, 0xFF, 0xFF, 0xFF, 0x7F]).unwrap_err();
    assert!(matches!(err.error_kind(), ReaderErrorKind::VarLenOverflow));

    let err = varlen(&[0x81]).unwrap_err();
    assert!(err.is_out_of_bounds());
}

#[test]
fn window_is_enforced_before_storage() {
    use crate::storage::{MemoryStorage, Storage};
    use pretty_assertions::assert_eq;

    let mut storage = MemoryStorage::new();
    storage.insert("w", [0x00, 0x12, 0x34, 0x56, 0x78, 0x9A]);
    let mut file = storage.open("w").unwrap();

    let mut reader = Reader::new(&mut file, 1, 4);
    assert_eq!(reader.read_u16_be().unwrap(), 0x1234);
    assert_eq!(reader.remaining(), 1);
    // the file has more bytes, the window does not
    let err = reader.read_u16_be().unwrap_err();
    assert!(err.is_out_of_bounds());
    assert_eq!(err.position(), 3);
    assert_eq!(reader.read_u8().unwrap(), 0x56);
}
