use crate::error::{Error, Result};

/// Raw reads from the foreign process's address space.
///
/// Addresses are absolute. Base-relative reads go through
/// [`ReadMemory::read_relative`] with the module base resolved at attach.
pub trait ReadMemory {
    /// Read `size` bytes starting at an absolute address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Read `size` bytes at `base + offset`
    fn read_relative(&self, base: u64, offset: u64, size: usize) -> Result<Vec<u8>> {
        self.read_bytes(base.wrapping_add(offset), size)
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_word(address)?))
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_word(address)?))
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_word(address)?))
    }

    /// Read exactly four bytes, rejecting short reads
    fn read_word(&self, address: u64) -> Result<[u8; 4]> {
        let bytes = self.read_bytes(address, 4)?;
        bytes.as_slice().try_into().map_err(|_| Error::MemoryRead {
            address,
            message: format!("expected 4 bytes, got {}", bytes.len()),
        })
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for &R {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<R: ReadMemory + ?Sized> ReadMemory for Box<R> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}
