//! Static in-memory image for reader tests.

use std::collections::BTreeMap;

use super::ReadMemory;
use crate::error::{Error, Result};

/// Sparse byte image; unmapped bytes fail to read like a dead process would
#[derive(Debug, Clone, Default)]
pub struct MockMemoryReader {
    bytes: BTreeMap<u64, u8>,
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (0..size as u64)
            .map(|i| {
                let addr = address.wrapping_add(i);
                self.bytes.get(&addr).copied().ok_or(Error::MemoryRead {
                    address,
                    message: format!("address {:#x} is not mapped", addr),
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MockMemoryBuilder {
    reader: MockMemoryReader,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, byte) in data.iter().enumerate() {
            self.reader.bytes.insert(address + i as u64, *byte);
        }
        self
    }

    pub fn write_u32(self, address: u64, value: u32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_i32(self, address: u64, value: i32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn write_f32(self, address: u64, value: f32) -> Self {
        self.write_bytes(address, &value.to_le_bytes())
    }

    pub fn build(self) -> MockMemoryReader {
        self.reader
    }
}
