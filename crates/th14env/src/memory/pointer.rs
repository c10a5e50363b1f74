//! Pointer-chain resolution.
//!
//! A value whose absolute address changes between runs is reached through a
//! chain of 32-bit pointers rooted at a fixed offset from the module base:
//!
//! ```text
//! Direct(0xDB544)                      -> base + 0xDB544
//! Chain(Direct(0xDB544), 0xD0)         -> *(u32*)(base + 0xDB544) + 0xD0
//! Chain(Chain(Direct(0xDB544), 0xD0), 0x4)
//!                                      -> *(u32*)(*(u32*)(base + 0xDB544) + 0xD0) + 0x4
//! ```

use std::fmt;

use super::ReadMemory;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetSpec {
    /// Offset from the module base address
    Direct(u64),
    /// Read a little-endian u32 pointer at the resolved `base`, then add `offset`
    Chain {
        base: &'static OffsetSpec,
        offset: u64,
    },
}

impl OffsetSpec {
    pub const fn chain(base: &'static OffsetSpec, offset: u64) -> Self {
        Self::Chain { base, offset }
    }

    /// Number of pointer dereferences needed to resolve this spec
    pub fn depth(&self) -> usize {
        match self {
            Self::Direct(_) => 0,
            Self::Chain { base, .. } => base.depth() + 1,
        }
    }

    /// Resolve to the absolute address of the value
    pub fn resolve<R: ReadMemory + ?Sized>(&self, reader: &R, module_base: u64) -> Result<u64> {
        match self {
            Self::Direct(offset) => Ok(module_base.wrapping_add(*offset)),
            Self::Chain { base, offset } => {
                let pointer_at = base.resolve(reader, module_base)?;
                let pointer = reader.read_u32(pointer_at)?;
                Ok(u64::from(pointer).wrapping_add(*offset))
            }
        }
    }
}

impl fmt::Display for OffsetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(offset) => write!(f, "[base+{:#X}]", offset),
            Self::Chain { base, offset } => write!(f, "{}->+{:#X}", base, offset),
        }
    }
}
