pub mod layout;
mod pointer;
mod reader;

#[cfg(test)]
pub mod mock;

pub use pointer::OffsetSpec;
pub use reader::ReadMemory;

#[cfg(test)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
