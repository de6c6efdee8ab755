//! Walks the section header table of an ELF file and fingerprints each
//! section's contents.

pub mod binary;
pub mod digest;
pub mod error;
pub mod header;
pub mod sections;

#[cfg(test)]
mod fixture;

pub use binary::*;
pub use digest::*;
pub use error::{ElfError, ErrorKind};
pub use header::{Endian, Header, Ident, WordSize};
pub use sections::*;
