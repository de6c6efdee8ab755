use std::io;
use thiserror::Error;

/// Broad class of a failure, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file could not be opened or read.
    Io,
    /// The bytes do not describe an ELF file we can walk.
    Format,
    /// A buffer for section data could not be allocated.
    Resource,
}

/// Errors raised while walking the section header table.
///
/// These travel inside an [`anyhow::Error`]; use
/// `err.downcast_ref::<ElfError>()` to inspect them.
#[derive(Debug, Error)]
pub enum ElfError {
    #[error("error reading from input file: {0}")]
    Io(#[from] io::Error),
    #[error("this is not an ELF file")]
    BadMagic,
    #[error("unknown binary word-size (class byte {0:#04x})")]
    UnknownClass(u8),
    #[error("could not read requested amount from input file ({what})")]
    Truncated { what: &'static str },
    #[error("section header entry size {entsize} is smaller than the {min} bytes required")]
    EntryTooSmall { entsize: u64, min: u64 },
    #[error("section name table index {index} is outside the {count} section headers")]
    StringTableIndex { index: u64, count: u64 },
    #[error("{what} at offset {offset:#x} with size {size} extends past the end of the file ({file_len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        size: u64,
        file_len: u64,
    },
    #[error("could not allocate {size} bytes to store the {what}")]
    Alloc { what: &'static str, size: u64 },
}

impl ElfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ElfError::Io(_) => ErrorKind::Io,
            ElfError::Alloc { .. } => ErrorKind::Resource,
            _ => ErrorKind::Format,
        }
    }

    /// Maps a failed `read_exact` onto the taxonomy: running out of input is a
    /// truncated file, anything else is an I/O failure.
    pub(crate) fn from_read(err: io::Error, what: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ElfError::Truncated { what }
        } else {
            ElfError::Io(err)
        }
    }
}
