pub mod elf;

use crate::error::ElfError;
use crate::sections::{Elf32Shdr, Elf64Shdr, SectionHeader};
use anyhow::Result;
use byteorder::{ReadBytesExt, BE, LE};
use std::fmt;
use std::io::{self, Cursor, Read};

pub use elf::{Elf32Ehdr, Elf64Ehdr};

/// The four bytes every ELF file starts with.
pub const ELFMAG: [u8; 4] = [0x7f, b'E', b'L', b'F'];
pub const EI_NIDENT: usize = 16;
pub const EI_CLASS: usize = 4;
pub const EI_DATA: usize = 5;
pub const ELFCLASS32: u8 = 1;
pub const ELFCLASS64: u8 = 2;
pub const ELFDATA2LSB: u8 = 1;
pub const ELFDATA2MSB: u8 = 2;

/// Section index meaning "look in section 0 instead" for `e_shstrndx`.
pub const SHN_XINDEX: u64 = 0xffff;

/// Word-size independent view of the file header fields needed to walk the
/// section header table.
pub trait Header: fmt::Debug {
    /// File offset of the section header table (`e_shoff`).
    fn section_header_offset(&self) -> u64;

    /// Size of one entry in the section header table (`e_shentsize`).
    fn section_header_entry_size(&self) -> u64;

    /// Raw `e_shnum`. Zero may mean "extended numbering" when the table
    /// offset is non-zero.
    fn section_count(&self) -> u64;

    /// Raw `e_shstrndx`, possibly [`SHN_XINDEX`].
    fn string_table_index(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordSize {
    Elf32,
    Elf64,
}

impl WordSize {
    pub fn from_class(class: u8) -> Result<Self, ElfError> {
        match class {
            ELFCLASS32 => Ok(WordSize::Elf32),
            ELFCLASS64 => Ok(WordSize::Elf64),
            other => Err(ElfError::UnknownClass(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            WordSize::Elf32 => 32,
            WordSize::Elf64 => 64,
        }
    }

    /// On-disk size of the file header for this word size.
    pub fn header_size(self) -> usize {
        match self {
            WordSize::Elf32 => Elf32Ehdr::SIZE,
            WordSize::Elf64 => Elf64Ehdr::SIZE,
        }
    }

    /// Minimum on-disk size of one section header for this word size.
    pub fn section_header_size(self) -> usize {
        match self {
            WordSize::Elf32 => Elf32Shdr::SIZE,
            WordSize::Elf64 => Elf64Shdr::SIZE,
        }
    }

    pub fn parse_header(self, bytes: &[u8], endian: Endian) -> Result<Box<dyn Header>> {
        let hdr: Box<dyn Header> = match self {
            WordSize::Elf32 => Box::new(
                Elf32Ehdr::from_bytes(bytes, endian)
                    .map_err(|e| ElfError::from_read(e, "ELF header"))?,
            ),
            WordSize::Elf64 => Box::new(
                Elf64Ehdr::from_bytes(bytes, endian)
                    .map_err(|e| ElfError::from_read(e, "ELF header"))?,
            ),
        };
        Ok(hdr)
    }

    pub fn parse_section_header(
        self,
        bytes: &[u8],
        endian: Endian,
    ) -> Result<Box<dyn SectionHeader>> {
        let shdr: Box<dyn SectionHeader> = match self {
            WordSize::Elf32 => Box::new(
                Elf32Shdr::from_bytes(bytes, endian)
                    .map_err(|e| ElfError::from_read(e, "section header"))?,
            ),
            WordSize::Elf64 => Box::new(
                Elf64Shdr::from_bytes(bytes, endian)
                    .map_err(|e| ElfError::from_read(e, "section header"))?,
            ),
        };
        Ok(shdr)
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// The `e_ident` block at the start of the file.
#[derive(Debug, Clone, Copy)]
pub struct Ident {
    pub word_size: WordSize,
    pub endian: Endian,
}

impl Ident {
    /// Reads the identification prefix from the current position.
    pub fn from_reader<R: Read>(rdr: &mut R) -> Result<Self> {
        let mut bytes = [0u8; EI_NIDENT];
        rdr.read_exact(&mut bytes)
            .map_err(|e| ElfError::from_read(e, "ELF identification"))?;
        Ok(Self::parse(bytes)?)
    }

    pub fn parse(bytes: [u8; EI_NIDENT]) -> Result<Self, ElfError> {
        if bytes[..ELFMAG.len()] != ELFMAG {
            return Err(ElfError::BadMagic);
        }

        let word_size = WordSize::from_class(bytes[EI_CLASS])?;
        let endian = match bytes[EI_DATA] {
            ELFDATA2LSB => Endian::Little,
            ELFDATA2MSB => Endian::Big,
            other => {
                log::warn!("unrecognised data encoding {other:#04x}, assuming native byte order");
                Endian::native()
            }
        };

        Ok(Self {
            word_size,
            endian,
        })
    }
}

/// Decodes fixed-width integers in the file's byte order.
pub(crate) struct FieldReader<'a> {
    cur: Cursor<&'a [u8]>,
    endian: Endian,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8], endian: Endian) -> Self {
        Self {
            cur: Cursor::new(bytes),
            endian,
        }
    }

    pub fn bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut out = [0u8; N];
        self.cur.read_exact(&mut out)?;
        Ok(out)
    }

    pub fn u16(&mut self) -> io::Result<u16> {
        match self.endian {
            Endian::Little => self.cur.read_u16::<LE>(),
            Endian::Big => self.cur.read_u16::<BE>(),
        }
    }

    pub fn u32(&mut self) -> io::Result<u32> {
        match self.endian {
            Endian::Little => self.cur.read_u32::<LE>(),
            Endian::Big => self.cur.read_u32::<BE>(),
        }
    }

    pub fn u64(&mut self) -> io::Result<u64> {
        match self.endian {
            Endian::Little => self.cur.read_u64::<LE>(),
            Endian::Big => self.cur.read_u64::<BE>(),
        }
    }
}
