use crate::digest::SectionDigest;
use crate::header::{Endian, FieldReader};
use std::borrow::Cow;
use std::fmt;
use std::io;

pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_STRTAB: u32 = 3;
/// Section occupies no space in the file (`.bss` and friends).
pub const SHT_NOBITS: u32 = 8;

/// Placeholder used when a section has no name.
pub const NO_NAME: &str = "<none>";

/// Word-size independent view of one section header table entry.
pub trait SectionHeader: fmt::Debug {
    /// Offset of the name inside the section name string table (`sh_name`).
    fn name_offset(&self) -> u32;

    fn section_type(&self) -> u32;

    /// File offset of the section's contents (`sh_offset`).
    fn file_offset(&self) -> u64;

    /// Size of the section's contents in bytes (`sh_size`).
    fn size(&self) -> u64;

    fn link(&self) -> u32;
}

/// 64-bit section header (`Elf64_Shdr`).
#[derive(Debug, Clone, Copy)]
pub struct Elf64Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Elf64Shdr {
    pub const SIZE: usize = 64;

    /// Decodes one entry from the start of `bytes`. Anything past
    /// [`Self::SIZE`] is ignored, so entries larger than the standard layout
    /// still decode.
    pub fn from_bytes(bytes: &[u8], endian: Endian) -> io::Result<Self> {
        let mut rdr = FieldReader::new(bytes, endian);

        Ok(Self {
            sh_name: rdr.u32()?,
            sh_type: rdr.u32()?,
            sh_flags: rdr.u64()?,
            sh_addr: rdr.u64()?,
            sh_offset: rdr.u64()?,
            sh_size: rdr.u64()?,
            sh_link: rdr.u32()?,
            sh_info: rdr.u32()?,
            sh_addralign: rdr.u64()?,
            sh_entsize: rdr.u64()?,
        })
    }
}

impl SectionHeader for Elf64Shdr {
    fn name_offset(&self) -> u32 {
        self.sh_name
    }

    fn section_type(&self) -> u32 {
        self.sh_type
    }

    fn file_offset(&self) -> u64 {
        self.sh_offset
    }

    fn size(&self) -> u64 {
        self.sh_size
    }

    fn link(&self) -> u32 {
        self.sh_link
    }
}

/// 32-bit section header (`Elf32_Shdr`).
#[derive(Debug, Clone, Copy)]
pub struct Elf32Shdr {
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u32,
    pub sh_addr: u32,
    pub sh_offset: u32,
    pub sh_size: u32,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u32,
    pub sh_entsize: u32,
}

impl Elf32Shdr {
    pub const SIZE: usize = 40;

    pub fn from_bytes(bytes: &[u8], endian: Endian) -> io::Result<Self> {
        let mut rdr = FieldReader::new(bytes, endian);

        Ok(Self {
            sh_name: rdr.u32()?,
            sh_type: rdr.u32()?,
            sh_flags: rdr.u32()?,
            sh_addr: rdr.u32()?,
            sh_offset: rdr.u32()?,
            sh_size: rdr.u32()?,
            sh_link: rdr.u32()?,
            sh_info: rdr.u32()?,
            sh_addralign: rdr.u32()?,
            sh_entsize: rdr.u32()?,
        })
    }
}

impl SectionHeader for Elf32Shdr {
    fn name_offset(&self) -> u32 {
        self.sh_name
    }

    fn section_type(&self) -> u32 {
        self.sh_type
    }

    fn file_offset(&self) -> u64 {
        self.sh_offset as u64
    }

    fn size(&self) -> u64 {
        self.sh_size as u64
    }

    fn link(&self) -> u32 {
        self.sh_link
    }
}

/// The section name string table: NUL-terminated names packed back to back.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    data: Vec<u8>,
}

impl StringTable {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the string starting at `offset`, up to the next NUL or the end
    /// of the table, whichever comes first. `None` if `offset` is past the end.
    pub fn get(&self, offset: u32) -> Option<Cow<'_, str>> {
        let start = offset as usize;
        let tail = self.data.get(start..)?;
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Some(String::from_utf8_lossy(&tail[..end]))
    }

    /// Resolves a section name, falling back to [`NO_NAME`] for empty or
    /// unresolvable names.
    pub fn section_name(&self, offset: u32) -> String {
        match self.get(offset) {
            Some(name) if !name.is_empty() => name.into_owned(),
            Some(_) => NO_NAME.to_string(),
            None => {
                log::warn!(
                    "name offset {offset:#x} is outside the {} byte string table",
                    self.data.len()
                );
                NO_NAME.to_string()
            }
        }
    }
}

/// What gets reported for each section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    /// 1-based position in the section header table.
    pub index: usize,
    pub name: String,
    pub size: u64,
    pub digest: SectionDigest,
}
