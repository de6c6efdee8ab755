use crate::header::{Endian, FieldReader, Header, EI_NIDENT};
use std::io;

/// Represents the ELF (Executable and Linkable Format) header for a 64-bit object file.
///
/// This structure corresponds to the standard `Elf64_Ehdr` defined in the ELF specification.
/// It appears at the very beginning of every ELF file and contains metadata describing
/// the file's organization and layout.
///
/// Reference: [ELF Specification v1.2](https://refspecs.linuxfoundation.org/elf/elf.pdf)
#[derive(Debug, Clone, Copy)]
pub struct Elf64Ehdr {
    /// ELF identification bytes (magic number and other information).
    ///
    /// The first 4 bytes should be `0x7F`, `'E'`, `'L'`, `'F'`.
    /// Remaining bytes encode class (32/64-bit), endianness, and version.
    pub e_ident: [u8; 16],

    /// Object file type (e.g. relocatable, executable, shared, core).
    pub e_type: u16,

    /// Target architecture (e.g., x86_64, ARM).
    pub e_machine: u16,

    /// ELF version (usually set to `EV_CURRENT` = 1).
    pub e_version: u32,

    /// Virtual address of the program entry point.
    pub e_entry: u64,

    /// File offset of the program header table.
    pub e_phoff: u64,

    /// File offset of the section header table.
    ///
    /// Points to an array of `Elf64Shdr` entries.
    pub e_shoff: u64,

    /// Processor-specific flags.
    pub e_flags: u32,

    /// Size of this ELF header (usually `64` bytes for ELF64).
    pub e_ehsize: u16,

    /// Size of one entry in the program header table.
    pub e_phentsize: u16,

    /// Number of entries in the program header table.
    pub e_phnum: u16,

    /// Size of one entry in the section header table.
    pub e_shentsize: u16,

    /// Number of entries in the section header table.
    pub e_shnum: u16,

    /// Index of the section header string table.
    ///
    /// This section contains the names of all other sections.
    pub e_shstrndx: u16,
}

impl Elf64Ehdr {
    pub const SIZE: usize = 64;

    pub fn from_bytes(bytes: &[u8], endian: Endian) -> io::Result<Elf64Ehdr> {
        let mut rdr = FieldReader::new(bytes, endian);

        Ok(Elf64Ehdr {
            e_ident: rdr.bytes::<EI_NIDENT>()?,
            e_type: rdr.u16()?,
            e_machine: rdr.u16()?,
            e_version: rdr.u32()?,
            e_entry: rdr.u64()?,
            e_phoff: rdr.u64()?,
            e_shoff: rdr.u64()?,
            e_flags: rdr.u32()?,
            e_ehsize: rdr.u16()?,
            e_phentsize: rdr.u16()?,
            e_phnum: rdr.u16()?,
            e_shentsize: rdr.u16()?,
            e_shnum: rdr.u16()?,
            e_shstrndx: rdr.u16()?,
        })
    }
}

impl Header for Elf64Ehdr {
    fn section_header_offset(&self) -> u64 {
        self.e_shoff
    }

    fn section_header_entry_size(&self) -> u64 {
        self.e_shentsize as u64
    }

    fn section_count(&self) -> u64 {
        self.e_shnum as u64
    }

    fn string_table_index(&self) -> u64 {
        self.e_shstrndx as u64
    }
}

/// The 32-bit file header (`Elf32_Ehdr`). Same fields as [`Elf64Ehdr`], but
/// addresses and offsets are 32 bits wide, so everything after `e_version`
/// sits at a different offset.
#[derive(Debug, Clone, Copy)]
pub struct Elf32Ehdr {
    pub e_ident: [u8; 16],
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u32,
    pub e_phoff: u32,
    pub e_shoff: u32,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl Elf32Ehdr {
    pub const SIZE: usize = 52;

    pub fn from_bytes(bytes: &[u8], endian: Endian) -> io::Result<Elf32Ehdr> {
        let mut rdr = FieldReader::new(bytes, endian);

        Ok(Elf32Ehdr {
            e_ident: rdr.bytes::<EI_NIDENT>()?,
            e_type: rdr.u16()?,
            e_machine: rdr.u16()?,
            e_version: rdr.u32()?,
            e_entry: rdr.u32()?,
            e_phoff: rdr.u32()?,
            e_shoff: rdr.u32()?,
            e_flags: rdr.u32()?,
            e_ehsize: rdr.u16()?,
            e_phentsize: rdr.u16()?,
            e_phnum: rdr.u16()?,
            e_shentsize: rdr.u16()?,
            e_shnum: rdr.u16()?,
            e_shstrndx: rdr.u16()?,
        })
    }
}

impl Header for Elf32Ehdr {
    fn section_header_offset(&self) -> u64 {
        self.e_shoff as u64
    }

    fn section_header_entry_size(&self) -> u64 {
        self.e_shentsize as u64
    }

    fn section_count(&self) -> u64 {
        self.e_shnum as u64
    }

    fn string_table_index(&self) -> u64 {
        self.e_shstrndx as u64
    }
}
