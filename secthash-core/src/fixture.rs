//! In-memory ELF images for tests.

use crate::header::{
    Endian, WordSize, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG, SHN_XINDEX,
};
use crate::sections::{SHT_NOBITS, SHT_NULL, SHT_PROGBITS, SHT_STRTAB};
use byteorder::{WriteBytesExt, BE, LE};

struct Entry {
    name: String,
    data: Vec<u8>,
    sh_type: u32,
    size: u64,
    offset: Option<u64>,
}

/// Lays out: file header, section contents, `.shstrtab`, section header
/// table. Section 0 is the null section and `.shstrtab` comes last.
pub struct ElfBuilder {
    word: WordSize,
    endian: Endian,
    entries: Vec<Entry>,
    extended: bool,
    with_table: bool,
    names_index: Option<u16>,
    entry_size: Option<u16>,
}

impl ElfBuilder {
    pub fn new(word: WordSize) -> Self {
        Self {
            word,
            endian: Endian::native(),
            entries: Vec::new(),
            extended: false,
            with_table: true,
            names_index: None,
            entry_size: None,
        }
    }

    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn section(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: data.to_vec(),
            sh_type: SHT_PROGBITS,
            size: data.len() as u64,
            offset: None,
        });
        self
    }

    pub fn nobits(mut self, name: &str, size: u64) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: Vec::new(),
            sh_type: SHT_NOBITS,
            size,
            offset: None,
        });
        self
    }

    /// A section whose header points at an arbitrary range.
    pub fn section_at(mut self, name: &str, offset: u64, size: u64) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: Vec::new(),
            sh_type: SHT_PROGBITS,
            size,
            offset: Some(offset),
        });
        self
    }

    /// Stores the count and name table index in section 0, as files with
    /// more than 0xff00 sections do.
    pub fn extended_numbering(mut self) -> Self {
        self.extended = true;
        self
    }

    pub fn without_section_table(mut self) -> Self {
        self.with_table = false;
        self
    }

    pub fn names_index(mut self, index: u16) -> Self {
        self.names_index = Some(index);
        self
    }

    /// Overrides `e_shentsize`. Entries larger than the standard layout are
    /// zero padded.
    pub fn entry_size(mut self, size: u16) -> Self {
        self.entry_size = Some(size);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let ehsize = self.word.header_size();
        let shentsize = self
            .entry_size
            .unwrap_or(self.word.section_header_size() as u16);

        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for e in &self.entries {
            if e.name.is_empty() {
                name_offsets.push(0);
            } else {
                name_offsets.push(strtab.len() as u32);
                strtab.extend_from_slice(e.name.as_bytes());
                strtab.push(0);
            }
        }
        let shstrtab_name = strtab.len() as u32;
        strtab.extend_from_slice(b".shstrtab\0");

        let mut out = Out::new(self.endian);
        out.buf.resize(ehsize, 0);

        let mut offsets = Vec::new();
        for e in &self.entries {
            offsets.push(e.offset.unwrap_or(out.buf.len() as u64));
            out.buf.extend_from_slice(&e.data);
        }
        let strtab_off = out.buf.len() as u64;
        out.buf.extend_from_slice(&strtab);
        while out.buf.len() % 8 != 0 {
            out.buf.push(0);
        }

        let count = self.entries.len() as u64 + 2;
        let strndx = count - 1;
        let shoff = out.buf.len() as u64;

        if self.with_table {
            let (null_size, null_link) = if self.extended {
                (count, strndx as u32)
            } else {
                (0, 0)
            };
            out.shdr(self.word, shentsize, 0, SHT_NULL, 0, null_size, null_link);
            for (i, e) in self.entries.iter().enumerate() {
                out.shdr(self.word, shentsize, name_offsets[i], e.sh_type, offsets[i], e.size, 0);
            }
            out.shdr(
                self.word,
                shentsize,
                shstrtab_name,
                SHT_STRTAB,
                strtab_off,
                strtab.len() as u64,
                0,
            );
        }

        let (shoff, shnum, shstrndx) = match (self.with_table, self.extended) {
            (false, _) => (0, 0, 0),
            (true, true) => (shoff, 0, SHN_XINDEX as u16),
            (true, false) => (shoff, count as u16, strndx as u16),
        };

        let mut hdr = Out::new(self.endian);
        hdr.buf.extend_from_slice(&ELFMAG);
        hdr.buf.push(match self.word {
            WordSize::Elf32 => ELFCLASS32,
            WordSize::Elf64 => ELFCLASS64,
        });
        hdr.buf.push(match self.endian {
            Endian::Little => ELFDATA2LSB,
            Endian::Big => ELFDATA2MSB,
        });
        hdr.buf.push(1);
        hdr.buf.resize(16, 0);
        hdr.u16(1); // ET_REL
        hdr.u16(match self.word {
            WordSize::Elf32 => 3,
            WordSize::Elf64 => 62,
        });
        hdr.u32(1);
        hdr.word(self.word, 0); // e_entry
        hdr.word(self.word, 0); // e_phoff
        hdr.word(self.word, shoff);
        hdr.u32(0);
        hdr.u16(ehsize as u16);
        hdr.u16(0);
        hdr.u16(0);
        hdr.u16(if self.with_table { shentsize } else { 0 });
        hdr.u16(shnum);
        hdr.u16(self.names_index.unwrap_or(shstrndx));
        assert_eq!(hdr.buf.len(), ehsize);

        out.buf[..ehsize].copy_from_slice(&hdr.buf);
        out.buf
    }
}

struct Out {
    buf: Vec<u8>,
    endian: Endian,
}

impl Out {
    fn new(endian: Endian) -> Self {
        Self {
            buf: Vec::new(),
            endian,
        }
    }

    fn u16(&mut self, v: u16) {
        match self.endian {
            Endian::Little => self.buf.write_u16::<LE>(v),
            Endian::Big => self.buf.write_u16::<BE>(v),
        }
        .unwrap()
    }

    fn u32(&mut self, v: u32) {
        match self.endian {
            Endian::Little => self.buf.write_u32::<LE>(v),
            Endian::Big => self.buf.write_u32::<BE>(v),
        }
        .unwrap()
    }

    fn u64(&mut self, v: u64) {
        match self.endian {
            Endian::Little => self.buf.write_u64::<LE>(v),
            Endian::Big => self.buf.write_u64::<BE>(v),
        }
        .unwrap()
    }

    fn word(&mut self, word: WordSize, v: u64) {
        match word {
            WordSize::Elf32 => self.u32(v as u32),
            WordSize::Elf64 => self.u64(v),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn shdr(
        &mut self,
        word: WordSize,
        entsize: u16,
        name: u32,
        sh_type: u32,
        offset: u64,
        size: u64,
        link: u32,
    ) {
        let start = self.buf.len();
        self.u32(name);
        self.u32(sh_type);
        self.word(word, 0); // sh_flags
        self.word(word, 0); // sh_addr
        self.word(word, offset);
        self.word(word, size);
        self.u32(link);
        self.u32(0); // sh_info
        self.word(word, 1); // sh_addralign
        self.word(word, 0); // sh_entsize
        self.buf.resize(start + entsize as usize, 0);
    }
}
