use crate::digest::SectionDigest;
use crate::error::ElfError;
use crate::header::{Header, Ident, WordSize, SHN_XINDEX};
use crate::sections::{SectionHeader, SectionRecord, StringTable};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// An ELF file opened for walking its section header table.
///
/// Opening reads the identification, the file header and the section name
/// string table. Section contents are only read while iterating
/// [`Binary::sections`], one section at a time.
pub struct Binary<R> {
    rdr: R,
    file_len: u64,
    ident: Ident,
    header: Box<dyn Header>,
    section_count: u64,
    string_table_index: u64,
    strtab: StringTable,
}

impl Binary<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(ElfError::from)
            .with_context(|| format!("could not open file: {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Binary<R> {
    pub fn from_reader(mut rdr: R) -> Result<Self> {
        let file_len = seek_to(&mut rdr, SeekFrom::End(0))?;
        seek_to(&mut rdr, SeekFrom::Start(0))?;

        let ident = Ident::from_reader(&mut rdr)?;
        log::debug!("{} ELF, {:?} endian", ident.word_size, ident.endian);

        seek_to(&mut rdr, SeekFrom::Start(0))?;
        let mut raw = vec![0u8; ident.word_size.header_size()];
        rdr.read_exact(&mut raw)
            .map_err(|e| ElfError::from_read(e, "ELF header"))?;
        let header = ident.word_size.parse_header(&raw, ident.endian)?;
        log::debug!(
            "section headers: offset={:#x} entsize={} count={} shstrndx={}",
            header.section_header_offset(),
            header.section_header_entry_size(),
            header.section_count(),
            header.string_table_index()
        );

        let mut bin = Self {
            rdr,
            file_len,
            ident,
            section_count: header.section_count(),
            string_table_index: header.string_table_index(),
            header,
            strtab: StringTable::default(),
        };
        bin.resolve_extended_numbering()?;
        bin.validate_table()?;
        bin.strtab = bin.load_string_table()?;
        Ok(bin)
    }

    pub fn header(&self) -> &dyn Header {
        self.header.as_ref()
    }

    pub fn word_size(&self) -> WordSize {
        self.ident.word_size
    }

    /// Number of entries in the section header table, including the null
    /// section at index 0.
    pub fn section_count(&self) -> u64 {
        self.section_count
    }

    pub fn string_table(&self) -> &StringTable {
        &self.strtab
    }

    /// Walks the section header table in file order.
    ///
    /// Iteration stops after the first error.
    pub fn sections(&mut self) -> Sections<'_, R> {
        Sections {
            bin: self,
            next: 0,
            started: false,
        }
    }

    fn entry_size(&self) -> u64 {
        self.header.section_header_entry_size()
    }

    /// Files with more than `SHN_LORESERVE` sections keep the real count in
    /// section 0's `sh_size` and the real name table index in its `sh_link`.
    fn resolve_extended_numbering(&mut self) -> Result<()> {
        let shoff = self.header.section_header_offset();
        let count_escaped = self.section_count == 0 && shoff != 0;
        let index_escaped = self.string_table_index == SHN_XINDEX;
        if !count_escaped && !index_escaped {
            return Ok(());
        }

        self.check_entry_size()?;
        let first = self.read_section_header(0)?;
        if count_escaped {
            self.section_count = first.size();
            log::debug!("extended section count: {}", self.section_count);
        }
        if index_escaped {
            self.string_table_index = first.link() as u64;
            log::debug!("extended name table index: {}", self.string_table_index);
        }
        Ok(())
    }

    fn check_entry_size(&self) -> Result<()> {
        let min = self.ident.word_size.section_header_size() as u64;
        if self.entry_size() < min {
            return Err(ElfError::EntryTooSmall {
                entsize: self.entry_size(),
                min,
            }
            .into());
        }
        Ok(())
    }

    fn validate_table(&self) -> Result<()> {
        if self.section_count == 0 {
            return Ok(());
        }
        self.check_entry_size()?;

        let shoff = self.header.section_header_offset();
        let table_size = self
            .section_count
            .checked_mul(self.entry_size())
            .unwrap_or(u64::MAX);
        self.check_range("section header table", shoff, table_size)?;

        if self.string_table_index >= self.section_count {
            return Err(ElfError::StringTableIndex {
                index: self.string_table_index,
                count: self.section_count,
            }
            .into());
        }
        Ok(())
    }

    fn check_range(&self, what: &'static str, offset: u64, size: u64) -> Result<(), ElfError> {
        match offset.checked_add(size) {
            Some(end) if end <= self.file_len => Ok(()),
            _ => Err(ElfError::OutOfBounds {
                what,
                offset,
                size,
                file_len: self.file_len,
            }),
        }
    }

    fn load_string_table(&mut self) -> Result<StringTable> {
        if self.section_count == 0 {
            log::debug!("no section headers, skipping name table");
            return Ok(StringTable::default());
        }

        let shdr = self.read_section_header(self.string_table_index)?;
        log::debug!(
            "name table: section {} at {:#x}, {} bytes",
            self.string_table_index,
            shdr.file_offset(),
            shdr.size()
        );
        let data = self.read_range("string table", shdr.file_offset(), shdr.size())?;
        Ok(StringTable::new(data))
    }

    /// Reads the `index`th entry of the section header table.
    fn read_section_header(&mut self, index: u64) -> Result<Box<dyn SectionHeader>> {
        let offset = index
            .checked_mul(self.entry_size())
            .and_then(|o| o.checked_add(self.header.section_header_offset()))
            .unwrap_or(u64::MAX);
        self.check_range("section header", offset, self.entry_size())?;
        seek_to(&mut self.rdr, SeekFrom::Start(offset))?;
        self.read_next_section_header()
    }

    /// Reads one section header entry at the current position.
    fn read_next_section_header(&mut self) -> Result<Box<dyn SectionHeader>> {
        let mut raw = vec![0u8; self.entry_size() as usize];
        self.rdr
            .read_exact(&mut raw)
            .map_err(|e| ElfError::from_read(e, "section header"))?;
        self.ident
            .word_size
            .parse_section_header(&raw, self.ident.endian)
    }

    /// Reads `size` bytes at `offset` into a freshly allocated buffer.
    fn read_range(&mut self, what: &'static str, offset: u64, size: u64) -> Result<Vec<u8>> {
        self.check_range(what, offset, size)?;
        let len = usize::try_from(size).map_err(|_| ElfError::Alloc { what, size })?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| ElfError::Alloc { what, size })?;
        buf.resize(len, 0);

        seek_to(&mut self.rdr, SeekFrom::Start(offset))?;
        self.rdr
            .read_exact(&mut buf)
            .map_err(|e| ElfError::from_read(e, what))?;
        Ok(buf)
    }

    fn next_record(&mut self, index: u64) -> Result<SectionRecord> {
        let shdr = self.read_next_section_header()?;
        let name = self.strtab.section_name(shdr.name_offset());
        let size = shdr.size();

        let digest = if size == 0 {
            SectionDigest::of(&[])
        } else {
            let here = self.rdr.stream_position().map_err(ElfError::from)?;
            let data = self
                .read_range("section data", shdr.file_offset(), size)
                .with_context(|| format!("section {} ({name})", index + 1))?;
            seek_to(&mut self.rdr, SeekFrom::Start(here))?;
            SectionDigest::of(&data)
        };

        log::trace!(
            "section {}: {name} type={} {size} bytes {digest:x}",
            index + 1,
            shdr.section_type()
        );
        Ok(SectionRecord {
            index: index as usize + 1,
            name,
            size,
            digest,
        })
    }
}

fn seek_to<S: Seek>(rdr: &mut S, pos: SeekFrom) -> Result<u64, ElfError> {
    Ok(rdr.seek(pos)?)
}

/// Iterator over the section header table, yielding one [`SectionRecord`]
/// per entry. Each section's bytes are dropped once digested.
pub struct Sections<'a, R> {
    bin: &'a mut Binary<R>,
    next: u64,
    started: bool,
}

impl<R: Read + Seek> Iterator for Sections<'_, R> {
    type Item = Result<SectionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.bin.section_count {
            return None;
        }

        if !self.started {
            self.started = true;
            let shoff = self.bin.header.section_header_offset();
            if let Err(e) = seek_to(&mut self.bin.rdr, SeekFrom::Start(shoff)) {
                self.next = self.bin.section_count;
                return Some(Err(e.into()));
            }
        }

        let index = self.next;
        match self.bin.next_record(index) {
            Ok(record) => {
                self.next += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.next = self.bin.section_count;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.bin.section_count.saturating_sub(self.next) as usize;
        (0, Some(left))
    }
}
