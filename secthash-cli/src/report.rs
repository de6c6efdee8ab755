use anyhow::Result;
use secthash_core::SectionRecord;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One aligned line per section.
    #[default]
    Plain,
    /// Comma separated, with a `#` header line.
    Csv,
    /// One JSON object per line.
    Json,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    file: &'a str,
    index: usize,
    name: &'a str,
    size: u64,
    sha1: String,
}

/// Renders section records for one input file.
pub struct Reporter<W> {
    out: W,
    mode: OutputMode,
    file: String,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, mode: OutputMode, file: impl Into<String>) -> Self {
        Self {
            out,
            mode,
            file: file.into(),
        }
    }

    pub fn header(&mut self, section_count: u64) -> Result<()> {
        match self.mode {
            OutputMode::Plain => writeln!(self.out, "{}: {section_count} sections:", self.file)?,
            OutputMode::Csv => writeln!(self.out, "# Filename, Section Name, Size, SHA1 Hash")?,
            OutputMode::Json => {}
        }
        Ok(())
    }

    pub fn section(&mut self, rec: &SectionRecord) -> Result<()> {
        match self.mode {
            OutputMode::Plain => writeln!(
                self.out,
                " {:>2}) {:<20} <0x{:x}> [{} bytes]",
                rec.index, rec.name, rec.digest, rec.size
            )?,
            OutputMode::Csv => writeln!(
                self.out,
                "{}, {}, {}, <0x{:x}>",
                self.file, rec.name, rec.size, rec.digest
            )?,
            OutputMode::Json => {
                let line = JsonSection {
                    file: &self.file,
                    index: rec.index,
                    name: &rec.name,
                    size: rec.size,
                    sha1: rec.digest.to_hex(),
                };
                serde_json::to_writer(&mut self.out, &line)?;
                writeln!(self.out)?;
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
