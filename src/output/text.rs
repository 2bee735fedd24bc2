//! Human-readable listing of similar pairs.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::scanner::FingerprintRecord;
use crate::similarity::{ScanSummary, SimilarPair};

/// Plain-text report formatter.
pub struct TextOutput<'a> {
    pairs: &'a [SimilarPair],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(pairs: &'a [SimilarPair], summary: &'a ScanSummary) -> Self {
        Self { pairs, summary }
    }

    fn describe(record: &FingerprintRecord) -> String {
        format!(
            "{} ({}, {})",
            record.path.display(),
            record.resolution,
            ByteSize::b(record.file_size)
        )
    }

    /// Write the listing followed by a one-line summary.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.pairs.is_empty() {
            writeln!(writer, "No similar images found.")?;
        }

        for (idx, pair) in self.pairs.iter().enumerate() {
            writeln!(
                writer,
                "Pair {} - {:.2}% similar (distance {})",
                idx + 1,
                pair.similarity,
                pair.distance
            )?;
            writeln!(writer, "  {}", Self::describe(&pair.first))?;
            writeln!(writer, "  {}", Self::describe(&pair.second))?;
        }

        let s = self.summary;
        writeln!(
            writer,
            "\n{} pair(s) among {} image(s); {} from cache, {} hashed, {} failed.",
            self.pairs.len(),
            s.files_discovered,
            s.cache_hits,
            s.computed,
            s.failed
        )
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
