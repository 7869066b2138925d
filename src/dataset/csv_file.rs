// src/dataset/csv_file.rs

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};
use tracing::debug;

use super::{DataSource, Dataset};

/// Written ahead of the header row so spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimited-text data source. Every cell is read as a string.
pub struct CsvSource<R> {
    reader: Option<R>,
    delimiter: u8,
}

impl CsvSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> CsvSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl<R: Read> DataSource for CsvSource<R> {
    fn load(&mut self) -> Result<Dataset> {
        let reader = self
            .reader
            .take()
            .context("CSV source has already been consumed")?;
        read_dataset(reader, self.delimiter)
    }
}

/// Parse a delimited table with a header row.
///
/// Short records are padded with empty cells; records wider than the header
/// are rejected. A leading byte-order mark is dropped from the first header.
pub fn read_dataset<R: Read>(reader: R, delimiter: u8) -> Result<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{FEFF}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        if record.len() > headers.len() {
            bail!(
                "record {} has {} fields, header has {}",
                idx,
                record.len(),
                headers.len()
            );
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "loaded table");
    Ok(Dataset::new(headers, rows))
}

/// Write `dataset` as UTF-8 with a byte-order mark, header row first.
pub fn write_dataset<W: Write>(mut writer: W, dataset: &Dataset, delimiter: u8) -> Result<()> {
    writer.write_all(UTF8_BOM).context("writing byte-order mark")?;

    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    wtr.write_record(dataset.headers())
        .context("writing CSV header row")?;
    for (idx, row) in dataset.raw_rows().iter().enumerate() {
        wtr.write_record(row)
            .with_context(|| format!("writing CSV record {}", idx))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

pub fn write_dataset_path(path: impl AsRef<Path>, dataset: &Dataset, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_dataset(BufWriter::new(file), dataset, delimiter)
}
