//! Flat-file table storage
//!
//! Every table lives in `<database>/<table>.data`, one record per line. Records are read
//! sequentially to exhaustion and decoded positionally against the table's columns.

use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    sql::{schema::Column, types::Row},
};

pub mod record;

/// Bytes added to the record width when sizing the read buffer (line framing)
pub const RECORD_SLACK: usize = 3;

/// Sequential reader over the lines of one table data file
pub struct TableFile {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl TableFile {
    /// Opens a data file, buffering reads by the table's record width
    pub fn open(path: &Path, record_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::DataFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::with_capacity(record_size + RECORD_SLACK, file).lines(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes every remaining record against `columns`, skipping blank lines
    pub fn records(self, columns: &[Column]) -> impl Iterator<Item = Result<Row>> + '_ {
        self.filter_map(move |line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(record::decode_record(&line, columns)),
            Err(err) => Some(Err(err)),
        })
    }
}

impl Iterator for TableFile {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(|line| {
            line.map_err(|e| Error::DataFile {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
        })
    }
}
