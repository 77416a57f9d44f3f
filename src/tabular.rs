//! CSV reading and writing shared by the review, ledger and output tables.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

/// Problems with an input table. All of these end a run early without
/// writing anything.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("file '{0}' was not found")]
    NotFound(PathBuf),
    #[error("file '{0}' is empty")]
    Empty(PathBuf),
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("'{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
    #[error("'{path}' row {row}: invalid {column} value '{value}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },
    #[error("'{path}' lists '{key}' more than once")]
    DuplicateKey { path: PathBuf, key: String },
}

/// A CSV file read wholesale: header row plus data rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub path: PathBuf,
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    pub fn read(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TableError::NotFound(path.to_path_buf()),
            _ => TableError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_reader(file, path)
    }

    /// Parses CSV from `reader`; `path` is only used to label errors.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, TableError> {
        let parse = |source: csv::Error| TableError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers().map_err(parse)?.clone();
        if headers.is_empty() || headers.iter().all(str::is_empty) {
            return Err(TableError::Empty(path.to_path_buf()));
        }

        let rows = rdr
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(parse)?;

        debug!(path = %path.display(), columns = headers.len(), rows = rows.len(), "Table loaded");
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn column(&self, name: &str) -> Result<usize, TableError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }
}

/// A table fully written to a temporary sibling of its destination. The
/// destination is only replaced by [`StagedTable::commit`]; dropping an
/// uncommitted stage removes the temporary file.
#[derive(Debug)]
pub struct StagedTable {
    tmp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedTable {
    pub fn path(&self) -> &Path {
        &self.tmp
    }

    /// Renames the staged file over the destination.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.tmp, &self.dest)
            .with_context(|| format!("could not replace '{}'", self.dest.display()))?;
        self.committed = true;
        debug!(path = %self.dest.display(), "Table committed");
        Ok(())
    }
}

impl Drop for StagedTable {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `headers` and `rows` next to `path` without touching `path` itself.
pub fn stage_table<H, R, F>(path: &Path, headers: H, rows: R) -> Result<StagedTable>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<[u8]>,
{
    let tmp = staging_path(path);
    let mut writer = WriterBuilder::new()
        .from_path(&tmp)
        .with_context(|| format!("could not create '{}'", tmp.display()))?;
    // From here on a failure drops the stage, which removes the partial file.
    let staged = StagedTable {
        tmp,
        dest: path.to_path_buf(),
        committed: false,
    };

    writer.write_record(headers)?;
    let mut count = 0usize;
    for row in rows {
        writer.write_record(row)?;
        count += 1;
    }
    writer.flush()?;
    drop(writer);

    debug!(path = %staged.tmp.display(), rows = count, "Table staged");
    Ok(staged)
}
