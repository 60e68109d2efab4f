//! on-disk parse table cache
//!
//! A cache file holds one bincode encoded [ParseTable] together with [FORMAT_VERSION]. A file is only used when
//! the format version and the table's [Fingerprint] match the grammar compiled into this binary and the tables
//! pass [ParseTable::validate].
//!
//! Writes go to a temporary file in the target directory which is then renamed over the target. Readers see
//! either the old file or the new one, never a partially written one, even with several processes building the
//! table at the same time.
//!
//! [TableCache::load_or_build] never fails. Every cache problem is logged and answered with a fresh build.
use crate::grammar::{Fingerprint, FORMAT_VERSION};
use crate::table::{MalformedTable, ParseTable};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bound for cache files, protects against huge allocations when decoding garbage
const MAX_CACHE_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Deserialize)]
struct CacheFile {
    format: u32,
    table: ParseTable,
}

/// Borrowing twin of [CacheFile], encodes identically
#[derive(Serialize)]
struct CacheFileRef<'a> {
    format: u32,
    table: &'a ParseTable,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_CACHE_BYTES)
}

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to encode or decode cache file")]
    Codec(#[from] bincode::Error),
    #[error("Cache file format {found} does not match {expected}")]
    FormatMismatch { found: u32, expected: u32 },
    #[error("Cache file fingerprint {found} does not match grammar fingerprint {expected}")]
    FingerprintMismatch {
        found: Fingerprint,
        expected: Fingerprint,
    },
    #[error(transparent)]
    Malformed(#[from] MalformedTable),
    #[error("Unable to move cache file into place")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone)]
pub struct TableCache {
    path: PathBuf,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ParseTable, CacheError> {
        let bytes = std::fs::read(&self.path)?;
        let file: CacheFile = codec().deserialize(&bytes)?;

        if file.format != FORMAT_VERSION {
            return Err(CacheError::FormatMismatch {
                found: file.format,
                expected: FORMAT_VERSION,
            });
        }

        let expected = Fingerprint::of_grammar();
        if file.table.fingerprint() != expected {
            return Err(CacheError::FingerprintMismatch {
                found: file.table.fingerprint(),
                expected,
            });
        }

        file.table.validate()?;
        Ok(file.table)
    }

    /// Atomically replace the cache file with `table`
    pub fn store(&self, table: &ParseTable) -> Result<(), CacheError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory)?;

        let bytes = codec().serialize(&CacheFileRef {
            format: FORMAT_VERSION,
            table,
        })?;

        let mut file = tempfile::NamedTempFile::new_in(directory)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;

        Ok(())
    }

    /// Load the cached table or build (and try to store) a fresh one
    #[tracing::instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub fn load_or_build(&self) -> ParseTable {
        match self.load() {
            Ok(table) => {
                tracing::debug!("loaded parse table from cache");
                return table;
            }
            Err(CacheError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no cached parse table");
            }
            Err(err) => {
                tracing::warn!(error = %err, "discarding cached parse table");
            }
        }

        let table = ParseTable::build();
        match self.store(&table) {
            Ok(()) => tracing::info!("stored parse table"),
            Err(err) => tracing::warn!(error = %err, "unable to store parse table"),
        }
        table
    }
}
