//! The persisted record of previously-announced entries.
//!
//! One comma-separated file with a `fingerprint,title,link` header,
//! appended to and never rewritten. The store is single-writer: run one
//! instance of the tool per store file.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::csv;
use crate::feed::Entry;
use crate::TARGET_STORE;

pub const STORE_HEADER: [&str; 3] = ["fingerprint", "title", "link"];

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persisted data cannot be trusted; the run refuses to start.
    #[error("corrupt store {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("store i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub struct SeenStore {
    path: PathBuf,
    fingerprints: HashSet<String>,
    records: usize,
}

impl SeenStore {
    /// Read the persisted records if the path exists, otherwise start
    /// empty. The fingerprint index lives in memory for O(1) membership.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut fingerprints = HashSet::new();
        let mut records = 0;

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let rows =
                csv::parse_records(&content).map_err(|err| corrupt(&path, err.to_string()))?;
            let mut rows = rows.into_iter();

            match rows.next() {
                Some(header) if header == STORE_HEADER => {}
                Some(header) => {
                    return Err(corrupt(&path, format!("unexpected header {:?}", header)))
                }
                None => return Err(corrupt(&path, "missing header row".to_string())),
            }

            for (index, row) in rows.enumerate() {
                if row.len() != STORE_HEADER.len() {
                    return Err(corrupt(
                        &path,
                        format!("record {} has {} fields, expected 3", index + 1, row.len()),
                    ));
                }
                if !is_fingerprint(&row[0]) {
                    return Err(corrupt(
                        &path,
                        format!("record {} has a malformed fingerprint", index + 1),
                    ));
                }
                fingerprints.insert(row[0].clone());
                records += 1;
            }
        }

        debug!(target: TARGET_STORE, "Loaded {} records from {}", records, path.display());
        Ok(Self {
            path,
            fingerprints,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    /// The subsequence of `batch` whose fingerprints are not yet
    /// persisted, in input order.
    pub fn filter_new(&self, batch: Vec<(Entry, String)>) -> Vec<(Entry, String)> {
        batch
            .into_iter()
            .filter(|(_, fingerprint)| !self.fingerprints.contains(fingerprint))
            .collect()
    }

    /// Durably append one record per item, in order, creating the file
    /// and header on first write. Fingerprints already recorded, on disk
    /// or earlier in the same batch, are skipped. Returns the number of
    /// records written.
    pub fn append(&mut self, batch: &[(Entry, String)]) -> Result<usize, StoreError> {
        let mut body = String::new();
        let mut added: Vec<String> = Vec::new();
        let mut batch_seen: HashSet<&str> = HashSet::new();

        for (entry, fingerprint) in batch {
            if self.fingerprints.contains(fingerprint) || !batch_seen.insert(fingerprint) {
                debug!(
                    target: TARGET_STORE,
                    "Fingerprint {} already recorded, not re-appending", fingerprint
                );
                continue;
            }
            body.push_str(&csv::format_record(&[
                fingerprint.as_str(),
                entry.title(),
                entry.link().unwrap_or(""),
            ]));
            body.push('\n');
            added.push(fingerprint.clone());
        }

        if added.is_empty() {
            return Ok(0);
        }

        let write_header = !self.path.exists();
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        if write_header {
            let mut header = csv::format_record(&STORE_HEADER);
            header.push('\n');
            file.write_all(header.as_bytes()).map_err(io_err)?;
        }
        file.write_all(body.as_bytes()).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        let written = added.len();
        self.records += written;
        for fingerprint in added {
            self.fingerprints.insert(fingerprint);
        }

        debug!(target: TARGET_STORE, "Appended {} records to {}", written, self.path.display());
        Ok(written)
    }
}

fn corrupt(path: &Path, reason: String) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        reason,
    }
}

fn is_fingerprint(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
