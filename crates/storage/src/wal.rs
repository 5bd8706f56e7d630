// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL operation write-ahead log.
//!
//! Operations are durably stored before being applied to the materialized
//! state, enabling crash recovery via snapshot + replay. Each entry is a
//! single line of JSON: `{"seq":N,"op":{...}}\n`. Appends are buffered;
//! `flush()` is the durability point and issues a single fsync for
//! everything buffered since the last flush.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization helper for writing entries without cloning the op.
#[derive(Serialize)]
struct WalRecordRef<'a, T> {
    seq: u64,
    op: &'a T,
}

/// Deserialization helper for reading entries.
#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct WalRecord<T> {
    seq: u64,
    op: T,
}

/// A single WAL entry with its sequence number.
#[derive(Debug, Clone)]
pub struct WalEntry<T> {
    pub seq: u64,
    pub op: T,
}

/// Append-only operation log, generic over the op type of the owning store.
pub struct Wal<T> {
    file: File,
    path: PathBuf,
    /// Highest sequence number written (0 when empty)
    write_seq: u64,
    /// Buffered JSON lines waiting to be flushed (without trailing newline)
    write_buffer: Vec<Vec<u8>>,
    _op: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> Wal<T> {
    /// Open or create a WAL at the given path.
    ///
    /// Scans existing entries to find the highest sequence number. A corrupt
    /// tail (partial write from a crash) is rotated to a `.bak` file and the
    /// valid prefix is preserved in a fresh, clean log.
    pub fn open(path: &Path) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (mut write_seq, corrupt) = Self::scan(&file)?;

        if corrupt {
            let valid_lines = Self::read_valid_lines(&file)?;
            drop(file);

            let bak_path = crate::snapshot::rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak_path.display(),
                valid_entries = valid_lines.len(),
                "corrupt WAL tail detected, rotating to .bak and preserving valid entries",
            );
            std::fs::rename(path, &bak_path)?;

            {
                let mut new_file = File::create(path)?;
                for line in &valid_lines {
                    new_file.write_all(line.as_bytes())?;
                    new_file.write_all(b"\n")?;
                }
                new_file.sync_all()?;
            }

            file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(path)?;
            write_seq = Self::scan(&file)?.0;
        }

        Ok(Self {
            file,
            path: path.to_owned(),
            write_seq,
            write_buffer: Vec::new(),
            _op: PhantomData,
        })
    }

    /// Scan the log for the maximum sequence number.
    ///
    /// Returns `(max_seq, corrupt)` where `corrupt` is true if an
    /// unparseable entry was encountered (not just EOF).
    fn scan(file: &File) -> Result<(u64, bool), WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut max_seq = 0u64;
        let mut corrupt = false;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    corrupt = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalRecord<T>>(trimmed) {
                Ok(record) => max_seq = max_seq.max(record.seq),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        Ok((max_seq, corrupt))
    }

    /// Read all parseable lines, stopping at the first corrupt entry.
    fn read_valid_lines(file: &File) -> Result<Vec<String>, WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut valid_lines = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if serde_json::from_str::<WalRecord<T>>(trimmed).is_err() {
                break;
            }

            valid_lines.push(trimmed.to_string());
        }

        Ok(valid_lines)
    }

    /// Append an op to the write buffer.
    ///
    /// Returns the assigned sequence number. The op is NOT durable until
    /// `flush()` is called.
    pub fn append(&mut self, op: &T) -> Result<u64, WalError> {
        self.write_seq += 1;
        let seq = self.write_seq;
        let record = WalRecordRef { seq, op };
        self.write_buffer.push(serde_json::to_vec(&record)?);
        Ok(seq)
    }

    /// Flush all buffered entries to disk with a single fsync.
    ///
    /// This is the durability point: after `flush` returns, every buffered
    /// op is guaranteed to be on disk.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        for mut json_bytes in self.write_buffer.drain(..) {
            json_bytes.push(b'\n');
            self.file.write_all(&json_bytes)?;
        }

        self.file.sync_all()?;
        Ok(())
    }

    /// Highest sequence number assigned so far.
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Iterate over all durable entries with `seq > after`.
    ///
    /// Used for recovery: replay everything newer than the snapshot.
    /// Stops (with a warning) at the first corrupt entry.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry<T>>, WalError> {
        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut entries = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record: WalRecord<T> = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "corrupt WAL entry during replay, stopping at corruption point");
                    break;
                }
            };

            if record.seq > after {
                entries.push(WalEntry {
                    seq: record.seq,
                    op: record.op,
                });
            }
        }

        Ok(entries)
    }

    /// Drop entries with `seq < keep_from`, rewriting the log atomically.
    ///
    /// Called after a checkpoint to reclaim disk space. The snapshot must be
    /// durable before this runs.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.flush()?;

        let kept: Vec<String> = {
            let mut reader = BufReader::new(self.file.try_clone()?);
            reader.seek(SeekFrom::Start(0))?;

            let mut kept = Vec::new();
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                    Err(e) => return Err(e.into()),
                }

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let record: WalRecord<T> = match serde_json::from_str(trimmed) {
                    Ok(r) => r,
                    Err(_) => break,
                };

                if record.seq >= keep_from {
                    kept.push(trimmed.to_string());
                }
            }
            kept
        };

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            for kept_line in &kept {
                tmp_file.write_all(kept_line.as_bytes())?;
                tmp_file.write_all(b"\n")?;
            }
            tmp_file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
