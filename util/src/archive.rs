//! Struct archiving functionality
//!
//! Archives are CSV files written under the session's archive root, one row
//! per cycle. Records must be flat (no nested structs) so that each field
//! maps onto a single column.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use csv::WriterBuilder;
pub use csv::Writer;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Cannot create the archive file: {0}")]
    FileCreateError(std::io::Error),

    #[error("Cannot write the archive record: {0}")]
    WriteError(csv::Error),

    #[error("Cannot flush the archive file: {0}")]
    FlushError(std::io::Error),

    #[error("The archiver has not been initialised")]
    NotInit
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        Self::create(session_path)
    }

    /// Create a new archiver writing to the given file, truncating it if it
    /// already exists. Parent directories are created as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::FileCreateError)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(path)
            .map_err(ArchiveError::FileCreateError)?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: serde::Serialize>(
        &mut self, record: T
    ) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::WriteError)?;
                w.flush().map_err(ArchiveError::FlushError)
            },
            None => Err(ArchiveError::NotInit)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        time_s: f64,
        value: f64
    }

    #[test]
    fn test_archiver_writes_rows() {
        let mut path = std::env::temp_dir();
        path.push("util_archive_test");
        path.push("rows.csv");

        let mut arch = Archiver::create(&path).unwrap();
        arch.serialise(Row { time_s: 0.0, value: 1.0 }).unwrap();
        arch.serialise(Row { time_s: 0.1, value: 2.5 }).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["time_s,value", "0.0,1.0", "0.1,2.5"]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_default_archiver_not_init() {
        let mut arch = Archiver::default();
        assert!(matches!(
            arch.serialise(Row { time_s: 0.0, value: 0.0 }),
            Err(ArchiveError::NotInit)
        ));
    }
}
