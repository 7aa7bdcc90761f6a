//! Size-rotated log file.
//!
//! Lines are appended to `<path>`. When the next line would bring the file
//! to `max_bytes` or beyond, the file is shifted into a numbered backup
//! before writing:
//!
//! ```text
//! activity.log      -> activity.log.1
//! activity.log.1    -> activity.log.2
//! activity.log.2    -> activity.log.3
//! activity.log.3    (deleted, when backups = 3)
//! ```
//!
//! Rotation is disabled when either `max_bytes` or `backups` is zero.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// An append-only log file with numbered backups.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    /// Opened on the first write.
    current: Mutex<Option<OpenFile>>,
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    len: u64,
}

impl RotatingFile {
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> Self {
        RotatingFile {
            path: path.into(),
            max_bytes,
            backups,
            current: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of backup number `index` (1 is the newest).
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Appends `line` to the file, rotating first if needed.
    pub fn append(&self, line: &[u8]) -> io::Result<()> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if current.is_none() {
            *current = Some(self.open()?);
        }

        let len = current.as_ref().map_or(0, |open| open.len);
        if self.should_rotate(len, line.len()) {
            *current = None;
            self.rotate()?;
            *current = Some(self.open()?);
        }

        if let Some(open) = current.as_mut() {
            open.file.write_all(line)?;
            open.len += line.len() as u64;
        }
        Ok(())
    }

    fn should_rotate(&self, len: u64, incoming: usize) -> bool {
        self.max_bytes > 0 && self.backups > 0 && len > 0 && len + incoming as u64 >= self.max_bytes
    }

    fn open(&self) -> io::Result<OpenFile> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let len = file.metadata()?.len();
        Ok(OpenFile { file, len })
    }

    /// Shifts every backup up by one and moves the live file to `.1`.
    fn rotate(&self) -> io::Result<()> {
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                replace(&from, &self.backup_path(index + 1))?;
            }
        }
        if self.path.exists() {
            replace(&self.path, &self.backup_path(1))?;
        }
        Ok(())
    }
}

/// Renames `from` to `to`, deleting `to` first if it exists.
fn replace(from: &Path, to: &Path) -> io::Result<()> {
    match fs::remove_file(to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::rename(from, to)
}
