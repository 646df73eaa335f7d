//! Output file naming and writing
//!
//! Picks a file name that does not collide with anything already in the
//! output directory, then writes the finished document through a temporary
//! file so a failed run never leaves a partial PDF behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_OUTPUT_BASE_NAME, OUTPUT_EXTENSION};

/// Where the output document should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    /// File name without the `.pdf` extension
    pub base_name: String,
}

impl OutputTarget {
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_name: strip_extension(&base_name.into()),
        }
    }

    /// Split a file path such as `out/report.pdf` into directory and base name
    pub fn from_path(path: &Path) -> Self {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_OUTPUT_BASE_NAME.to_string());
        Self::new(directory, base_name)
    }

    /// First free path for this target
    pub fn resolve(&self) -> PathBuf {
        resolve_output_path(&self.directory, &self.base_name)
    }
}

fn strip_extension(name: &str) -> String {
    let suffix = format!(".{}", OUTPUT_EXTENSION);
    if name.len() > suffix.len() && name.to_ascii_lowercase().ends_with(&suffix) {
        name[..name.len() - suffix.len()].to_string()
    } else {
        name.to_string()
    }
}

/// `<base>.pdf` for attempt 0, `<base> (n).pdf` afterwards
pub fn candidate_path(directory: &Path, base_name: &str, attempt: usize) -> PathBuf {
    if attempt == 0 {
        directory.join(format!("{}.{}", base_name, OUTPUT_EXTENSION))
    } else {
        directory.join(format!("{} ({}).{}", base_name, attempt, OUTPUT_EXTENSION))
    }
}

/// Return the first candidate path that does not exist yet.
///
/// Only reflects the filesystem at call time; a concurrent writer can still
/// take the name before it is used.
pub fn resolve_output_path(directory: &Path, base_name: &str) -> PathBuf {
    let base_name = strip_extension(base_name);
    let mut attempt = 0;
    loop {
        let path = candidate_path(directory, &base_name, attempt);
        if !path.exists() {
            return path;
        }
        attempt += 1;
    }
}

/// Write `bytes` to `path` via a temporary file in the same directory.
///
/// The directory is created if needed. The final move refuses to overwrite an
/// existing file; on any failure the temporary is removed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".svg-grid-")
        .suffix(".pdf.tmp")
        .tempfile_in(directory)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;

    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
