//! Source discovery
//!
//! Lists the top level of the input directory and keeps the M4A files.
//! Order is whatever the platform's directory listing returns.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::audio::is_m4a_name;
use crate::error::ConvertError;

/// Resolve a directory argument; the literal `"."` means the current working directory
pub fn resolve_directory(arg: &Path) -> io::Result<PathBuf> {
    if arg.as_os_str() == "." {
        std::env::current_dir()
    } else {
        Ok(arg.to_path_buf())
    }
}

/// Return the names of M4A files directly inside `dir`, in listing order
pub fn scan_sources(dir: &Path) -> Result<Vec<String>, ConvertError> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ConvertError::InputAccess {
            path: dir.to_path_buf(),
            source: io::Error::from(e),
        })?;

        let Some(name) = entry.file_name().to_str() else {
            log::debug!("Skipping non-UTF-8 name: {:?}", entry.file_name());
            continue;
        };

        if !is_m4a_name(name) {
            continue;
        }

        // Follows symlinks, so a linked M4A still counts
        if !entry.path().is_file() {
            log::debug!("Skipping non-file entry: {}", entry.path().display());
            continue;
        }

        names.push(name.to_string());
    }

    log::debug!("Found {} M4A file(s) in {}", names.len(), dir.display());
    Ok(names)
}
