#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::{RagError, Result};

/// Read every regular file in a directory as UTF-8 text.
///
/// Fails with [`RagError::NotFound`] when the path does not exist or is not
/// a directory. Files that cannot be read or are not valid UTF-8 are skipped
/// with a warning. Subdirectories are not recursed into. Results follow
/// directory iteration order, which is not guaranteed to be sorted.
#[inline]
pub fn load_folder(path: &Path) -> Result<Vec<String>> {
    if !path.is_dir() {
        return Err(RagError::NotFound(path.to_path_buf()));
    }

    let mut contents = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry in {:?}: {}", path, e);
                continue;
            }
        };
        let entry_path = entry.path();
        if !entry_path.is_file() {
            continue;
        }

        match fs::read(&entry_path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => contents.push(text),
                Err(e) => {
                    warn!("Skipping non-UTF-8 file {:?}: {}", entry_path, e);
                }
            },
            Err(e) => {
                warn!("Skipping unreadable file {:?}: {}", entry_path, e);
            }
        }
    }

    debug!("Loaded {} files from {:?}", contents.len(), path);
    Ok(contents)
}
