use crate::error::{ProtscopeError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

fn is_gzip_path(path: &Path) -> bool {
    path.to_string_lossy().to_ascii_lowercase().ends_with(".gz")
}

/// Opens a text input, decompressing `.gz` files on the fly.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if !path.exists() {
        return Err(ProtscopeError::NotFound(format!(
            "Input file '{}' does not exist",
            path.display()
        )));
    }
    let file = File::open(path).map_err(ProtscopeError::io("open input", path))?;
    if is_gzip_path(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Creates the parent directory of an output file if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(ProtscopeError::io("create output directory", parent))
        }
        _ => Ok(()),
    }
}
