//! Filesystem utilities

use std::fs;
use std::path::Path;

use log::info;

/// Create the parent directory of an output file if it doesn't exist
pub fn ensure_parent_dir(file_path: &str) -> std::io::Result<()> {
    let Some(parent) = Path::new(file_path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    fs::create_dir_all(parent)?;
    info!("Created directory: {}", parent.display());
    Ok(())
}
