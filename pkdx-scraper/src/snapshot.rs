//! Snapshot writer
//!
//! Serializes the id → entity map as one JSON object keyed by stringified id,
//! indented with four spaces. The file is written to `<name>.tmp` next to the
//! destination and renamed over it.

use crate::models::Entity;
use pkdx_common::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Render the snapshot document
pub fn render_snapshot(entities: &BTreeMap<u32, Entity>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entities.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write the snapshot to `path`, replacing any existing file
pub fn write_snapshot(entities: &BTreeMap<u32, Entity>, path: &Path) -> Result<()> {
    let body = render_snapshot(entities)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    replace_file(path, |file| file.write_all(&body))?;

    tracing::info!(
        path = %path.display(),
        entities = entities.len(),
        bytes = body.len(),
        "Snapshot written"
    );

    Ok(())
}

/// Fill `<name>.tmp` with `fill`, then rename it over `path`
///
/// On any failure the temporary file is removed and `path` is left untouched.
fn replace_file<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let temp_path = temp_path_for(path)?;

    let written = File::create(&temp_path).and_then(|mut file| {
        fill(&mut file)?;
        file.sync_all()
    });

    if let Err(e) = written.and_then(|()| std::fs::rename(&temp_path, path)) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Snapshot path has no file name: {}", path.display())))?;

    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}
