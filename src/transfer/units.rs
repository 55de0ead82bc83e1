//! Transfer unit enumeration
//!
//! Expands a [`TransferRequest`] into concrete (local file, remote key)
//! pairs. Key contract: `key = prefix + path relative to the walked root`,
//! with `/` separators regardless of platform. For a single file the key is
//! its base name under the prefix; Directory mode defaults the prefix to
//! the root directory's own name.

use super::{TransferMode, TransferRequest, TransferUnit};
use std::path::Path;
use walkdir::WalkDir;

/// Unit enumeration errors
#[derive(thiserror::Error, Debug)]
pub enum UnitError {
    /// The request's local path (or a manifest entry's parent) is missing
    /// or not the kind of path the mode requires.
    #[error("invalid local path: {}", .0.display())]
    InvalidPath(std::path::PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Expand a request into transfer units according to its mode.
pub fn enumerate_units(request: &TransferRequest) -> Result<Vec<TransferUnit>, UnitError> {
    match request.mode {
        TransferMode::File => single_file(request),
        TransferMode::Directory => walk_directory(request),
        TransferMode::List => read_manifest(request),
    }
}

fn single_file(request: &TransferRequest) -> Result<Vec<TransferUnit>, UnitError> {
    let path = &request.local_path;
    if !path.is_file() {
        return Err(UnitError::InvalidPath(path.clone()));
    }
    Ok(vec![file_unit(path, request.prefix.as_deref())?])
}

fn walk_directory(request: &TransferRequest) -> Result<Vec<TransferUnit>, UnitError> {
    let root = &request.local_path;
    if !root.is_dir() {
        return Err(UnitError::InvalidPath(root.clone()));
    }

    // Default prefix is the directory's own name, so `put photos/ bucket`
    // lands objects under `photos/...`.
    let prefix = match request.prefix.as_deref() {
        Some(p) => p.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let mut units = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        // strip_prefix cannot fail for entries yielded under root
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        units.push(TransferUnit {
            local_path: entry.path().to_path_buf(),
            key: join_key(&prefix, &relative),
        });
    }
    Ok(units)
}

fn read_manifest(request: &TransferRequest) -> Result<Vec<TransferUnit>, UnitError> {
    let manifest = &request.local_path;
    if !manifest.is_file() {
        return Err(UnitError::InvalidPath(manifest.clone()));
    }

    let content = std::fs::read_to_string(manifest)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| file_unit(Path::new(line), request.prefix.as_deref()))
        .collect()
}

/// One File-mode unit: key = prefix + base name.
fn file_unit(path: &Path, prefix: Option<&str>) -> Result<TransferUnit, UnitError> {
    let name = path
        .file_name()
        .ok_or_else(|| UnitError::InvalidPath(path.to_path_buf()))?
        .to_string_lossy()
        .into_owned();
    let key = match prefix {
        Some(p) => join_key(p, &name),
        None => name,
    };
    Ok(TransferUnit {
        local_path: path.to_path_buf(),
        key,
    })
}

fn join_key(prefix: &str, rest: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        rest.to_string()
    } else {
        format!("{prefix}/{rest}")
    }
}
