// Guarded access to report files in the results directory

use crate::error::{CoreError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["json", "csv", "md"];

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext))
}

/// Resolves `requested` to a regular file inside `results_dir`.
pub fn resolve_result_file(results_dir: &Path, requested: &str) -> Result<PathBuf> {
    let relative = Path::new(requested);

    if !has_allowed_extension(relative) {
        return Err(CoreError::Forbidden(requested.to_string()));
    }

    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(CoreError::PathTraversal(requested.to_string()));
    }

    let root = fs::canonicalize(results_dir)
        .map_err(|_| CoreError::NotFound(requested.to_string()))?;
    let candidate = root.join(relative);
    if !candidate.exists() {
        return Err(CoreError::NotFound(requested.to_string()));
    }

    // Symlinks may still point outside the results directory
    let resolved = fs::canonicalize(&candidate)?;
    if !resolved.starts_with(&root) {
        return Err(CoreError::PathTraversal(requested.to_string()));
    }
    if !resolved.is_file() {
        return Err(CoreError::NotFound(requested.to_string()));
    }

    Ok(resolved)
}

/// Sorted names of the report files in `results_dir`.
pub fn list_result_files(results_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(results_dir) else {
        return Vec::new();
    };

    let mut files: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file() && has_allowed_extension(&entry.path()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    files.sort();
    files
}
