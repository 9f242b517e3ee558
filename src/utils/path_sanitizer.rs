// SPDX-License-Identifier: GPL-3.0-only
use std::path::{Component, Path, PathBuf};
use anyhow::Result;

/// Resolve a destination path received over the bridge
///
/// Relative paths are joined onto `base`. With `confine` set, the normalized
/// result must stay inside `base`.
pub fn resolve_destination(raw: &str, base: &Path, confine: bool) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(anyhow::anyhow!("Destination path is empty"));
    }

    if raw.contains('\0') {
        return Err(anyhow::anyhow!("Destination path contains a NUL byte"));
    }

    let requested = Path::new(raw);
    let joined = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        base.join(requested)
    };

    if raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
        return Err(anyhow::anyhow!("Destination path {} names a directory", raw));
    }

    let resolved = normalize_path(&joined);
    if resolved.file_name().is_none() {
        return Err(anyhow::anyhow!("Destination path {} does not name a file", raw));
    }

    if confine {
        let base = normalize_path(base);
        if !resolved.starts_with(&base) {
            return Err(anyhow::anyhow!(
                "Destination {} is outside download directory {}",
                resolved.display(),
                base.display()
            ));
        }
    }

    Ok(resolved)
}

/// Sanitize a filename extracted from a URL or user input
///
/// Removes path separators and other unsafe characters, ensuring only
/// a valid filename component remains.
pub fn sanitize_filename(filename: &str) -> String {
    // Extract just the filename component (remove any path parts)
    let filename_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    // Remove unsafe characters
    let sanitized: String = filename_only
        .chars()
        .filter(|c| {
            // Allow alphanumeric, dash, underscore, dot, and spaces
            c.is_alphanumeric() || *c == '-' || *c == '_' || *c == '.' || *c == ' '
        })
        .collect();

    sanitized.trim().to_string()
}

/// Normalize a path lexically
///
/// Drops `.` and folds `..` without touching the filesystem. `..` never
/// climbs above the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                normalized.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => {
                normalized.push(part);
            }
        }
    }

    normalized
}
