//! Output path derivation and collision resolution.
//!
//! A conversion writes next to its source unless the caller names a
//! destination:
//!
//! - `photos/IMG_001.jpeg` → WebP → `photos/IMG_001.webp`
//!
//! When the destination exists and overwriting is off, a counter is inserted
//! before the extension, probing upward until a free name turns up:
//!
//! - `photo.png` → `photo (1).png` → `photo (2).png` → …
//!
//! Probing stops after [`MAX_COLLISION_ATTEMPTS`] candidates. The last
//! candidate is returned even if it also exists, so a caller that then
//! writes without overwrite protection may clobber it.

use crate::imaging::ConversionOptions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MAX_COLLISION_ATTEMPTS: u32 = 1000;

/// Where a conversion of `source` should land.
///
/// An explicit `options.output_path` is used verbatim; otherwise the source's
/// directory and stem are kept and the target format's extension appended.
pub fn derive_output_path(source: &Path, options: &ConversionOptions) -> PathBuf {
    if let Some(explicit) = &options.output_path {
        return explicit.clone();
    }
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    dir.join(format!("{stem}.{}", options.target_format.extension()))
}

/// Return `path` if it is free (or `overwrite` is set), otherwise the first
/// free `name (N).ext` sibling.
pub fn resolve_collision(path: &Path, overwrite: bool) -> PathBuf {
    resolve_collision_with(path, overwrite, |p| p.exists())
}

/// [`resolve_collision`] with an injectable existence check.
pub fn resolve_collision_with(
    path: &Path,
    overwrite: bool,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    if overwrite || !exists(path) {
        return path.to_path_buf();
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = path.to_path_buf();
    for counter in 1..=MAX_COLLISION_ATTEMPTS {
        candidate = dir.join(format!("{stem} ({counter}){ext}"));
        if !exists(&candidate) {
            return candidate;
        }
    }

    warn!(
        path = %path.display(),
        candidate = %candidate.display(),
        "no free name after {MAX_COLLISION_ATTEMPTS} attempts"
    );
    candidate
}

/// Group source indices by the path each would convert to.
///
/// Groups are ordered by first appearance and keep input order inside. Two
/// sources in one group must not be converted concurrently: both would
/// resolve the same free name before either writes.
pub fn group_by_destination(sources: &[PathBuf], options: &ConversionOptions) -> Vec<Vec<usize>> {
    let mut slots: HashMap<PathBuf, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, source) in sources.iter().enumerate() {
        let slot = *slots
            .entry(derive_output_path(source, options))
            .or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
        groups[slot].push(index);
    }
    groups
}
