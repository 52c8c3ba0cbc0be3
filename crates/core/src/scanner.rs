use crate::photo::{PhotoFile, PhotoGroup};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("directory not found: {0}")]
    Missing(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to read directory {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub scanned_files: usize,
    pub grouped_files: usize,
    pub skipped_unsupported: usize,
    pub skipped_hidden: usize,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Groups in discovery order.
    pub groups: Vec<PhotoGroup>,
    pub stats: ScanStats,
}

/// Walk `root` and bucket every supported file into a photo group.
///
/// Groups are keyed by basename scoped to the containing directory, so the
/// same camera-assigned name in two sibling folders never merges into one
/// group. Files with unsupported extensions are excluded silently and only
/// show up in the stats. Zero groups is a valid outcome.
pub fn scan_directory(root: &Path, recursive: bool) -> Result<ScanOutcome, ScanError> {
    if !root.exists() {
        return Err(ScanError::Missing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut outcome = ScanOutcome::default();
    // (relative dir, lowercased stem) -> index into outcome.groups
    let mut index = HashMap::<(PathBuf, String), usize>::new();

    if recursive {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                ScanError::Unreadable {
                    path,
                    source: err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("walk error")),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            consume_file(entry.path(), root, &mut outcome, &mut index);
        }
    } else {
        let mut paths = Vec::new();
        let entries = fs::read_dir(root).map_err(|source| ScanError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ScanError::Unreadable {
                path: root.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        for path in paths {
            consume_file(&path, root, &mut outcome, &mut index);
        }
    }

    debug!(
        groups = outcome.groups.len(),
        files = outcome.stats.grouped_files,
        unsupported = outcome.stats.skipped_unsupported,
        "directory scan finished"
    );
    Ok(outcome)
}

fn consume_file(
    path: &Path,
    root: &Path,
    outcome: &mut ScanOutcome,
    index: &mut HashMap<(PathBuf, String), usize>,
) {
    outcome.stats.scanned_files += 1;

    if is_hidden(path) {
        outcome.stats.skipped_hidden += 1;
        return;
    }

    let Some(file) = PhotoFile::from_path(path) else {
        outcome.stats.skipped_unsupported += 1;
        return;
    };

    let Some(stem) = path.file_stem().and_then(|v| v.to_str()) else {
        outcome.stats.skipped_unsupported += 1;
        return;
    };

    let rel_dir = path
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let bucket = (rel_dir, stem.to_ascii_lowercase());

    outcome.stats.grouped_files += 1;
    match index.get(&bucket) {
        Some(&i) => outcome.groups[i].push(file),
        None => {
            index.insert(bucket, outcome.groups.len());
            outcome.groups.push(PhotoGroup::new(stem.to_string(), file));
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{scan_directory, ScanError};
    use crate::formats::FileRole;
    use std::fs::{self, File};
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        File::create(path).expect("file must be creatable");
    }

    #[test]
    fn groups_share_basename_within_one_directory() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_0001.CR2"));
        touch(&temp.path().join("IMG_0001.JPG"));
        touch(&temp.path().join("IMG_0001.xmp"));
        touch(&temp.path().join("IMG_0002.jpg"));

        let outcome = scan_directory(temp.path(), false).expect("scan");
        assert_eq!(outcome.groups.len(), 2);

        let first = &outcome.groups[0];
        assert_eq!(first.key, "IMG_0001");
        assert_eq!(first.files.len(), 3);
        assert!(first.files.iter().any(|f| f.role == FileRole::Raw));
        assert!(first.files.iter().any(|f| f.role == FileRole::Sidecar));
    }

    #[test]
    fn same_basename_in_sibling_directories_stays_separate() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("day1/IMG_0001.jpg"));
        touch(&temp.path().join("day2/IMG_0001.jpg"));

        let outcome = scan_directory(temp.path(), true).expect("scan");
        assert_eq!(outcome.groups.len(), 2);
        assert!(outcome.groups.iter().all(|g| g.key == "IMG_0001"));
    }

    #[test]
    fn non_recursive_scan_ignores_subdirectories() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_0001.jpg"));
        touch(&temp.path().join("nested/IMG_0002.jpg"));

        let outcome = scan_directory(temp.path(), false).expect("scan");
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].key, "IMG_0001");
    }

    #[test]
    fn unsupported_and_hidden_files_are_counted_not_grouped() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_0001.jpg"));
        touch(&temp.path().join("notes.txt"));
        touch(&temp.path().join(".DS_Store"));

        let outcome = scan_directory(temp.path(), false).expect("scan");
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.stats.skipped_unsupported, 1);
        assert_eq!(outcome.stats.skipped_hidden, 1);
        assert_eq!(outcome.stats.scanned_files, 3);
    }

    #[test]
    fn empty_directory_yields_zero_groups() {
        let temp = tempdir().expect("tempdir");
        let outcome = scan_directory(temp.path(), true).expect("scan");
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn missing_root_is_a_scan_error() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope");
        let err = scan_directory(&missing, true).expect_err("must fail");
        assert!(matches!(err, ScanError::Missing(_)));
    }

    #[test]
    fn case_differing_stems_merge_into_one_group() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("dsc00001.jpg"));
        touch(&temp.path().join("DSC00001.RAF"));

        let outcome = scan_directory(temp.path(), false).expect("scan");
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].files.len(), 2);
    }
}
