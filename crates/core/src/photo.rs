use crate::formats::{self, FileRole};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single file on disk belonging to a photo group. Immutable once scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoFile {
    pub path: PathBuf,
    pub role: FileRole,
}

impl PhotoFile {
    /// Build a `PhotoFile` when the extension is in the supported registry.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        let kind = formats::classify(ext)?;
        Some(Self {
            path: path.to_path_buf(),
            role: kind.role(),
        })
    }

    /// Extension in its original spelling, without the dot.
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|v| v.to_str())
            .unwrap_or_default()
    }
}

/// Files sharing a basename within one directory, treated as one logical shot.
///
/// The member list is fixed at scan time; `metadata` and `valid` are the only
/// parts that get recomputed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoGroup {
    pub key: String,
    pub files: Vec<PhotoFile>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub valid: bool,
}

impl PhotoGroup {
    pub fn new(key: String, first: PhotoFile) -> Self {
        let mut group = Self {
            key,
            files: vec![first],
            metadata: Metadata::default(),
            valid: false,
        };
        group.valid = group.has_image();
        group
    }

    pub fn push(&mut self, file: PhotoFile) {
        self.files.push(file);
        self.valid = self.has_image();
    }

    /// Whether the group carries an actual image, not just companions.
    pub fn has_image(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.role, FileRole::Primary | FileRole::Raw))
    }

    /// Pick the member to read metadata from: raw > primary > sidecar.
    /// RAW files typically retain the richest embedded EXIF.
    pub fn metadata_source(&self) -> Option<&PhotoFile> {
        let by_role = |role: FileRole| self.files.iter().find(|f| f.role == role);
        by_role(FileRole::Raw)
            .or_else(|| by_role(FileRole::Primary))
            .or_else(|| by_role(FileRole::Sidecar))
    }

    /// Recompute the validity flag against the current filesystem state.
    /// Always called before the naming engine consumes a group.
    pub fn revalidate(&mut self) {
        self.valid = self.has_image() && self.files.iter().any(|f| f.path.exists());
    }
}
