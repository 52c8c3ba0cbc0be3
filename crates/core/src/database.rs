use crate::photo::PhotoGroup;
use crate::scanner::ScanStats;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DATABASE_VERSION: u32 = 1;

/// Persisted snapshot of a library scan.
///
/// The snapshot records absolute paths, so it stays usable from any working
/// directory but goes stale when files move. Consumers revalidate groups
/// against the filesystem before acting on them.
#[derive(Debug, Serialize, Deserialize)]
pub struct GroupDatabase {
    pub version: u32,
    #[serde(default)]
    pub stats: ScanStats,
    pub groups: Vec<PhotoGroup>,
}

impl GroupDatabase {
    pub fn new(groups: Vec<PhotoGroup>, stats: ScanStats) -> Self {
        Self {
            version: DATABASE_VERSION,
            stats,
            groups,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read group database: {}", path.display()))?;
        let db: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse group database: {}", path.display()))?;
        if db.version != DATABASE_VERSION {
            bail!(
                "unsupported database version {} in {} (expected {})",
                db.version,
                path.display(),
                DATABASE_VERSION
            );
        }
        Ok(db)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create database directory: {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self).context("failed to serialize database")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write group database: {}", path.display()))?;
        Ok(())
    }
}
