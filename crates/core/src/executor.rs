use crate::planner::{GroupPlan, RenamePlan};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    pub destination: PathBuf,
    pub mode: TransferMode,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedGroup {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ExecutionReport {
    pub dry_run: bool,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedGroup>,
    pub transferred_files: usize,
}

impl ExecutionReport {
    /// A run is only a failure when nothing at all went through.
    pub fn is_total_failure(&self) -> bool {
        !self.failed.is_empty() && self.succeeded.is_empty()
    }
}

/// Carry out a rename plan under the destination root.
///
/// Groups are independent: a failure in one is recorded and the run moves on.
/// Within a group, files already transferred before a failure stay where they
/// landed; nothing is rolled back. Existing destination files are never
/// overwritten. A dry run touches nothing and reports every group as it
/// would have gone through.
pub fn execute_plan(plan: &RenamePlan, options: &ExecuteOptions) -> Result<ExecutionReport> {
    let mut report = ExecutionReport {
        dry_run: options.dry_run,
        succeeded: Vec::new(),
        failed: Vec::new(),
        transferred_files: 0,
    };

    if !options.dry_run {
        fs::create_dir_all(&options.destination).with_context(|| {
            format!(
                "failed to create destination directory: {}",
                options.destination.display()
            )
        })?;
    }

    for group in &plan.groups {
        match execute_group(group, options) {
            Ok(transferred) => {
                report.transferred_files += transferred;
                report.succeeded.push(group.key.clone());
            }
            Err(err) => {
                warn!(key = %group.key, error = %err, "group transfer failed");
                report.failed.push(FailedGroup {
                    key: group.key.clone(),
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    debug!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        files = report.transferred_files,
        dry_run = report.dry_run,
        "plan execution finished"
    );
    Ok(report)
}

fn execute_group(group: &GroupPlan, options: &ExecuteOptions) -> Result<usize> {
    let mut transferred = 0;
    for rename in &group.renames {
        let target = options.destination.join(&rename.target);
        if target.exists() {
            bail!("destination already exists: {}", target.display());
        }
        if options.dry_run {
            transferred += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create directory: {}", parent.display())
            })?;
        }
        match options.mode {
            TransferMode::Move => move_file(&rename.source, &target)?,
            TransferMode::Copy => copy_verified(&rename.source, &target)?,
        }
        transferred += 1;
    }
    Ok(transferred)
}

/// Rename when source and target share a filesystem; otherwise copy, verify,
/// then delete the source.
fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    copy_verified(source, target)?;
    fs::remove_file(source)
        .with_context(|| format!("failed to remove source after copy: {}", source.display()))?;
    Ok(())
}

fn copy_verified(source: &Path, target: &Path) -> Result<()> {
    let written = fs::copy(source, target).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            target.display()
        )
    })?;
    let expected = fs::metadata(source)
        .with_context(|| format!("failed to stat source: {}", source.display()))?
        .len();
    if written != expected {
        bail!(
            "size mismatch after copying {} ({} of {} bytes)",
            source.display(),
            written,
            expected
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute_plan, ExecuteOptions, TransferMode};
    use crate::planner::{FileRename, GroupPlan, RenamePlan};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn plan_for(groups: Vec<GroupPlan>) -> RenamePlan {
        RenamePlan {
            scheme: "{basename}".to_string(),
            groups,
            skipped: Vec::new(),
        }
    }

    fn group(key: &str, renames: Vec<FileRename>) -> GroupPlan {
        GroupPlan {
            key: key.to_string(),
            rendered: key.to_string(),
            sequence: None,
            renames,
        }
    }

    fn seed(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent");
        }
        fs::write(path, content).expect("write");
    }

    fn options(destination: PathBuf, mode: TransferMode, dry_run: bool) -> ExecuteOptions {
        ExecuteOptions {
            destination,
            mode,
            dry_run,
        }
    }

    #[test]
    fn move_transfers_and_removes_sources() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src/IMG_0001.jpg");
        seed(&source, b"jpeg-bytes");
        let dest = temp.path().join("out");

        let plan = plan_for(vec![group(
            "IMG_0001",
            vec![FileRename {
                source: source.clone(),
                target: PathBuf::from("2024/shot_001.jpg"),
            }],
        )]);

        let report =
            execute_plan(&plan, &options(dest.clone(), TransferMode::Move, false)).expect("run");
        assert_eq!(report.succeeded, vec!["IMG_0001"]);
        assert_eq!(report.transferred_files, 1);
        assert!(!source.exists());
        assert_eq!(
            fs::read(dest.join("2024/shot_001.jpg")).expect("read"),
            b"jpeg-bytes"
        );
    }

    #[test]
    fn copy_keeps_the_source() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src/IMG_0001.jpg");
        seed(&source, b"jpeg-bytes");
        let dest = temp.path().join("out");

        let plan = plan_for(vec![group(
            "IMG_0001",
            vec![FileRename {
                source: source.clone(),
                target: PathBuf::from("shot.jpg"),
            }],
        )]);

        execute_plan(&plan, &options(dest.clone(), TransferMode::Copy, false)).expect("run");
        assert!(source.exists());
        assert!(dest.join("shot.jpg").exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let temp = tempdir().expect("tempdir");
        let source = temp.path().join("src/IMG_0001.jpg");
        seed(&source, b"jpeg-bytes");
        let dest = temp.path().join("out");

        let plan = plan_for(vec![group(
            "IMG_0001",
            vec![FileRename {
                source: source.clone(),
                target: PathBuf::from("shot.jpg"),
            }],
        )]);

        let report =
            execute_plan(&plan, &options(dest.clone(), TransferMode::Move, true)).expect("run");
        assert!(report.dry_run);
        assert_eq!(report.succeeded, vec!["IMG_0001"]);
        assert!(source.exists());
        assert!(!dest.exists());
    }

    #[test]
    fn existing_destination_fails_that_group_only() {
        let temp = tempdir().expect("tempdir");
        let blocked_src = temp.path().join("src/IMG_0001.jpg");
        let clean_src = temp.path().join("src/IMG_0002.jpg");
        seed(&blocked_src, b"one");
        seed(&clean_src, b"two");
        let dest = temp.path().join("out");
        seed(&dest.join("taken.jpg"), b"already here");

        let plan = plan_for(vec![
            group(
                "IMG_0001",
                vec![FileRename {
                    source: blocked_src.clone(),
                    target: PathBuf::from("taken.jpg"),
                }],
            ),
            group(
                "IMG_0002",
                vec![FileRename {
                    source: clean_src,
                    target: PathBuf::from("free.jpg"),
                }],
            ),
        ]);

        let report =
            execute_plan(&plan, &options(dest.clone(), TransferMode::Move, false)).expect("run");
        assert_eq!(report.succeeded, vec!["IMG_0002"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].key, "IMG_0001");
        assert!(!report.is_total_failure());
        // The blocked source is untouched and the occupant intact.
        assert!(blocked_src.exists());
        assert_eq!(fs::read(dest.join("taken.jpg")).expect("read"), b"already here");
    }

    #[test]
    fn missing_source_is_recorded_not_fatal() {
        let temp = tempdir().expect("tempdir");
        let dest = temp.path().join("out");
        let plan = plan_for(vec![group(
            "IMG_0001",
            vec![FileRename {
                source: temp.path().join("gone.jpg"),
                target: PathBuf::from("shot.jpg"),
            }],
        )]);

        let report =
            execute_plan(&plan, &options(dest, TransferMode::Move, false)).expect("run");
        assert!(report.is_total_failure());
        assert_eq!(report.failed[0].key, "IMG_0001");
    }
}
