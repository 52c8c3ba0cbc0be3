use crate::database::GroupDatabase;
use crate::sanitize::sanitize_component;
use crate::scheme::{NamingScheme, OnMissing, SchemeError};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SEQUENCE_DIGITS: u8 = 3;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("sequence digits must be between 1 and 6, got {0}")]
    SequenceDigits(u8),
    #[error(transparent)]
    Scheme(#[from] SchemeError),
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub scheme: NamingScheme,
    pub sequence_digits: u8,
    pub include_invalid: bool,
}

impl PlanOptions {
    pub fn new(scheme: NamingScheme) -> Self {
        Self {
            scheme,
            sequence_digits: DEFAULT_SEQUENCE_DIGITS,
            include_invalid: false,
        }
    }
}

/// One file move within a group plan. `target` is relative to the
/// destination root chosen at execution time.
#[derive(Debug, Clone, Serialize)]
pub struct FileRename {
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupPlan {
    pub key: String,
    /// Final rendered name, sequence applied and segments sanitized, without
    /// extension. Matches the target paths exactly.
    pub rendered: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    pub renames: Vec<FileRename>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedGroup {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct RenamePlan {
    pub scheme: String,
    pub groups: Vec<GroupPlan>,
    pub skipped: Vec<SkippedGroup>,
}

impl RenamePlan {
    pub fn planned_files(&self) -> usize {
        self.groups.iter().map(|g| g.renames.len()).sum()
    }
}

/// Turn a group database into a concrete rename plan.
///
/// Groups are revalidated against the filesystem first; anything without an
/// image on disk is skipped, never failed. Groups whose pre-sequence rendering
/// collides share a sequence bucket and get 1..N in discovery order; a
/// singleton bucket still gets sequence 1 when the scheme asks for one. A
/// collision without `{sequence}` in the scheme is unresolvable and fails the
/// whole plan before anything touches the disk.
pub fn build_plan(
    database: &mut GroupDatabase,
    options: &PlanOptions,
) -> Result<RenamePlan, PlanError> {
    if !(1..=6).contains(&options.sequence_digits) {
        return Err(PlanError::SequenceDigits(options.sequence_digits));
    }
    let on_missing = if options.include_invalid {
        OnMissing::Sentinel
    } else {
        OnMissing::Skip
    };

    let mut plan = RenamePlan {
        scheme: options.scheme.source().to_string(),
        groups: Vec::new(),
        skipped: Vec::new(),
    };

    // Pre-sequence pass: render with an empty sequence and bucket collisions.
    let mut buckets: Vec<(String, Vec<usize>)> = Vec::new();
    let mut bucket_index = HashMap::<String, usize>::new();
    for (i, group) in database.groups.iter_mut().enumerate() {
        group.revalidate();
        if !group.valid {
            debug!(key = %group.key, "group skipped: no image on disk");
            plan.skipped.push(SkippedGroup {
                key: group.key.clone(),
                reason: "no image file present on disk".to_string(),
            });
            continue;
        }
        match options.scheme.render(group, "", on_missing) {
            Ok(rendered) => match bucket_index.get(&rendered) {
                Some(&b) => buckets[b].1.push(i),
                None => {
                    bucket_index.insert(rendered.clone(), buckets.len());
                    buckets.push((rendered, vec![i]));
                }
            },
            Err(field) => {
                debug!(key = %group.key, field = field.name(), "group skipped: missing metadata");
                plan.skipped.push(SkippedGroup {
                    key: group.key.clone(),
                    reason: format!("missing {field}"),
                });
            }
        }
    }

    let has_sequence = options.scheme.has_sequence();
    for (rendered, members) in &buckets {
        if members.len() > 1 && !has_sequence {
            return Err(SchemeError::AmbiguousCollision {
                rendered: rendered.clone(),
                count: members.len(),
            }
            .into());
        }
    }

    // Final pass: apply sequences and expand per-file targets.
    for (_, members) in buckets {
        for (position, group_index) in members.iter().enumerate() {
            let group = &database.groups[*group_index];
            let sequence = has_sequence.then_some(position as u32 + 1);
            let sequence_text = sequence
                .map(|n| format!("{n:0width$}", width = options.sequence_digits as usize))
                .unwrap_or_default();
            let rendered = match options.scheme.render(group, &sequence_text, on_missing) {
                Ok(rendered) => rendered,
                // The pre-sequence pass already rendered this group, so a
                // missing field cannot appear here.
                Err(_) => continue,
            };

            let mut segments: Vec<String> =
                rendered.split('/').map(sanitize_component).collect();
            let rendered = segments.join("/");
            let base = segments.pop().unwrap_or_else(|| "untitled".to_string());
            let dir: PathBuf = segments.iter().collect();

            let renames = group
                .files
                .iter()
                .map(|file| FileRename {
                    source: file.path.clone(),
                    target: dir.join(format!("{base}.{}", file.extension())),
                })
                .collect();

            plan.groups.push(GroupPlan {
                key: group.key.clone(),
                rendered,
                sequence,
                renames,
            });
        }
    }

    debug!(
        planned = plan.groups.len(),
        skipped = plan.skipped.len(),
        "rename plan built"
    );
    Ok(plan)
}
