//! Age/size eviction (§4.M "GC").
//!
//! Enumerates `<outRoot>/runs/*`, reading each `run.json` to decide
//! eligibility. A run unparseable `run.json` is skipped rather than
//! condemned — GC never guesses about a run it cannot identify.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};

use zcl_schema::run::RunRecord;

/// One run GC considered, with the reason (if any) it was condemned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcCandidate {
    pub run_id: String,
    pub dir: Utf8PathBuf,
    pub size_bytes: u64,
    pub reason: CondemnReason,
}

/// Why a run was placed in the deletion set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondemnReason {
    /// `createdAt` older than `maxAgeDays` and unpinned.
    Age,
    /// Oldest-first eviction needed to satisfy `maxTotalBytes`.
    Size,
}

/// Inputs to one GC pass.
#[derive(Debug, Clone)]
pub struct GcPolicy {
    pub max_age_days: Option<u32>,
    pub max_total_bytes: Option<u64>,
    pub dry_run: bool,
}

/// Result of one GC pass.
#[derive(Debug, Clone, Default)]
pub struct GcReport {
    /// Runs that were (or, under dry-run, would have been) deleted.
    pub deleted: Vec<GcCandidate>,
    /// Total on-disk bytes across surviving runs, projected whether or
    /// not this was a dry run.
    pub total_after: u64,
}

/// Errors from a GC pass.
#[derive(Debug, thiserror::Error)]
pub enum GcError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run one GC pass over `<out_root>/runs`.
pub fn collect(now: DateTime<Utc>, out_root: &Utf8Path, policy: &GcPolicy) -> Result<GcReport, GcError> {
    let runs_dir = out_root.join("runs");
    let mut surviving: Vec<(String, Utf8PathBuf, RunRecord, u64)> = Vec::new();
    let mut total: u64 = 0;
    let mut deleted = Vec::new();

    for run_id in zcl_store::list_child_dir_names(&runs_dir)? {
        let dir = runs_dir.join(&run_id);
        let Some(record) = read_run_record(&dir) else {
            tracing::warn!(run_id, "skipping run with unparseable run.json");
            continue;
        };
        let size = dir_size_bytes(&dir)?;

        if !record.pinned {
            if let Some(max_age_days) = policy.max_age_days {
                let age = now.signed_duration_since(record.created_at);
                if age.num_days() >= i64::from(max_age_days) {
                    deleted.push(GcCandidate {
                        run_id: run_id.clone(),
                        dir: dir.clone(),
                        size_bytes: size,
                        reason: CondemnReason::Age,
                    });
                    continue;
                }
            }
        }

        total += size;
        surviving.push((run_id, dir, record, size));
    }

    if let Some(max_total_bytes) = policy.max_total_bytes {
        surviving.sort_by(|a, b| a.2.created_at.cmp(&b.2.created_at));
        let mut idx = 0;
        while total > max_total_bytes && idx < surviving.len() {
            let (run_id, dir, record, size) = &surviving[idx];
            if record.pinned {
                idx += 1;
                continue;
            }
            deleted.push(GcCandidate {
                run_id: run_id.clone(),
                dir: dir.clone(),
                size_bytes: *size,
                reason: CondemnReason::Size,
            });
            total -= size;
            surviving.remove(idx);
        }
    }

    if !policy.dry_run {
        for candidate in &deleted {
            match std::fs::remove_dir_all(candidate.dir.as_std_path()) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(GcReport {
        deleted,
        total_after: total,
    })
}

fn read_run_record(run_dir: &Utf8Path) -> Option<RunRecord> {
    let text = std::fs::read_to_string(run_dir.join("run.json").as_std_path()).ok()?;
    serde_json::from_str(&text).ok()
}

fn dir_size_bytes(path: &Utf8Path) -> std::io::Result<u64> {
    let mut total = 0u64;
    let entries = match std::fs::read_dir(path.as_std_path()) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let child = Utf8PathBuf::from_path_buf(entry.path())
                .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().into_owned()));
            total += dir_size_bytes(&child)?;
        } else {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
