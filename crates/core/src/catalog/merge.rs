//! Deduplicating merge of collected records into the catalog.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::debug;

use super::ProgramRecord;

/// Result of merging a collected batch into an existing record set.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub records: Vec<ProgramRecord>,
    /// Incoming records not previously present.
    pub added: u32,
    /// Incoming records that refreshed an existing entry.
    pub updated: u32,
    /// Incoming records rejected for a malformed identity.
    pub skipped: u32,
}

/// Merge `incoming` into `existing`, deduplicating by case-insensitive
/// "owner/name" identity.
///
/// Existing entries are updated in place: the collected fields (stars,
/// description, topics, language, timestamps, classification) are replaced
/// while `flagged` and `first_seen_at` are preserved. New identities are
/// appended in batch order. Batch-internal duplicates resolve
/// last-in-batch-wins. Idempotent: re-merging the same batch adds nothing.
pub fn merge_records(
    existing: Vec<ProgramRecord>,
    incoming: Vec<ProgramRecord>,
) -> MergeOutcome {
    let mut records = existing;
    let mut index: HashMap<String, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.identity(), i))
        .collect();

    let mut added = 0u32;
    let mut updated = 0u32;
    let mut skipped = 0u32;
    // Identities already processed in this batch; a later batch-internal
    // duplicate overwrites the earlier one (last wins) without recounting.
    let mut seen_this_batch: HashSet<String> = HashSet::new();

    let now = Utc::now();

    for mut record in incoming {
        if record.is_malformed() {
            debug!(full_name = %record.full_name, "Skipping malformed record");
            skipped += 1;
            continue;
        }

        let identity = record.identity();
        let first_in_batch = seen_this_batch.insert(identity.clone());
        record.last_merged_at = now;

        match index.get(&identity) {
            Some(&i) => {
                let current = &mut records[i];
                record.flagged = current.flagged;
                record.first_seen_at = current.first_seen_at;
                *current = record;
                if first_in_batch {
                    updated += 1;
                }
            }
            None => {
                record.first_seen_at = now;
                index.insert(identity, records.len());
                records.push(record);
                added += 1;
            }
        }
    }

    MergeOutcome {
        records,
        added,
        updated,
        skipped,
    }
}
