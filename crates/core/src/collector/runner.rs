//! Discovery run orchestration.
//!
//! One run walks the keyword template list from the last checkpoint, pages
//! through the search API under the pacer, classifies every result and
//! merges the batch into the snapshot. Rate limiting halts the run with a
//! checkpoint; per-query failures land in the DiscoveryLog and the run
//! continues. Persistence failures abort with the prior snapshot intact.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::{
    merge_records, CatalogError, CatalogSnapshot, Checkpoint, DiscoveryLog, JsonCatalogStore,
    ProgramRecord, SqliteMirror,
};
use crate::classifier::Classifier;
use crate::config::CollectorConfig;
use crate::metrics;

use super::rate_limit::RequestPacer;
use super::{CollectError, RepoSource, SourceRepo};

/// Hard failures of a discovery run. Per-query collection errors are not
/// here: those are reported through the DiscoveryLog.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Drives one discovery pass end to end.
pub struct CollectorRunner {
    source: Arc<dyn RepoSource>,
    classifier: Arc<dyn Classifier>,
    snapshot_store: JsonCatalogStore,
    mirror: Option<Arc<SqliteMirror>>,
    pacer: RequestPacer,
    config: CollectorConfig,
}

impl CollectorRunner {
    pub fn new(
        source: Arc<dyn RepoSource>,
        classifier: Arc<dyn Classifier>,
        snapshot_store: JsonCatalogStore,
        mirror: Option<Arc<SqliteMirror>>,
        config: CollectorConfig,
    ) -> Self {
        let pacer = RequestPacer::new(config.requests_per_minute);
        Self {
            source,
            classifier,
            snapshot_store,
            mirror,
            pacer,
            config,
        }
    }

    /// Execute one run. Returns the DiscoveryLog also written to disk.
    pub async fn run(&self) -> Result<DiscoveryLog, RunError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, source = self.source.name(), "Discovery run starting");

        let existing = self.load_existing()?;
        let checkpoint = self.load_checkpoint();
        if checkpoint != Checkpoint::default() {
            info!(
                keyword_index = checkpoint.keyword_index,
                page = checkpoint.page,
                "Resuming from checkpoint"
            );
        }

        let mut collected: Vec<ProgramRecord> = Vec::new();
        let mut queries: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        let mut rate_limited = false;
        let mut halted_at: Option<Checkpoint> = None;

        'keywords: for (keyword_index, keyword) in self
            .config
            .keywords
            .iter()
            .enumerate()
            .skip(checkpoint.keyword_index)
        {
            let query = self.build_query(keyword);
            queries.push(query.clone());

            let start_page = if keyword_index == checkpoint.keyword_index {
                checkpoint.page.max(1)
            } else {
                1
            };

            for page in start_page..=self.config.max_pages_per_query {
                self.pacer.acquire().await;

                let result = self.source.search_page(&query, page).await;
                match result {
                    Ok(source_page) => {
                        let now = Utc::now();
                        collected.extend(
                            source_page
                                .repos
                                .into_iter()
                                .map(|raw| self.to_record(raw, now)),
                        );
                        if !source_page.has_next {
                            break;
                        }
                    }
                    Err(CollectError::RateLimited) => {
                        warn!(query = %query, page = page, "Quota exhausted, halting run");
                        rate_limited = true;
                        halted_at = Some(Checkpoint {
                            keyword_index,
                            page,
                        });
                        break 'keywords;
                    }
                    Err(e) => {
                        warn!(query = %query, page = page, error = %e, "Query failed");
                        errors.push(format!("{} (page {}): {}", query, page, e));
                        break;
                    }
                }
            }
        }

        // Merge and persist. Nothing was written so far, so any failure here
        // leaves the prior snapshot untouched.
        let outcome = merge_records(existing.repos, collected);
        let snapshot = CatalogSnapshot::new(outcome.records, self.config.keywords.clone());
        self.snapshot_store.save(&snapshot)?;

        if let Some(mirror) = &self.mirror {
            // The mirror is a disposable projection: a rebuild failure is
            // reported, not fatal.
            if let Err(e) = mirror.rebuild(&snapshot) {
                warn!(error = %e, "Mirror rebuild failed");
                errors.push(format!("mirror rebuild: {}", e));
            }
        }

        match halted_at {
            Some(cp) => self.save_checkpoint(cp),
            None => self.clear_checkpoint(),
        }

        let log = DiscoveryLog {
            run_id,
            started_at,
            finished_at: Utc::now(),
            queries,
            new_records: outcome.added,
            updated_records: outcome.updated,
            skipped_records: outcome.skipped,
            errors,
            rate_limited,
        };
        self.write_log(&log);

        let result_label = if rate_limited {
            "rate_limited"
        } else if log.errors.is_empty() {
            "completed"
        } else {
            "completed_with_errors"
        };
        metrics::COLLECTOR_RUNS.with_label_values(&[result_label]).inc();
        metrics::COLLECTOR_RECORDS
            .with_label_values(&["added"])
            .inc_by(log.new_records as u64);
        metrics::COLLECTOR_RECORDS
            .with_label_values(&["updated"])
            .inc_by(log.updated_records as u64);
        metrics::COLLECTOR_RECORDS
            .with_label_values(&["skipped"])
            .inc_by(log.skipped_records as u64);

        info!(
            run_id = %log.run_id,
            added = log.new_records,
            updated = log.updated_records,
            skipped = log.skipped_records,
            errors = log.errors.len(),
            rate_limited = log.rate_limited,
            "Discovery run finished"
        );
        Ok(log)
    }

    fn build_query(&self, keyword: &str) -> String {
        if self.config.min_stars > 0 {
            format!("{} stars:>={}", keyword, self.config.min_stars)
        } else {
            keyword.to_string()
        }
    }

    fn to_record(&self, raw: SourceRepo, now: chrono::DateTime<Utc>) -> ProgramRecord {
        let classification =
            self.classifier
                .classify(&raw.name, raw.description.as_deref(), &raw.topics);
        ProgramRecord {
            full_name: raw.full_name,
            owner: raw.owner,
            name: raw.name,
            url: raw.url,
            description: raw.description,
            stars: raw.stars,
            language: raw.language,
            topics: raw.topics,
            updated_at: raw.updated_at.unwrap_or(now),
            default_branch: raw.default_branch.unwrap_or_else(|| "main".to_string()),
            category: classification.category,
            sub_category: Some(classification.sub_category),
            flagged: false,
            first_seen_at: now,
            last_merged_at: now,
        }
    }

    fn load_existing(&self) -> Result<CatalogSnapshot, CatalogError> {
        if self.snapshot_store.path().exists() {
            self.snapshot_store.load()
        } else {
            Ok(CatalogSnapshot::empty())
        }
    }

    fn load_checkpoint(&self) -> Checkpoint {
        read_json(&self.config.checkpoint_path).unwrap_or_default()
    }

    fn save_checkpoint(&self, checkpoint: Checkpoint) {
        if let Err(e) = write_json(&self.config.checkpoint_path, &checkpoint) {
            warn!(error = %e, "Failed to persist checkpoint");
        }
    }

    fn clear_checkpoint(&self) {
        if self.config.checkpoint_path.exists() {
            let _ = fs::remove_file(&self.config.checkpoint_path);
        }
    }

    fn write_log(&self, log: &DiscoveryLog) {
        if let Err(e) = write_json(&self.config.log_path, log) {
            warn!(error = %e, "Failed to persist discovery log");
        }
    }
}

/// Read the most recent discovery log, if a run has happened.
pub fn read_discovery_log(path: &Path) -> Option<DiscoveryLog> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let data = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, data)
}
