//! Sync orchestrator: pulls a batch from an item source and reconciles each
//! item into the material catalogue
//!
//! Phases run `Idle -> Fetching -> Processing -> Completed`. A failed fetch
//! ends the run in `Failed` before anything is written. Per-item failures
//! are counted in the report and never fail the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{ExternalItem, FoldedLocation, ReconcileAction, Reconciler, StockStatus};
use uuid::Uuid;

use super::events::{emit, InventoryEvent, InventoryEvents};
use crate::error::{AppError, AppResult};
use crate::external::ItemSource;
use crate::store::MaterialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    Fetching,
    Processing,
    Completed,
    Failed,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Processing => "processing",
            SyncPhase::Completed => "completed",
            SyncPhase::Failed => "failed",
        }
    }

    pub fn can_advance_to(&self, next: SyncPhase) -> bool {
        use SyncPhase::*;
        matches!(
            (self, next),
            (Idle, Fetching) | (Fetching, Processing) | (Fetching, Failed) | (Processing, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Added,
    Updated,
    /// No correlation key
    Skipped,
    Error,
}

/// Per-item line of a sync report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub sku: Option<String>,
    pub name: String,
    pub outcome: ItemOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StockStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Stock folded into the fallback location, attributed to an item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldedStock {
    pub code: String,
    #[serde(flatten)]
    pub location: FoldedLocation,
}

/// Tally of one reconciliation pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub total_from_external: u64,
    pub with_key: u64,
    pub without_key: u64,
    pub added: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    pub details: Vec<ItemDetail>,
    pub folded: Vec<FoldedStock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChange {
    pub phase: SyncPhase,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub step: String,
    pub message: String,
}

/// One sync run, from start to its final phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRun {
    pub id: Uuid,
    pub source: String,
    pub dry_run: bool,
    pub phase: SyncPhase,
    pub phases: Vec<PhaseChange>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub report: Option<SyncReport>,
    pub failure: Option<SyncFailure>,
}

impl SyncRun {
    fn start(source: &str, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: source.to_string(),
            dry_run,
            phase: SyncPhase::Idle,
            phases: vec![PhaseChange {
                phase: SyncPhase::Idle,
                at: now,
            }],
            started_at: now,
            finished_at: None,
            report: None,
            failure: None,
        }
    }

    fn advance(&mut self, next: SyncPhase) -> AppResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(AppError::Internal(format!(
                "sync run cannot move from {} to {}",
                self.phase.as_str(),
                next.as_str()
            )));
        }
        let now = Utc::now();
        self.phase = next;
        self.phases.push(PhaseChange { phase: next, at: now });
        if matches!(next, SyncPhase::Completed | SyncPhase::Failed) {
            self.finished_at = Some(now);
        }
        tracing::info!(run = %self.id, phase = next.as_str(), "Sync phase changed");
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SyncPhase::Completed
    }
}

/// Outcome of one keyed item
struct Applied {
    action: ReconcileAction,
    status: StockStatus,
    folded: Vec<FoldedLocation>,
}

#[derive(Clone)]
pub struct SyncService {
    store: Arc<dyn MaterialStore>,
    reconciler: Arc<Reconciler>,
    events: Arc<dyn InventoryEvents>,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn MaterialStore>,
        reconciler: Arc<Reconciler>,
        events: Arc<dyn InventoryEvents>,
    ) -> Self {
        Self {
            store,
            reconciler,
            events,
        }
    }

    /// Run a full pass against `source`. The returned run is `Completed` or
    /// `Failed`; a fetch failure is reported in `failure`, never as `Err`.
    pub async fn run(&self, source: &dyn ItemSource, dry_run: bool) -> AppResult<SyncRun> {
        let mut run = SyncRun::start(source.name(), dry_run);
        tracing::info!(run = %run.id, source = source.name(), dry_run, "Sync run started");

        run.advance(SyncPhase::Fetching)?;
        let items = match source.fetch_items().await {
            Ok(items) => items,
            Err(e) => {
                let step = match &e {
                    AppError::ExternalSource { step, .. } => step.clone(),
                    _ => "fetch_items".to_string(),
                };
                tracing::error!(run = %run.id, step = %step, error = %e, "Sync fetch failed");
                run.failure = Some(SyncFailure {
                    step,
                    message: e.to_string(),
                });
                run.advance(SyncPhase::Failed)?;
                return Ok(run);
            }
        };

        run.advance(SyncPhase::Processing)?;
        let report = self.reconcile_batch(&items, dry_run).await;
        run.advance(SyncPhase::Completed)?;

        tracing::info!(
            run = %run.id,
            total = report.total_from_external,
            added = report.added,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            "Sync run completed"
        );

        if !dry_run {
            emit(
                self.events.as_ref(),
                InventoryEvent::SyncCompleted {
                    location: self.reconciler.locations().fallback().clone(),
                    added: report.added,
                    updated: report.updated,
                    errors: report.errors,
                },
            )
            .await;
        }

        run.report = Some(report);
        Ok(run)
    }

    /// Reconcile every item of a batch. Items are processed in order, each
    /// to completion; a failing item is counted and the pass continues.
    /// In a dry run existing materials are read but nothing is written.
    pub async fn reconcile_batch(&self, items: &[ExternalItem], dry_run: bool) -> SyncReport {
        let mut report = SyncReport {
            total_from_external: items.len() as u64,
            ..Default::default()
        };

        for item in items {
            let Some(code) = item.correlation_key() else {
                report.without_key += 1;
                report.skipped += 1;
                tracing::debug!(name = %item.name, "External item without SKU skipped");
                report.details.push(ItemDetail {
                    sku: None,
                    name: item.name.clone(),
                    outcome: ItemOutcome::Skipped,
                    status: None,
                    message: Some("no correlation key".to_string()),
                });
                continue;
            };
            report.with_key += 1;

            match self.apply(&code, item, dry_run).await {
                Ok(applied) => {
                    let outcome = match applied.action {
                        ReconcileAction::Created => {
                            report.added += 1;
                            ItemOutcome::Added
                        }
                        ReconcileAction::Updated => {
                            report.updated += 1;
                            ItemOutcome::Updated
                        }
                    };
                    for folded in applied.folded {
                        tracing::warn!(
                            code = %code,
                            external_location = %folded.external_name,
                            folded_into = %folded.folded_into,
                            quantity = %folded.quantity,
                            "Unrecognized location folded into fallback"
                        );
                        report.folded.push(FoldedStock {
                            code: code.clone(),
                            location: folded,
                        });
                    }
                    report.details.push(ItemDetail {
                        sku: Some(code),
                        name: item.name.clone(),
                        outcome,
                        status: Some(applied.status),
                        message: None,
                    });
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(code = %code, error = %e, "Reconciliation failed for item");
                    report.details.push(ItemDetail {
                        sku: Some(code),
                        name: item.name.clone(),
                        outcome: ItemOutcome::Error,
                        status: None,
                        message: Some(e.to_string()),
                    });
                }
            }
        }

        report
    }

    async fn apply(&self, code: &str, item: &ExternalItem, dry_run: bool) -> AppResult<Applied> {
        let existing = self.store.find_material(code).await?;
        let result = self.reconciler.reconcile(existing, item, Utc::now())?;

        if !dry_run {
            match result.action {
                ReconcileAction::Created => match self.store.insert_material(&result.material).await {
                    Ok(()) => {}
                    // Created concurrently since the lookup: merge into it instead
                    Err(AppError::DuplicateEntry(_)) => return self.merge_existing(code, item).await,
                    Err(e) => return Err(e),
                },
                ReconcileAction::Updated => self.store.update_material(&result.material).await?,
            }
        }

        Ok(Applied {
            action: result.action,
            status: result.material.status,
            folded: result.folded,
        })
    }

    async fn merge_existing(&self, code: &str, item: &ExternalItem) -> AppResult<Applied> {
        let existing = self
            .store
            .find_material(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {}", code)))?;
        let result = self.reconciler.reconcile(Some(existing), item, Utc::now())?;
        self.store.update_material(&result.material).await?;
        Ok(Applied {
            action: result.action,
            status: result.material.status,
            folded: result.folded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_machine() {
        use SyncPhase::*;
        assert!(Idle.can_advance_to(Fetching));
        assert!(Fetching.can_advance_to(Failed));
        assert!(!Processing.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Processing));
        assert!(!Completed.can_advance_to(Fetching));
    }

    #[test]
    fn run_records_phase_history() {
        let mut run = SyncRun::start("batch", true);
        run.advance(SyncPhase::Fetching).unwrap();
        run.advance(SyncPhase::Processing).unwrap();
        assert!(run.advance(SyncPhase::Failed).is_err());
        run.advance(SyncPhase::Completed).unwrap();

        let phases: Vec<_> = run.phases.iter().map(|p| p.phase).collect();
        assert_eq!(
            phases,
            vec![SyncPhase::Idle, SyncPhase::Fetching, SyncPhase::Processing, SyncPhase::Completed]
        );
        assert!(run.finished_at.is_some());
    }
}
