//! Traits for the external collaborators of the engine.
//!
//! The engine itself performs no I/O; the orchestration layer supplies the
//! normalized record pool through [`RecordFeed`] and persists the immutable
//! run artifacts through [`RunResultStore`]. Any backend (PostgreSQL, SQLite,
//! in-memory, etc.) can plug in by implementing these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::run_result::RunResult;
use crate::types::{ReconResult, TransactionRecord};

/// Source of normalized transaction records for one cycle
#[async_trait]
pub trait RecordFeed: Send + Sync {
    /// Fetch the full record pool for a cycle. A feed may legitimately have
    /// zero records for a cycle.
    async fn fetch_pool(&self, cycle_id: &str) -> ReconResult<Vec<TransactionRecord>>;
}

/// Persistence for run results.
///
/// Results are append-only: a rerun stores a new result under a new run id
/// rather than replacing a prior one.
#[async_trait]
pub trait RunResultStore: Send + Sync {
    /// Persist a completed run result
    async fn save_run(&mut self, result: &RunResult) -> ReconResult<()>;

    /// Fetch a run result by run id
    async fn get_run(&self, run_id: Uuid) -> ReconResult<Option<RunResult>>;

    /// List all run results recorded for a cycle
    async fn list_runs_for_cycle(&self, cycle_id: &str) -> ReconResult<Vec<RunResult>>;

    /// Records deferred as HANGING in the given run, to be re-queued into
    /// the next cycle's pool
    async fn hanging_carry_over(&self, run_id: Uuid) -> ReconResult<Vec<TransactionRecord>>;
}
