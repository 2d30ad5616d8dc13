//! In-memory run-result store for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::run_result::RunResult;
use crate::traits::RunResultStore;
use crate::types::{ReconError, ReconResult, TransactionRecord};

/// In-memory [`RunResultStore`] implementation
#[derive(Debug, Clone)]
pub struct MemoryRunStore {
    runs: Arc<RwLock<HashMap<Uuid, RunResult>>>,
}

impl MemoryRunStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all stored runs (useful for testing)
    pub fn clear(&self) {
        self.runs.write().unwrap().clear();
    }
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunResultStore for MemoryRunStore {
    async fn save_run(&mut self, result: &RunResult) -> ReconResult<()> {
        let mut runs = self.runs.write().unwrap();
        // Run results are append-only; overwriting one is a caller bug.
        if runs.contains_key(&result.run_id) {
            return Err(ReconError::Storage(format!(
                "run {} already stored",
                result.run_id
            )));
        }
        runs.insert(result.run_id, result.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: Uuid) -> ReconResult<Option<RunResult>> {
        Ok(self.runs.read().unwrap().get(&run_id).cloned())
    }

    async fn list_runs_for_cycle(&self, cycle_id: &str) -> ReconResult<Vec<RunResult>> {
        let runs = self.runs.read().unwrap();
        let mut matching: Vec<RunResult> = runs
            .values()
            .filter(|r| r.cycle_id == cycle_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(matching)
    }

    async fn hanging_carry_over(&self, run_id: Uuid) -> ReconResult<Vec<TransactionRecord>> {
        let runs = self.runs.read().unwrap();
        let run = runs
            .get(&run_id)
            .ok_or_else(|| ReconError::Storage(format!("run {run_id} not found")))?;
        Ok(run.hanging_records().into_iter().cloned().collect())
    }
}
