//! Top-level reconciliation engine.
//!
//! One invocation is a pure function from (record pool, configuration) to a
//! [`RunResult`]: partition the pool into match groups, categorize each
//! group, classify exceptions, derive TTUM candidates, and assemble the
//! immutable result. Nothing is exposed until the whole run has completed.

use std::collections::HashMap;
use uuid::Uuid;

use crate::categorizer::categorize;
use crate::config::ReconConfig;
use crate::exception::ExceptionClassifier;
use crate::matching::MatchingEngine;
use crate::run_result::{RecordOutcome, RunResult, RunSummary};
use crate::ttum::TtumBuilder;
use crate::types::{MatchStatus, ReconError, ReconResult, TransactionRecord};

/// Reconciliation engine for one configuration
pub struct ReconEngine {
    config: ReconConfig,
}

impl ReconEngine {
    /// Create an engine, validating the configuration up front.
    ///
    /// Configuration defects abort here, before any run result can be
    /// produced.
    pub fn new(config: ReconConfig) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run one reconciliation cycle with a freshly generated run id
    pub fn run(&self, cycle_id: &str, pool: &[TransactionRecord]) -> ReconResult<RunResult> {
        self.run_with_id(Uuid::new_v4(), cycle_id, pool)
    }

    /// Run one reconciliation cycle under a caller-supplied run id.
    ///
    /// Deterministic: the same pool, configuration, and run id produce an
    /// identical run result, group ids and tie-breaks included.
    pub fn run_with_id(
        &self,
        run_id: Uuid,
        cycle_id: &str,
        pool: &[TransactionRecord],
    ) -> ReconResult<RunResult> {
        crate::utils::validate_pool(cycle_id, pool)?;

        let records_by_id: HashMap<String, TransactionRecord> = pool
            .iter()
            .map(|r| (r.record_id.clone(), r.clone()))
            .collect();

        let tagged_groups = MatchingEngine::new(self.config.clone()).partition(pool);
        let classifier = ExceptionClassifier::new(&self.config);

        let mut assignments: HashMap<&str, (MatchStatus, Uuid)> = HashMap::new();
        let mut exceptions = Vec::new();
        let mut match_groups = Vec::new();

        for tagged in &tagged_groups {
            let status = categorize(tagged);
            for member_id in &tagged.group.member_record_ids {
                assignments.insert(member_id.as_str(), (status, tagged.group.group_id));
            }
            if let Some(exception) = classifier.classify(&tagged.group, status, &records_by_id) {
                exceptions.push(exception);
            }
            match_groups.push(tagged.group.clone());
        }

        // TTUM derivation runs before assembly so a configuration gap aborts
        // without producing a partial result.
        let ttum_candidates = TtumBuilder::new(&self.config).build(&exceptions)?;

        let mut summary = RunSummary::default();
        let mut records = Vec::with_capacity(pool.len());
        for record in pool {
            // Every record must land in exactly one group; a gap here is an
            // engine invariant breach, not something to paper over.
            let Some((status, group_id)) = assignments.get(record.record_id.as_str()) else {
                return Err(ReconError::UnassignedRecord(record.record_id.clone()));
            };
            summary.record(*status);
            records.push(RecordOutcome {
                record: record.clone(),
                status: *status,
                group_id: *group_id,
            });
        }

        Ok(RunResult {
            run_id,
            cycle_id: cycle_id.to_string(),
            summary,
            records,
            exceptions,
            ttum_candidates,
            match_groups,
        })
    }
}
