use std::sync::Mutex;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use tracing::{debug, info};

use crate::cache::{Fingerprint, Memo, MemoStats, SnapshotKey};
use crate::columns::ReviewSchema;
use crate::db::DbPool;
use crate::error::Result;
use crate::extraction;
use crate::reconciliation::{assemble_proposed, attach_typology, build_final_table};
use crate::reports::{self, InitialSelectionReport};

/// Raw extraction frames of one store snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReviewInputs {
    pub initial: DataFrame,
    pub validated: DataFrame,
    pub proposals: DataFrame,
    pub objectives: DataFrame,
    pub typologies: DataFrame,
}

impl ReviewInputs {
    pub async fn load(pool: &DbPool) -> Result<Self> {
        Ok(Self {
            initial: extraction::initial_selection(pool).await?,
            validated: extraction::validated_stations(pool).await?,
            proposals: extraction::proposed_stations(pool).await?,
            objectives: extraction::specific_objectives(pool).await?,
            typologies: extraction::station_typologies(pool).await?,
        })
    }
}

/// One loaded snapshot with its derived tables.
///
/// Inputs are fixed at construction; the final table is computed on first
/// use and memoized under the fingerprint of its three inputs.
#[derive(Debug)]
pub struct ReviewSession {
    key: SnapshotKey,
    loaded_at: DateTime<Utc>,
    schema: ReviewSchema,
    initial: DataFrame,
    validated: DataFrame,
    proposed: DataFrame,
    input_fingerprint: Fingerprint,
    memo: Mutex<Memo<Fingerprint, DataFrame>>,
}

impl ReviewSession {
    pub fn new(key: SnapshotKey, inputs: ReviewInputs, schema: ReviewSchema) -> Result<Self> {
        let code = schema.key();
        let initial = attach_typology(&inputs.initial, &inputs.typologies, code)?;
        let validated = attach_typology(&inputs.validated, &inputs.typologies, code)?;
        let proposed =
            assemble_proposed(&inputs.proposals, &inputs.objectives, &inputs.initial, &schema)?;

        let input_fingerprint = Fingerprint::combine(&[
            Fingerprint::of_frame(&initial)?,
            Fingerprint::of_frame(&validated)?,
            Fingerprint::of_frame(&proposed)?,
        ]);

        info!(
            snapshot = %key,
            initial = initial.height(),
            validated = validated.height(),
            proposed = proposed.height(),
            fingerprint = %input_fingerprint,
            "Review snapshot ready"
        );

        Ok(Self {
            key,
            loaded_at: Utc::now(),
            schema,
            initial,
            validated,
            proposed,
            input_fingerprint,
            memo: Mutex::new(Memo::new()),
        })
    }

    pub async fn load(pool: &DbPool, key: SnapshotKey) -> Result<Self> {
        let inputs = ReviewInputs::load(pool).await?;
        Self::new(key, inputs, ReviewSchema::canonical().clone())
    }

    pub fn key(&self) -> &SnapshotKey {
        &self.key
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn schema(&self) -> &ReviewSchema {
        &self.schema
    }

    /// Initial selection with current typology attached.
    pub fn initial(&self) -> &DataFrame {
        &self.initial
    }

    pub fn validated(&self) -> &DataFrame {
        &self.validated
    }

    /// Proposals in canonical shape.
    pub fn proposed(&self) -> &DataFrame {
        &self.proposed
    }

    pub fn final_table(&self) -> Result<DataFrame> {
        let mut memo = self
            .memo
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        memo.get_or_try_insert_with(self.input_fingerprint, || {
            debug!(snapshot = %self.key, "Building final review table");
            build_final_table(&self.initial, &self.validated, &self.proposed, &self.schema)
        })
        .map_err(Into::into)
    }

    pub fn retained(&self) -> Result<DataFrame> {
        Ok(reports::retained(&self.proposed, &self.initial, &self.schema)?)
    }

    pub fn newly_added(&self) -> Result<DataFrame> {
        Ok(reports::newly_added(&self.proposed, &self.initial, &self.schema)?)
    }

    pub fn initial_report(&self) -> Result<InitialSelectionReport> {
        Ok(reports::initial_selection_report(&self.initial, &self.schema)?)
    }

    pub fn memo_stats(&self) -> MemoStats {
        self.memo
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .stats()
    }
}
