//! Transfer ledger
//!
//! Plans group transfers; each transfer moves material from one registered
//! position to another. The ledger only appends.

use crate::StorageTrait;
use std::collections::HashSet;
use std::sync::Arc;
use wellplated_core::{
    describe_transfer, ActorId, Plan, PlanId, Position, PositionId, Transfer, WellplatedError,
    WellplatedResult,
};

pub struct TransferLedger {
    storage: Arc<dyn StorageTrait>,
}

impl TransferLedger {
    pub fn new(storage: Arc<dyn StorageTrait>) -> Self {
        Self { storage }
    }

    pub fn create_plan(&self, created_by: ActorId) -> WellplatedResult<Plan> {
        let plan = Plan::new(created_by);
        self.storage.plan_insert(&plan)?;
        tracing::debug!(plan_id = %plan.id, created_by = %created_by, "Created plan");
        Ok(plan)
    }

    pub fn plan(&self, id: PlanId) -> WellplatedResult<Plan> {
        self.storage
            .plan_get(id)?
            .ok_or_else(|| WellplatedError::missing(id))
    }

    /// Append a transfer from `source_id` to `sink_id` under a plan.
    ///
    /// The plan and both positions must exist. Source and sink may be the
    /// same position, and the same pair may be recorded more than once.
    pub fn record(
        &self,
        plan_id: PlanId,
        source_id: PositionId,
        sink_id: PositionId,
    ) -> WellplatedResult<Transfer> {
        let transfer = Transfer::new(plan_id, source_id, sink_id);
        self.storage.transfer_insert(&transfer)?;
        tracing::debug!(
            transfer_id = %transfer.id,
            plan_id = %plan_id,
            source_id = %source_id,
            sink_id = %sink_id,
            "Recorded transfer"
        );
        Ok(transfer)
    }

    pub fn record_between(
        &self,
        plan: &Plan,
        source: &Position,
        sink: &Position,
    ) -> WellplatedResult<Transfer> {
        self.record(plan.id, source.id(), sink.id())
    }

    /// Transfers of a plan in recording order.
    pub fn transfers(&self, plan_id: PlanId) -> WellplatedResult<Vec<Transfer>> {
        self.plan(plan_id)?;
        self.storage.transfer_list_by_plan(plan_id)
    }

    /// Positions that received material from `position_id`.
    pub fn sinks_of(&self, position_id: PositionId) -> WellplatedResult<Vec<Position>> {
        let ids = self
            .storage
            .transfer_list_by_source(position_id)?
            .into_iter()
            .map(|t| t.sink_id);
        self.resolve_distinct(ids)
    }

    /// Positions that sent material to `position_id`.
    pub fn sources_of(&self, position_id: PositionId) -> WellplatedResult<Vec<Position>> {
        let ids = self
            .storage
            .transfer_list_by_sink(position_id)?
            .into_iter()
            .map(|t| t.source_id);
        self.resolve_distinct(ids)
    }

    fn position(&self, id: PositionId) -> WellplatedResult<Position> {
        self.storage
            .position_get(id)?
            .ok_or_else(|| WellplatedError::missing(id))
    }

    fn resolve_distinct(
        &self,
        ids: impl Iterator<Item = PositionId>,
    ) -> WellplatedResult<Vec<Position>> {
        let mut seen = HashSet::new();
        ids.filter(|id| seen.insert(*id))
            .map(|id| self.position(id))
            .collect()
    }

    /// `source -> sink` using the positions' labels.
    pub fn describe(&self, transfer: &Transfer) -> WellplatedResult<String> {
        let source = self.position(transfer.source_id)?;
        let sink = self.position(transfer.sink_id)?;
        Ok(describe_transfer(&source, &sink))
    }
}
