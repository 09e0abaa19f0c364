//! Local copy of the athlete's saved plans, mutated optimistically while the
//! host's save/delete requests are in flight.

use log::{debug, warn};

use crate::error::PlannerError;
use crate::model::SavedPlan;

pub type OpId = u64;

#[derive(Debug, Clone)]
struct PendingOp {
    id: OpId,
    plan_id: String,
    /// Position and contents of the plan before the operation, if it existed.
    previous: Option<(usize, SavedPlan)>,
}

#[derive(Debug, Default)]
pub struct PlanCache {
    plans: Vec<SavedPlan>,
    journal: Vec<PendingOp>,
    next_op: OpId,
}

impl PlanCache {
    pub fn new(plans: Vec<SavedPlan>) -> Self {
        Self {
            plans,
            ..Default::default()
        }
    }

    pub fn plans(&self) -> &[SavedPlan] {
        &self.plans
    }

    pub fn get(&self, plan_id: &str) -> Option<&SavedPlan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    pub fn pending_count(&self) -> usize {
        self.journal.len()
    }

    /// Replace the cache with a fresh server listing. Pending operations are
    /// dropped since the listing supersedes them.
    pub fn replace_all(&mut self, plans: Vec<SavedPlan>) {
        if !self.journal.is_empty() {
            debug!("dropping {} pending plan operations on reload", self.journal.len());
        }
        self.plans = plans;
        self.journal.clear();
    }

    fn position(&self, plan_id: &str) -> Option<usize> {
        self.plans.iter().position(|p| p.id == plan_id)
    }

    fn record(&mut self, plan_id: String, previous: Option<(usize, SavedPlan)>) -> OpId {
        let id = self.next_op;
        self.next_op += 1;
        self.journal.push(PendingOp {
            id,
            plan_id,
            previous,
        });
        id
    }

    /// Insert or replace a plan now; new plans go first in the list.
    pub fn begin_upsert(&mut self, plan: SavedPlan) -> OpId {
        let plan_id = plan.id.clone();
        let previous = match self.position(&plan_id) {
            Some(idx) => {
                let old = std::mem::replace(&mut self.plans[idx], plan);
                Some((idx, old))
            }
            None => {
                self.plans.insert(0, plan);
                None
            }
        };
        self.record(plan_id, previous)
    }

    /// Remove a plan now.
    pub fn begin_delete(&mut self, plan_id: &str) -> Result<OpId, PlannerError> {
        let idx = self
            .position(plan_id)
            .ok_or_else(|| PlannerError::UnknownPlan(plan_id.to_string()))?;
        let old = self.plans.remove(idx);
        Ok(self.record(plan_id.to_string(), Some((idx, old))))
    }

    /// Remove `op` from the journal, returning it and its journal position.
    fn take_op(&mut self, op: OpId) -> Result<(usize, PendingOp), PlannerError> {
        let idx = self
            .journal
            .iter()
            .position(|p| p.id == op)
            .ok_or(PlannerError::UnknownOperation(op))?;
        Ok((idx, self.journal.remove(idx)))
    }

    /// The next pending operation on the same plan, queued after `from`.
    fn later_op(&mut self, from: usize, plan_id: &str) -> Option<&mut PendingOp> {
        self.journal[from..].iter_mut().find(|p| p.plan_id == plan_id)
    }

    /// The request succeeded. `confirmed` is the server's copy of an upserted
    /// plan (it may carry a new id or timestamp) and replaces the local one.
    ///
    /// While a later operation on the same plan is still pending, the server
    /// copy becomes that operation's snapshot instead of overwriting its edit.
    pub fn commit(&mut self, op: OpId, confirmed: Option<SavedPlan>) -> Result<(), PlannerError> {
        let (at, pending) = self.take_op(op)?;
        let Some(plan) = confirmed else {
            return Ok(());
        };

        let cached = self.position(&pending.plan_id);
        for other in self.journal.iter_mut().filter(|p| p.plan_id == pending.plan_id) {
            other.plan_id = plan.id.clone();
        }
        if let Some(idx) = cached {
            self.plans[idx].id = plan.id.clone();
        }

        if let Some(later) = self.later_op(at, &plan.id) {
            if let Some((_, snapshot)) = later.previous.as_mut() {
                *snapshot = plan;
            }
            return Ok(());
        }
        match cached {
            Some(idx) => self.plans[idx] = plan,
            None => warn!("confirmed plan '{}' is no longer cached", pending.plan_id),
        }
        Ok(())
    }

    /// The request failed: put the plan back the way it was.
    ///
    /// When a later operation on the same plan is still pending, its edit
    /// stays in place and it inherits this operation's snapshot, so rolling
    /// that one back too restores the original plan.
    pub fn rollback(&mut self, op: OpId) -> Result<(), PlannerError> {
        let (at, pending) = self.take_op(op)?;
        warn!("rolling back plan operation #{op} on '{}'", pending.plan_id);

        if let Some(later) = self.later_op(at, &pending.plan_id) {
            later.previous = pending.previous;
            return Ok(());
        }

        if let Some(idx) = self.position(&pending.plan_id) {
            self.plans.remove(idx);
        }
        if let Some((idx, plan)) = pending.previous {
            let idx = idx.min(self.plans.len());
            self.plans.insert(idx, plan);
        }
        Ok(())
    }
}
