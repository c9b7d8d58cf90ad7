//! Per-operation pending flags for contract writes

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;

use super::FacadeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Fund,
    CompleteMilestone,
    Refund,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteOp::Fund => "fund",
            WriteOp::CompleteMilestone => "completeMilestone",
            WriteOp::Refund => "refund",
        };
        f.write_str(name)
    }
}

/// Set of write kinds currently awaiting confirmation
#[derive(Debug, Default)]
pub struct InFlight {
    pending: Mutex<HashSet<WriteOp>>,
}

impl InFlight {
    /// Mark `op` pending until the returned guard drops
    pub fn begin(&self, op: WriteOp) -> Result<InFlightGuard<'_>, FacadeError> {
        if !self.pending.lock().insert(op) {
            return Err(FacadeError::AlreadyPending(op));
        }
        Ok(InFlightGuard { owner: self, op })
    }

    pub fn is_pending(&self, op: WriteOp) -> bool {
        self.pending.lock().contains(&op)
    }
}

pub struct InFlightGuard<'a> {
    owner: &'a InFlight,
    op: WriteOp,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.owner.pending.lock().remove(&self.op);
    }
}
