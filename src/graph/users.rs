//! Scan-based consumer lookup
//!
//! The un-indexed form of the consumer query: every call walks the whole
//! trace. Kept alongside [`TraceGraph`](super::TraceGraph) as the reference
//! behavior and for one-off queries where building maps is not worth it.

use crate::trace::{AutoQuantState, SeenOp};
use crate::traits::ConsumerLookup;

/// Get every op in the trace that reads an output of `seen_op`
///
/// Ops are returned in trace order, each at most once.
pub fn get_users_of_seen_op<'a>(state: &'a AutoQuantState, seen_op: &SeenOp) -> Vec<&'a SeenOp> {
    state
        .seen_ops()
        .filter(|candidate| candidate.consumes(seen_op))
        .collect()
}

/// [`ConsumerLookup`] that rescans the trace on every query
#[derive(Debug, Clone, Copy)]
pub struct LinearScan<'a> {
    state: &'a AutoQuantState,
}

impl<'a> LinearScan<'a> {
    /// Wrap a trace
    pub fn new(state: &'a AutoQuantState) -> Self {
        Self { state }
    }
}

impl<'a> ConsumerLookup<'a> for LinearScan<'a> {
    fn users_of(&self, op: &SeenOp) -> Vec<&'a SeenOp> {
        get_users_of_seen_op(self.state, op)
    }
}
