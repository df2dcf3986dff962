//! Indexed view of a single trace
//!
//! `TraceGraph` borrows an [`AutoQuantState`] and precomputes tensor maps
//! so consumer and producer queries do not rescan the trace.

use smallvec::SmallVec;

use crate::trace::{AutoQuantState, SeenOp, TensorId};
use crate::traits::ConsumerLookup;

use super::maps::{build_consumer_map, build_producer_map, ConsumerMap, ProducerMap};

/// Trace graph for efficient consumer lookups
#[derive(Debug)]
pub struct TraceGraph<'a> {
    state: &'a AutoQuantState,

    /// Maps tensor id → positions of consumer ops
    pub consumer_map: ConsumerMap,

    /// Maps tensor id → positions of producer ops
    pub producer_map: ProducerMap,
}

impl<'a> TraceGraph<'a> {
    /// Index the given trace
    pub fn new(state: &'a AutoQuantState) -> Self {
        Self {
            state,
            consumer_map: build_consumer_map(state),
            producer_map: build_producer_map(state),
        }
    }

    /// The underlying trace
    pub fn state(&self) -> &'a AutoQuantState {
        self.state
    }

    /// Number of ops in the trace
    pub fn op_count(&self) -> usize {
        self.state.len()
    }

    /// Iterate over ops in trace order
    pub fn ops(&self) -> impl Iterator<Item = &'a SeenOp> {
        self.state.seen_ops()
    }

    /// Positions of the ops reading a tensor
    pub fn consumer_positions(&self, tensor: TensorId) -> &[usize] {
        self.consumer_map
            .get(&tensor)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Ops whose outputs feed any input of `op`, in trace order
    pub fn producers_of(&self, op: &SeenOp) -> Vec<&'a SeenOp> {
        let mut positions: SmallVec<[usize; 4]> = op
            .input_tensor_ids
            .iter()
            .filter_map(|t| self.producer_map.get(t))
            .flatten()
            .copied()
            .collect();
        self.resolve(&mut positions)
    }

    /// Check if the op's outputs are read by exactly one op
    pub fn is_single_use(&self, op: &SeenOp) -> bool {
        self.sole_user(op).is_some()
    }

    fn resolve(&self, positions: &mut SmallVec<[usize; 4]>) -> Vec<&'a SeenOp> {
        positions.sort_unstable();
        positions.dedup();
        positions
            .iter()
            .filter_map(|&p| self.state.get_at(p))
            .collect()
    }
}

impl<'a> ConsumerLookup<'a> for TraceGraph<'a> {
    fn users_of(&self, op: &SeenOp) -> Vec<&'a SeenOp> {
        let mut positions: SmallVec<[usize; 4]> = op
            .output_tensor_ids
            .iter()
            .flat_map(|t| self.consumer_positions(*t))
            .copied()
            .collect();
        self.resolve(&mut positions)
    }
}
