//! Trace map types and builders
//!
//! Defines the adjacency structures used for consumer lookups.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::trace::{AutoQuantState, TensorId};

/// Type alias for consumer map: tensor_id → [positions of consuming ops]
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerMap = FxHashMap<TensorId, SmallVec<[usize; 4]>>;

/// Type alias for producer map: tensor_id → [positions of producing ops]
pub type ProducerMap = FxHashMap<TensorId, SmallVec<[usize; 1]>>;

/// Build consumer map from a trace
///
/// Maps each tensor id to the trace positions of the ops that read it.
/// Positions are ascending; an op reading the same tensor twice is listed once.
pub fn build_consumer_map(state: &AutoQuantState) -> ConsumerMap {
    let mut map: ConsumerMap = FxHashMap::default();

    for (position, op) in state.seen_ops().enumerate() {
        for input in &op.input_tensor_ids {
            let consumers = map.entry(*input).or_default();
            if consumers.last() != Some(&position) {
                consumers.push(position);
            }
        }
    }

    map
}

/// Build producer map from a trace
///
/// Maps each tensor id to the trace positions of the ops that write it.
pub fn build_producer_map(state: &AutoQuantState) -> ProducerMap {
    let mut map: ProducerMap = FxHashMap::default();

    for (position, op) in state.seen_ops().enumerate() {
        for output in &op.output_tensor_ids {
            let producers = map.entry(*output).or_default();
            if producers.last() != Some(&position) {
                producers.push(position);
            }
        }
    }

    map
}
