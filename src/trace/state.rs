//! Per-module auto-quantization state

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, FusionResult};

use super::op::SeenOp;

/// Trace of ops seen while running one module
///
/// `idx_to_seen_ops` keeps insertion order, which is the trace order.
/// Serialized as a plain list of [`SeenOp`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<SeenOp>", into = "Vec<SeenOp>")]
pub struct AutoQuantState {
    idx_to_seen_ops: IndexMap<usize, SeenOp>,
}

impl AutoQuantState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from ops given in trace order
    pub fn from_ops<I>(ops: I) -> FusionResult<Self>
    where
        I: IntoIterator<Item = SeenOp>,
    {
        let mut state = Self::new();
        for op in ops {
            state.insert(op)?;
        }
        Ok(state)
    }

    /// Append an op to the trace under its own `idx`
    pub fn insert(&mut self, op: SeenOp) -> FusionResult<()> {
        match self.idx_to_seen_ops.entry(op.idx) {
            Entry::Occupied(_) => Err(FusionError::DuplicateTraceIndex(op.idx)),
            Entry::Vacant(slot) => {
                slot.insert(op);
                Ok(())
            }
        }
    }

    /// The underlying ordered map
    pub fn idx_to_seen_ops(&self) -> &IndexMap<usize, SeenOp> {
        &self.idx_to_seen_ops
    }

    /// Get an op by trace index
    pub fn get(&self, idx: usize) -> Option<&SeenOp> {
        self.idx_to_seen_ops.get(&idx)
    }

    /// Get an op by its position in trace order
    pub fn get_at(&self, position: usize) -> Option<&SeenOp> {
        self.idx_to_seen_ops.get_index(position).map(|(_, op)| op)
    }

    /// Position of a trace index in trace order
    pub fn position_of(&self, idx: usize) -> Option<usize> {
        self.idx_to_seen_ops.get_index_of(&idx)
    }

    /// Iterate over ops in trace order
    pub fn seen_ops(&self) -> impl Iterator<Item = &SeenOp> {
        self.idx_to_seen_ops.values()
    }

    /// Number of ops in the trace
    pub fn len(&self) -> usize {
        self.idx_to_seen_ops.len()
    }

    /// Check if the trace is empty
    pub fn is_empty(&self) -> bool {
        self.idx_to_seen_ops.is_empty()
    }
}

impl TryFrom<Vec<SeenOp>> for AutoQuantState {
    type Error = FusionError;

    fn try_from(ops: Vec<SeenOp>) -> FusionResult<Self> {
        Self::from_ops(ops)
    }
}

impl From<AutoQuantState> for Vec<SeenOp> {
    fn from(state: AutoQuantState) -> Self {
        state.idx_to_seen_ops.into_values().collect()
    }
}
