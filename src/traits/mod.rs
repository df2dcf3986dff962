//! Core traits for autoquant-fusion
//!
//! Defines the seam between the matcher and whatever answers
//! "who consumes this op's output?".

use crate::trace::SeenOp;

/// Consumer query over a single trace
///
/// Implementations return ops borrowed from the trace they were built on,
/// hence the `'a` parameter.
///
/// # Example
///
/// ```ignore
/// let graph = TraceGraph::new(&state);
/// if let Some(next) = graph.sole_user(conv_op) {
///     println!("{} feeds only {}", conv_op.fqn, next.fqn);
/// }
/// ```
pub trait ConsumerLookup<'a> {
    /// Every op of the trace that reads any output of `op`, in trace order,
    /// each op at most once
    fn users_of(&self, op: &SeenOp) -> Vec<&'a SeenOp>;

    /// The consumer of `op` if there is exactly one
    fn sole_user(&self, op: &SeenOp) -> Option<&'a SeenOp> {
        match self.users_of(op).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}
