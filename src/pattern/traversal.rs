//! Trace traversal utilities
//!
//! Forward walks along single-consumer edges of a trace.

use rustc_hash::FxHashSet;

use crate::graph::TraceGraph;
use crate::trace::SeenOp;
use crate::traits::ConsumerLookup;

/// Iterator over a single-consumer chain
///
/// Yields the start op, then the sole consumer of each yielded op. Ends as
/// soon as an op has zero or several consumers. The consumer lookup for an op
/// runs only when the element after it is requested.
pub struct ChainIterator<'a, 'l, L> {
    lookup: &'l L,
    start: Option<&'a SeenOp>,
    current: Option<&'a SeenOp>,
}

impl<'a, 'l, L: ConsumerLookup<'a>> ChainIterator<'a, 'l, L> {
    /// Create a chain walk starting at `start`
    pub fn new(lookup: &'l L, start: &'a SeenOp) -> Self {
        Self {
            lookup,
            start: Some(start),
            current: None,
        }
    }
}

impl<'a, 'l, L: ConsumerLookup<'a>> Iterator for ChainIterator<'a, 'l, L> {
    type Item = &'a SeenOp;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.current = Some(start);
            return self.current;
        }

        let prev = self.current?;
        self.current = self.lookup.sole_user(prev);
        self.current
    }
}

/// Collect the maximal single-consumer chain starting at `start`
///
/// Stops before revisiting an op, so a cyclic trace still terminates.
pub fn linear_chain<'a, L: ConsumerLookup<'a>>(lookup: &L, start: &'a SeenOp) -> Vec<&'a SeenOp> {
    let mut visited = FxHashSet::default();
    ChainIterator::new(lookup, start)
        .take_while(|op| visited.insert(op.idx))
        .collect()
}

/// Ops that do not continue a single-consumer chain
///
/// An op is a chain head unless it has exactly one producer and is that
/// producer's sole consumer.
pub fn chain_heads<'a>(graph: &TraceGraph<'a>) -> Vec<&'a SeenOp> {
    graph
        .ops()
        .filter(|op| match graph.producers_of(op).as_slice() {
            [producer] => graph
                .sole_user(producer)
                .map_or(true, |user| user.idx != op.idx),
            _ => true,
        })
        .collect()
}

/// Every maximal single-consumer chain of the trace, in trace order of heads
pub fn linear_chains<'a>(graph: &TraceGraph<'a>) -> Vec<Vec<&'a SeenOp>> {
    chain_heads(graph)
        .into_iter()
        .map(|head| linear_chain(graph, head))
        .collect()
}
