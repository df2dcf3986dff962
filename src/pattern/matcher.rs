//! Pattern matching engine for operation traces
//!
//! Implements forward (producer-to-consumer) matching along single-consumer
//! edges.

use crate::trace::SeenOp;
use crate::traits::ConsumerLookup;

use super::ops::FusionPattern;
use super::traversal::ChainIterator;

/// Result of a successful pattern match
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    /// Matched ops in pattern order (first = chain start)
    pub ops: Vec<&'a SeenOp>,
}

impl<'a> MatchResult<'a> {
    /// Get the first matched op (chain start)
    pub fn first(&self) -> Option<&'a SeenOp> {
        self.ops.first().copied()
    }

    /// Get the last matched op (chain end)
    pub fn last(&self) -> Option<&'a SeenOp> {
        self.ops.last().copied()
    }

    /// Number of matched ops
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// FQNs of the matched ops, in pattern order
    pub fn fqns(&self) -> Vec<String> {
        self.ops.iter().map(|op| op.fqn.clone()).collect()
    }
}

/// Pattern matcher over one trace
///
/// A pattern matches at a start op when the start op and its successive sole
/// consumers have exactly the pattern's types. Matching stops at the first
/// mismatch, and a consumer lookup is only made after a type matched.
pub struct PatternMatcher<'l, L> {
    lookup: &'l L,
}

impl<'l, L> PatternMatcher<'l, L> {
    /// Create a new pattern matcher
    pub fn new(lookup: &'l L) -> Self {
        Self { lookup }
    }

    /// Match a pattern starting from the given op
    ///
    /// # Returns
    /// * `Some(MatchResult)` if pattern matches
    /// * `None` if pattern does not match or is empty
    ///
    /// # Example
    /// ```ignore
    /// // Match Conv2d -> BatchNorm2d -> ReLU
    /// let result = matcher.match_pattern(conv_op, &FusionPattern::from(CONV2D_BN_RELU));
    /// ```
    pub fn match_pattern<'a>(
        &self,
        start: &'a SeenOp,
        pattern: &FusionPattern,
    ) -> Option<MatchResult<'a>>
    where
        L: ConsumerLookup<'a>,
    {
        if pattern.is_empty() {
            return None;
        }

        let mut matched = Vec::with_capacity(pattern.len());
        let mut chain = ChainIterator::new(self.lookup, start);

        for expected in pattern.types() {
            match chain.next() {
                Some(op) if op.op_type == *expected => matched.push(op),
                _ => return None,
            }
        }

        Some(MatchResult { ops: matched })
    }

    /// Find all matches of a pattern, trying every op as a chain start
    pub fn find_all_matches<'a, I>(&self, ops: I, pattern: &FusionPattern) -> Vec<MatchResult<'a>>
    where
        L: ConsumerLookup<'a>,
        I: IntoIterator<Item = &'a SeenOp>,
    {
        let Some(lead) = pattern.leading_type() else {
            return Vec::new();
        };

        ops.into_iter()
            .filter(|op| op.op_type == *lead)
            .filter_map(|op| self.match_pattern(op, pattern))
            .collect()
    }
}

/// Convenience function to create a pattern matcher
pub fn matcher<L>(lookup: &L) -> PatternMatcher<'_, L> {
    PatternMatcher::new(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LinearScan, TraceGraph};
    use crate::pattern::ops::{CONV2D_BN, CONV2D_BN_RELU, CONV2D_RELU, LINEAR_RELU};
    use crate::trace::{make_seen_op, AutoQuantState};

    fn make_conv_bn_relu_trace() -> AutoQuantState {
        AutoQuantState::from_ops([
            make_seen_op(0, "Conv2d", "conv_0", &[0], &[1]),
            make_seen_op(1, "BatchNorm2d", "bn_0", &[1], &[2]),
            make_seen_op(2, "ReLU", "relu_0", &[2], &[3]),
        ])
        .unwrap()
    }

    #[test]
    fn test_match_pattern_success() {
        let state = make_conv_bn_relu_trace();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        let conv = state.get(0).unwrap();
        let m = matcher
            .match_pattern(conv, &FusionPattern::from(CONV2D_BN_RELU))
            .unwrap();

        assert_eq!(m.len(), 3);
        assert_eq!(m.fqns(), vec!["conv_0", "bn_0", "relu_0"]);
        assert_eq!(m.first().unwrap().idx, 0);
        assert_eq!(m.last().unwrap().idx, 2);
    }

    #[test]
    fn test_match_pattern_prefix() {
        let state = make_conv_bn_relu_trace();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        let m = matcher
            .match_pattern(state.get(0).unwrap(), &FusionPattern::from(CONV2D_BN))
            .unwrap();
        assert_eq!(m.fqns(), vec!["conv_0", "bn_0"]);
    }

    #[test]
    fn test_match_pattern_failure() {
        let state = make_conv_bn_relu_trace();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        // Wrong second type
        let conv = state.get(0).unwrap();
        assert!(matcher
            .match_pattern(conv, &FusionPattern::from(CONV2D_RELU))
            .is_none());

        // Wrong start
        let bn = state.get(1).unwrap();
        assert!(matcher
            .match_pattern(bn, &FusionPattern::from(CONV2D_BN))
            .is_none());
    }

    #[test]
    fn test_match_pattern_past_trace_end() {
        let state = make_conv_bn_relu_trace();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        let relu = state.get(2).unwrap();
        let pattern = FusionPattern::new(["ReLU", "Linear"]);
        assert!(matcher.match_pattern(relu, &pattern).is_none());
        assert!(matcher
            .match_pattern(relu, &FusionPattern::new(["ReLU"]))
            .is_some());
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let state = make_conv_bn_relu_trace();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        let empty = FusionPattern::new(Vec::<&str>::new());
        assert!(matcher.match_pattern(state.get(0).unwrap(), &empty).is_none());
        assert!(matcher.find_all_matches(state.seen_ops(), &empty).is_empty());
    }

    #[test]
    fn test_fan_out_kills_match() {
        let state = AutoQuantState::from_ops([
            make_seen_op(0, "Conv2d", "conv", &[0], &[1]),
            make_seen_op(1, "BatchNorm2d", "bn", &[1], &[2]),
            make_seen_op(2, "Linear", "skip", &[1], &[3]),
        ])
        .unwrap();
        let scan = LinearScan::new(&state);
        let matcher = matcher(&scan);

        let conv = state.get(0).unwrap();
        assert!(matcher
            .match_pattern(conv, &FusionPattern::from(CONV2D_BN))
            .is_none());
        // The fan-out op alone still matches a single-type pattern
        assert!(matcher
            .match_pattern(conv, &FusionPattern::new(["Conv2d"]))
            .is_some());
    }

    #[test]
    fn test_find_all_matches() {
        let state = AutoQuantState::from_ops([
            make_seen_op(0, "Linear", "fc1", &[0], &[1]),
            make_seen_op(1, "ReLU", "act1", &[1], &[2]),
            make_seen_op(2, "Linear", "fc2", &[2], &[3]),
            make_seen_op(3, "ReLU", "act2", &[3], &[4]),
            make_seen_op(4, "Linear", "head", &[4], &[5]),
        ])
        .unwrap();
        let graph = TraceGraph::new(&state);
        let matcher = PatternMatcher::new(&graph);

        let matches = matcher.find_all_matches(state.seen_ops(), &FusionPattern::from(LINEAR_RELU));
        let fqns: Vec<_> = matches.iter().map(MatchResult::fqns).collect();
        assert_eq!(fqns, vec![vec!["fc1", "act1"], vec!["fc2", "act2"]]);
    }
}
