//! Fusion group discovery over a module tree
//!
//! Every module carrying a trace is scanned: each seen op is tried as the
//! start of each catalog pattern, and every match is recorded once.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::graph::{LinearScan, TraceGraph};
use crate::module::Module;
use crate::pattern::{PatternCatalog, PatternMatcher};
use crate::trace::{AutoQuantState, SeenOp};
use crate::traits::ConsumerLookup;

use super::group::{FusionGroup, FusionGroups};

/// How consumer queries are answered during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerIndex {
    /// Build tensor maps once per trace
    #[default]
    Precomputed,
    /// Rescan the trace for every query
    LinearScan,
}

/// Scan configuration
///
/// All settings give identical results; they only change how much work is
/// done to get there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Consumer query strategy
    pub consumer_index: ConsumerIndex,
    /// Only try patterns whose first type equals the op's type
    pub index_leading_types: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            consumer_index: ConsumerIndex::Precomputed,
            index_leading_types: true,
        }
    }
}

impl MatchConfig {
    /// Try every pattern at every op, rescanning the trace for consumers
    pub fn brute_force() -> Self {
        Self {
            consumer_index: ConsumerIndex::LinearScan,
            index_leading_types: false,
        }
    }
}

/// Statistics from a scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MatchStats {
    /// Modules visited in the tree
    pub modules_visited: usize,
    /// Modules that carried a trace
    pub modules_with_state: usize,
    /// Seen ops tried as chain starts
    pub ops_scanned: usize,
    /// (op, pattern) pairs tried
    pub patterns_tried: usize,
    /// Distinct groups recorded
    pub groups_found: usize,
    /// Matches dropped because an equal group was already recorded
    pub duplicates_skipped: usize,
}

/// Fusion group finder
///
/// # Example
///
/// ```ignore
/// let catalog = PatternCatalog::default();
/// let mut finder = FusionFinder::new(&catalog).with_config(MatchConfig::brute_force());
/// let groups = finder.find(&model);
/// println!("{} groups from {} ops", groups.len(), finder.stats().ops_scanned);
/// ```
pub struct FusionFinder<'c> {
    catalog: &'c PatternCatalog,
    config: MatchConfig,
    stats: MatchStats,
}

impl<'c> FusionFinder<'c> {
    /// Create a finder for the given catalog
    pub fn new(catalog: &'c PatternCatalog) -> Self {
        Self {
            catalog,
            config: MatchConfig::default(),
            stats: MatchStats::default(),
        }
    }

    /// Configure the finder
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Statistics of the last [`find`](Self::find) call
    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Scan the tree and return the distinct fusion groups in discovery order
    #[instrument(level = "debug", skip_all)]
    pub fn find(&mut self, root: &Module) -> FusionGroups {
        self.stats = MatchStats::default();
        let mut groups = FusionGroups::new();

        for (fqn, module) in root.named_modules() {
            self.stats.modules_visited += 1;

            let Some(state) = module.auto_quant_state() else {
                trace!(module = %fqn, "no auto-quant state, skipping");
                continue;
            };
            self.stats.modules_with_state += 1;

            match self.config.consumer_index {
                ConsumerIndex::Precomputed => {
                    let graph = TraceGraph::new(state);
                    self.scan_trace(&graph, state, &mut groups);
                }
                ConsumerIndex::LinearScan => {
                    let scan = LinearScan::new(state);
                    self.scan_trace(&scan, state, &mut groups);
                }
            }
        }

        debug!(
            modules = self.stats.modules_visited,
            traced = self.stats.modules_with_state,
            ops = self.stats.ops_scanned,
            tried = self.stats.patterns_tried,
            groups = self.stats.groups_found,
            duplicates = self.stats.duplicates_skipped,
            "fusion scan finished"
        );

        groups
    }

    fn scan_trace<'a, L>(&mut self, lookup: &L, state: &'a AutoQuantState, groups: &mut FusionGroups)
    where
        L: ConsumerLookup<'a>,
    {
        let matcher = PatternMatcher::new(lookup);
        let catalog = self.catalog;

        for seen_op in state.seen_ops() {
            self.stats.ops_scanned += 1;

            if self.config.index_leading_types {
                for &index in catalog.positions_starting_with(&seen_op.op_type) {
                    self.try_pattern(&matcher, seen_op, index, groups);
                }
            } else {
                for index in 0..catalog.len() {
                    self.try_pattern(&matcher, seen_op, index, groups);
                }
            }
        }
    }

    fn try_pattern<'a, L>(
        &mut self,
        matcher: &PatternMatcher<'_, L>,
        seen_op: &'a SeenOp,
        index: usize,
        groups: &mut FusionGroups,
    ) where
        L: ConsumerLookup<'a>,
    {
        let Some(pattern) = self.catalog.get(index) else {
            return;
        };
        self.stats.patterns_tried += 1;

        let Some(m) = matcher.match_pattern(seen_op, pattern) else {
            return;
        };

        let group = FusionGroup::from(m);
        if groups.contains(&group) {
            self.stats.duplicates_skipped += 1;
            debug!(%group, "duplicate fusion group skipped");
        } else {
            debug!(%group, %pattern, "found fusion group");
            groups.insert(group);
            self.stats.groups_found += 1;
        }
    }
}

/// Find the fusion groups of a module tree with the default configuration
///
/// Groups are distinct as ordered FQN lists and appear in order of first
/// discovery: modules in pre-order, ops in trace order, patterns in catalog
/// order.
pub fn find_fusion_groups(root: &Module, catalog: &PatternCatalog) -> Vec<FusionGroup> {
    FusionFinder::new(catalog).find(root).into_vec()
}

/// Find fusion groups using the stock pattern catalog, as plain FQN lists
pub fn get_module_fusion_fqns(root: &Module) -> Vec<Vec<String>> {
    let catalog = PatternCatalog::default();
    FusionFinder::new(&catalog).find(root).to_fqn_lists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::get_users_of_seen_op;
    use crate::pattern::{FusionPattern, CONV1D_BN, CONV2D_BN, CONV2D_BN_RELU, CONV2D_RELU};
    use crate::trace::make_seen_op;
    use proptest::prelude::*;

    fn module_with(ops: Vec<SeenOp>) -> Module {
        Module::new().with_state(AutoQuantState::from_ops(ops).unwrap())
    }

    fn all_configs() -> Vec<MatchConfig> {
        let mut configs = Vec::new();
        for consumer_index in [ConsumerIndex::Precomputed, ConsumerIndex::LinearScan] {
            for index_leading_types in [true, false] {
                configs.push(MatchConfig {
                    consumer_index,
                    index_leading_types,
                });
            }
        }
        configs
    }

    /// Direct form of the scan: every op, every pattern, consumers by rescan
    fn reference_groups(root: &Module, catalog: &PatternCatalog) -> Vec<Vec<String>> {
        let mut results: Vec<Vec<String>> = Vec::new();
        for (_, module) in root.named_modules() {
            let Some(state) = module.auto_quant_state() else {
                continue;
            };
            for seen_op in state.seen_ops() {
                for pattern in catalog.patterns() {
                    let mut cur_fqns = Vec::new();
                    let mut cur = Some(seen_op);
                    let mut is_match = true;
                    for expected in pattern.types() {
                        match cur {
                            Some(op) if op.op_type == *expected => {
                                cur_fqns.push(op.fqn.clone());
                                let next = get_users_of_seen_op(state, op);
                                cur = if next.len() == 1 { Some(next[0]) } else { None };
                            }
                            _ => {
                                is_match = false;
                                break;
                            }
                        }
                    }
                    if is_match && !results.contains(&cur_fqns) {
                        results.push(cur_fqns);
                    }
                }
            }
        }
        results
    }

    #[test]
    fn test_single_op_pattern() {
        let root = module_with(vec![
            make_seen_op(0, "Conv", "m.conv0", &[0], &[1]),
            make_seen_op(1, "ReLU", "m.relu0", &[1], &[2]),
        ]);
        let catalog = PatternCatalog::from_names(&[&["Conv"]]).unwrap();

        let groups = find_fusion_groups(&root, &catalog);
        assert_eq!(groups, vec![FusionGroup::from(vec!["m.conv0"])]);
    }

    #[test]
    fn test_two_op_chain() {
        let root = module_with(vec![
            make_seen_op(0, "Conv", "m.conv", &[0], &[1]),
            make_seen_op(1, "BatchNorm", "m.bn", &[1], &[2]),
        ]);
        let catalog = PatternCatalog::from_names(&[&["Conv", "BatchNorm"]]).unwrap();

        let groups = find_fusion_groups(&root, &catalog);
        assert_eq!(groups, vec![FusionGroup::from(vec!["m.conv", "m.bn"])]);
    }

    #[test]
    fn test_fan_out_yields_nothing() {
        let root = module_with(vec![
            make_seen_op(0, "Conv", "m.conv", &[0], &[1]),
            make_seen_op(1, "BatchNorm", "m.bn", &[1], &[2]),
            make_seen_op(2, "Add", "m.add", &[1, 2], &[3]),
        ]);
        let catalog = PatternCatalog::from_names(&[&["Conv", "BatchNorm"]]).unwrap();

        for config in all_configs() {
            let groups = FusionFinder::new(&catalog).with_config(config).find(&root);
            assert!(groups.is_empty());
        }
    }

    #[test]
    fn test_same_group_from_two_modules_recorded_once() {
        let block_2d = module_with(vec![
            make_seen_op(0, "Conv2d", "m.conv", &[0], &[1]),
            make_seen_op(1, "BatchNorm2d", "m.bn", &[1], &[2]),
        ]);
        let block_1d = module_with(vec![
            make_seen_op(0, "Conv1d", "m.conv", &[0], &[1]),
            make_seen_op(1, "BatchNorm1d", "m.bn", &[1], &[2]),
        ]);
        let root = Module::new()
            .with_child("a", block_2d)
            .unwrap()
            .with_child("b", block_1d)
            .unwrap();
        let catalog = PatternCatalog::new(vec![
            FusionPattern::from(CONV2D_BN),
            FusionPattern::from(CONV1D_BN),
        ])
        .unwrap();

        let mut finder = FusionFinder::new(&catalog);
        let groups = finder.find(&root);

        assert_eq!(groups.to_fqn_lists(), vec![vec!["m.conv", "m.bn"]]);
        assert_eq!(finder.stats().groups_found, 1);
        assert_eq!(finder.stats().duplicates_skipped, 1);
    }

    #[test]
    fn test_repeated_call_in_forward_deduplicated() {
        // The same conv/relu pair called twice in one forward
        let root = module_with(vec![
            make_seen_op(0, "Conv2d", "block.conv", &[0], &[1]),
            make_seen_op(1, "ReLU", "block.relu", &[1], &[2]),
            make_seen_op(2, "Conv2d", "block.conv", &[2], &[3]),
            make_seen_op(3, "ReLU", "block.relu", &[3], &[4]),
        ]);

        let fqns = get_module_fusion_fqns(&root);
        assert_eq!(fqns, vec![vec!["block.conv", "block.relu"]]);
    }

    #[test]
    fn test_no_state_yields_empty() {
        let root = Module::new()
            .with_child("conv", Module::of_type("Conv2d"))
            .unwrap()
            .with_child("bn", Module::of_type("BatchNorm2d"))
            .unwrap();
        let catalog = PatternCatalog::default();

        let mut finder = FusionFinder::new(&catalog);
        assert!(finder.find(&root).is_empty());
        assert_eq!(finder.stats().modules_visited, 3);
        assert_eq!(finder.stats().modules_with_state, 0);
        assert_eq!(finder.stats().ops_scanned, 0);
    }

    #[test]
    fn test_overlapping_patterns_in_catalog_order() {
        let root = module_with(vec![
            make_seen_op(0, "Conv2d", "features.0", &[0], &[1]),
            make_seen_op(1, "BatchNorm2d", "features.1", &[1], &[2]),
            make_seen_op(2, "ReLU", "features.2", &[2], &[3]),
        ]);
        let catalog = PatternCatalog::new(vec![
            FusionPattern::from(CONV2D_BN_RELU),
            FusionPattern::from(CONV2D_RELU),
            FusionPattern::from(CONV2D_BN),
        ])
        .unwrap();

        let groups = find_fusion_groups(&root, &catalog);
        assert_eq!(
            groups,
            vec![
                FusionGroup::from(vec!["features.0", "features.1", "features.2"]),
                FusionGroup::from(vec!["features.0", "features.1"]),
            ]
        );
    }

    #[test]
    fn test_modules_scanned_in_pre_order() {
        let inner = module_with(vec![
            make_seen_op(0, "Linear", "outer.inner.fc", &[0], &[1]),
            make_seen_op(1, "ReLU", "outer.inner.act", &[1], &[2]),
        ]);
        let outer = module_with(vec![
            make_seen_op(0, "Conv2d", "outer.conv", &[0], &[1]),
            make_seen_op(1, "ReLU", "outer.act", &[1], &[2]),
        ])
        .with_child("inner", inner)
        .unwrap();
        let root = Module::new().with_child("outer", outer).unwrap();

        let fqns = get_module_fusion_fqns(&root);
        assert_eq!(
            fqns,
            vec![
                vec!["outer.conv", "outer.act"],
                vec!["outer.inner.fc", "outer.inner.act"],
            ]
        );
    }

    #[test]
    fn test_leading_type_index_tries_fewer_patterns() {
        let root = module_with(vec![
            make_seen_op(0, "Linear", "fc", &[0], &[1]),
            make_seen_op(1, "ReLU", "act", &[1], &[2]),
        ]);
        let catalog = PatternCatalog::default();

        let mut indexed = FusionFinder::new(&catalog);
        let mut brute = FusionFinder::new(&catalog).with_config(MatchConfig::brute_force());

        assert_eq!(
            indexed.find(&root).to_fqn_lists(),
            brute.find(&root).to_fqn_lists()
        );
        assert_eq!(brute.stats().patterns_tried, 2 * catalog.len());
        assert_eq!(indexed.stats().patterns_tried, 2);
    }

    #[test]
    fn test_stats_reset_between_calls() {
        let root = module_with(vec![make_seen_op(0, "Linear", "fc", &[0], &[1])]);
        let catalog = PatternCatalog::from_names(&[&["Linear"]]).unwrap();
        let mut finder = FusionFinder::new(&catalog);

        finder.find(&root);
        finder.find(&root);
        assert_eq!(finder.stats().groups_found, 1);
        assert_eq!(finder.stats().ops_scanned, 1);
    }

    #[test]
    fn test_match_config_serde() {
        let config: MatchConfig = serde_json::from_str(r#"{"consumer_index": "linear_scan"}"#).unwrap();
        assert_eq!(config.consumer_index, ConsumerIndex::LinearScan);
        assert!(config.index_leading_types);
    }

    const OP_TYPES: &[&str] = &["Conv2d", "BatchNorm2d", "ReLU", "Linear"];

    fn arb_trace() -> impl Strategy<Value = AutoQuantState> {
        prop::collection::vec(
            (
                0..OP_TYPES.len(),
                0..4usize,
                any::<prop::sample::Index>(),
                any::<bool>(),
            ),
            1..12,
        )
        .prop_map(|specs| {
            let ops = specs
                .into_iter()
                .enumerate()
                .map(|(i, (t, f, src, reads_input))| {
                    // Tensor 0 is the trace input, tensor k is op k-1's output
                    let mut inputs = vec![src.index(i + 1) as u64];
                    if reads_input {
                        inputs.push(0);
                    }
                    make_seen_op(i, OP_TYPES[t], &format!("m.op{}", f), &inputs, &[i as u64 + 1])
                });
            AutoQuantState::from_ops(ops).unwrap()
        })
    }

    fn arb_tree() -> impl Strategy<Value = Module> {
        prop::collection::vec(prop::option::of(arb_trace()), 1..4).prop_map(|states| {
            let mut root = Module::new();
            for (i, state) in states.into_iter().enumerate() {
                let mut child = Module::new();
                if let Some(state) = state {
                    child.set_state(state);
                }
                root.add_child(&format!("block{}", i), child).unwrap();
            }
            root
        })
    }

    proptest! {
        #[test]
        fn prop_all_configs_match_reference(root in arb_tree()) {
            let catalog = PatternCatalog::default();
            let expected = reference_groups(&root, &catalog);

            for config in all_configs() {
                let groups = FusionFinder::new(&catalog).with_config(config).find(&root);
                prop_assert_eq!(groups.to_fqn_lists(), expected.clone());
            }
        }

        #[test]
        fn prop_results_distinct_and_pattern_sized(root in arb_tree()) {
            let catalog = PatternCatalog::default();
            let groups = find_fusion_groups(&root, &catalog);

            let distinct: std::collections::HashSet<_> = groups.iter().collect();
            prop_assert_eq!(distinct.len(), groups.len());

            let lengths: Vec<_> = catalog.patterns().iter().map(FusionPattern::len).collect();
            for group in &groups {
                prop_assert!(lengths.contains(&group.len()));
            }
        }

        #[test]
        fn prop_deterministic(root in arb_tree()) {
            let catalog = PatternCatalog::default();
            prop_assert_eq!(
                find_fusion_groups(&root, &catalog),
                find_fusion_groups(&root, &catalog)
            );
        }
    }
}
