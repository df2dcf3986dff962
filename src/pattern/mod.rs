//! Pattern matching module for operation traces
//!
//! This module provides tools for identifying fusable chains in a trace.
//!
//! # Overview
//!
//! The pattern matching system works by:
//! 1. Defining patterns as sequences of op types
//! 2. Matching patterns in forward order (producer → consumer)
//! 3. Following an edge only when the op has exactly one consumer
//!
//! # Example
//!
//! ```ignore
//! use autoquant_fusion::graph::TraceGraph;
//! use autoquant_fusion::pattern::{PatternMatcher, FusionPattern, CONV2D_BN};
//!
//! let graph = TraceGraph::new(&state);
//! let matcher = PatternMatcher::new(&graph);
//!
//! for m in matcher.find_all_matches(state.seen_ops(), &FusionPattern::from(CONV2D_BN)) {
//!     // m.ops[0] = Conv2d (chain start)
//!     // m.ops[1] = BatchNorm2d (its sole consumer)
//!     println!("Found fusible pair: {} -> {}", m.ops[0].fqn, m.ops[1].fqn);
//! }
//! ```
//!
//! # Traversal
//!
//! ```ignore
//! use autoquant_fusion::pattern::traversal::linear_chains;
//!
//! for chain in linear_chains(&graph) {
//!     println!("{} ops", chain.len());
//! }
//! ```

pub mod matcher;
pub mod ops;
pub mod traversal;

// Re-export main types
pub use matcher::{matcher, MatchResult, PatternMatcher};
pub use ops::{default_fusion_patterns, FusionPattern, PatternBuilder, PatternCatalog};
pub use traversal::{chain_heads, linear_chain, linear_chains, ChainIterator};

// Re-export common op types and patterns
pub use ops::{
    BATCH_NORM1D, BATCH_NORM2D, BATCH_NORM3D, BN2D_RELU, BN3D_RELU, CONV1D, CONV1D_BN,
    CONV1D_BN_RELU, CONV1D_RELU, CONV2D, CONV2D_BN, CONV2D_BN_RELU, CONV2D_RELU, CONV3D, CONV3D_BN,
    CONV3D_BN_RELU, CONV3D_RELU, DEFAULT_PATTERNS, LINEAR, LINEAR_BN, LINEAR_RELU, RELU,
};
