//! # Autoquant Fusion
//!
//! Fusion pattern matcher for automatic quantization.
//!
//! Given a module tree whose modules carry traces of the ops they ran, this
//! crate finds linear chains of submodules (Conv → BatchNorm → ReLU and the
//! like) that match known fusion patterns, and returns the fully-qualified
//! names of each chain for a separate fusion pass.
//!
//! ## Features
//!
//! - **Pattern Matching**: Forward matching along single-consumer edges
//! - **Deduplication**: Each distinct FQN chain is reported once, in discovery order
//! - **JSON I/O**: Load traced module trees and catalogs, save results
//!
//! ## Example
//!
//! ```ignore
//! use autoquant_fusion::prelude::*;
//!
//! let model = load_module_tree("traced_model.json")?;
//! let groups = find_fusion_groups(&model, &PatternCatalog::default());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod fusion;
pub mod graph;
pub mod io;
pub mod module;
pub mod pattern;
pub mod trace;
pub mod traits;

// Python bindings (only with python feature)
#[cfg(feature = "python")]
pub mod python;

/// Prelude module - import commonly used types with `use autoquant_fusion::prelude::*`
pub mod prelude {
    pub use crate::error::{FusionError, FusionResult};
    pub use crate::fusion::{
        find_fusion_groups, get_module_fusion_fqns, ConsumerIndex, FusionFinder, FusionGroup,
        FusionGroups, MatchConfig, MatchStats,
    };
    pub use crate::graph::{get_users_of_seen_op, LinearScan, TraceGraph};
    pub use crate::io::{load_module_tree, load_pattern_catalog, save_fusion_groups};
    pub use crate::module::Module;
    pub use crate::pattern::{FusionPattern, PatternBuilder, PatternCatalog, PatternMatcher};
    pub use crate::trace::{make_seen_op, AutoQuantState, OpType, SeenOp, TensorId};
    pub use crate::traits::ConsumerLookup;
}

pub use error::{FusionError, FusionResult};
pub use fusion::{find_fusion_groups, FusionGroup};
pub use traits::ConsumerLookup;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
