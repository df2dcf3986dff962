//! JSON I/O module
//!
//! This module provides functions for loading traced module trees and pattern
//! catalogs, and for writing fusion results.
//!
//! # Example
//!
//! ```ignore
//! use autoquant_fusion::io::{load_module_tree, save_fusion_groups};
//!
//! let model = load_module_tree("traced_model.json")?;
//! let groups = FusionFinder::new(&PatternCatalog::default()).find(&model);
//! save_fusion_groups(&groups, "fusions.json")?;
//! ```

pub mod reader;
pub mod writer;

// Re-exports
pub use reader::{
    load_module_tree, load_pattern_catalog, module_tree_from_str, pattern_catalog_from_str,
};
pub use writer::{fusion_groups_to_string, save_fusion_groups};
