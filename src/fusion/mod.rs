//! Fusion group discovery
//!
//! - [`FusionFinder`]: scans a module tree with a pattern catalog
//! - [`FusionGroup`] / [`FusionGroups`]: the deduplicated, ordered result
//!
//! Nothing here modifies the tree; the groups are meant for a separate pass
//! that fuses the named modules.
//!
//! # Example
//!
//! ```ignore
//! use autoquant_fusion::fusion::find_fusion_groups;
//! use autoquant_fusion::pattern::PatternCatalog;
//!
//! for group in find_fusion_groups(&model, &PatternCatalog::default()) {
//!     println!("fuse {}", group);
//! }
//! ```

pub mod finder;
pub mod group;

pub use finder::{
    find_fusion_groups, get_module_fusion_fqns, ConsumerIndex, FusionFinder, MatchConfig,
    MatchStats,
};
pub use group::{FusionGroup, FusionGroups};
