//! Consumer graph over a single trace
//!
//! - [`TraceGraph`]: indexed view with O(1) tensor lookups
//! - [`get_users_of_seen_op`] / [`LinearScan`]: the scan-based consumer query
//! - [`maps`]: type definitions and builders for trace maps
//!
//! # Example
//!
//! ```ignore
//! use autoquant_fusion::graph::TraceGraph;
//! use autoquant_fusion::traits::ConsumerLookup;
//!
//! let graph = TraceGraph::new(&state);
//! for op in graph.ops() {
//!     println!("{} has {} users", op.fqn, graph.users_of(op).len());
//! }
//! ```
//!
//! # Maps
//!
//! | Map | Description |
//! |-----|-------------|
//! | `consumer_map` | tensor_id → positions of ops reading it |
//! | `producer_map` | tensor_id → positions of ops writing it |

pub mod context;
pub mod maps;
pub mod users;

pub use context::TraceGraph;
pub use maps::{ConsumerMap, ProducerMap};
pub use users::{get_users_of_seen_op, LinearScan};
