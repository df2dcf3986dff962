//! Traced operation data
//!
//! - [`SeenOp`]: one traced op invocation
//! - [`AutoQuantState`]: the ordered trace owned by one module
//!
//! These are produced by an external tracing pass; this crate only reads them.

pub mod op;
pub mod state;

pub use op::{make_seen_op, OpType, SeenOp, TensorId};
pub use state::AutoQuantState;
