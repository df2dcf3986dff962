//! Seen operation records
//!
//! A [`SeenOp`] is one traced invocation: what kind of op ran, which module
//! produced it, and which tensors it read and wrote. Consumer edges are not
//! stored; they are recovered by matching output tensor ids against the
//! input tensor ids of other ops in the same trace.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Operation kind tag, compared by value
///
/// Usually the name of the module class (`"Conv2d"`) or of the function
/// (`"relu"`) that was traced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpType(Cow<'static, str>);

impl OpType {
    /// Create an op type from a static name (usable in `const` items)
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an op type from any string
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Name of the op type
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OpType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OpType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for OpType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl PartialEq<str> for OpType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for OpType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identifier of a traced tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TensorId(pub u64);

impl From<u64> for TensorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One traced operation invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenOp {
    /// Trace index of this op
    pub idx: usize,
    /// Op kind
    #[serde(rename = "type")]
    pub op_type: OpType,
    /// FQN of the module that produced this op
    pub fqn: String,
    /// Ids of the tensors this op reads
    #[serde(default)]
    pub input_tensor_ids: SmallVec<[TensorId; 4]>,
    /// Ids of the tensors this op writes
    #[serde(default)]
    pub output_tensor_ids: SmallVec<[TensorId; 2]>,
}

impl SeenOp {
    /// Create an op with no tensor edges
    pub fn new(idx: usize, op_type: impl Into<OpType>, fqn: impl Into<String>) -> Self {
        Self {
            idx,
            op_type: op_type.into(),
            fqn: fqn.into(),
            input_tensor_ids: SmallVec::new(),
            output_tensor_ids: SmallVec::new(),
        }
    }

    /// Set the input tensor ids
    pub fn with_inputs(mut self, ids: &[u64]) -> Self {
        self.input_tensor_ids = ids.iter().copied().map(TensorId).collect();
        self
    }

    /// Set the output tensor ids
    pub fn with_outputs(mut self, ids: &[u64]) -> Self {
        self.output_tensor_ids = ids.iter().copied().map(TensorId).collect();
        self
    }

    /// Whether this op reads any tensor written by `producer`
    pub fn consumes(&self, producer: &SeenOp) -> bool {
        self.input_tensor_ids
            .iter()
            .any(|t| producer.output_tensor_ids.contains(t))
    }
}

/// Shorthand for building a [`SeenOp`] with tensor edges
pub fn make_seen_op(
    idx: usize,
    op_type: &str,
    fqn: &str,
    inputs: &[u64],
    outputs: &[u64],
) -> SeenOp {
    SeenOp::new(idx, op_type, fqn)
        .with_inputs(inputs)
        .with_outputs(outputs)
}
