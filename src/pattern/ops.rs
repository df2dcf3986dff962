//! Fusion patterns and the pattern catalog
//!
//! Pre-defined op types and patterns for the stock module fusions.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{FusionError, FusionResult};
use crate::trace::OpType;

/// `torch.nn.Conv1d`
pub const CONV1D: OpType = OpType::from_static("Conv1d");
/// `torch.nn.Conv2d`
pub const CONV2D: OpType = OpType::from_static("Conv2d");
/// `torch.nn.Conv3d`
pub const CONV3D: OpType = OpType::from_static("Conv3d");
/// `torch.nn.BatchNorm1d`
pub const BATCH_NORM1D: OpType = OpType::from_static("BatchNorm1d");
/// `torch.nn.BatchNorm2d`
pub const BATCH_NORM2D: OpType = OpType::from_static("BatchNorm2d");
/// `torch.nn.BatchNorm3d`
pub const BATCH_NORM3D: OpType = OpType::from_static("BatchNorm3d");
/// `torch.nn.ReLU`
pub const RELU: OpType = OpType::from_static("ReLU");
/// `torch.nn.Linear`
pub const LINEAR: OpType = OpType::from_static("Linear");

/// Conv1d → BatchNorm1d → ReLU
pub const CONV1D_BN_RELU: &[OpType] = &[CONV1D, BATCH_NORM1D, RELU];
/// Conv1d → BatchNorm1d
pub const CONV1D_BN: &[OpType] = &[CONV1D, BATCH_NORM1D];
/// Conv1d → ReLU
pub const CONV1D_RELU: &[OpType] = &[CONV1D, RELU];

/// Conv2d → BatchNorm2d → ReLU
pub const CONV2D_BN_RELU: &[OpType] = &[CONV2D, BATCH_NORM2D, RELU];
/// Conv2d → BatchNorm2d
pub const CONV2D_BN: &[OpType] = &[CONV2D, BATCH_NORM2D];
/// Conv2d → ReLU
pub const CONV2D_RELU: &[OpType] = &[CONV2D, RELU];

/// Conv3d → BatchNorm3d → ReLU
pub const CONV3D_BN_RELU: &[OpType] = &[CONV3D, BATCH_NORM3D, RELU];
/// Conv3d → BatchNorm3d
pub const CONV3D_BN: &[OpType] = &[CONV3D, BATCH_NORM3D];
/// Conv3d → ReLU
pub const CONV3D_RELU: &[OpType] = &[CONV3D, RELU];

/// Linear → BatchNorm1d
pub const LINEAR_BN: &[OpType] = &[LINEAR, BATCH_NORM1D];
/// Linear → ReLU
pub const LINEAR_RELU: &[OpType] = &[LINEAR, RELU];

/// BatchNorm2d → ReLU
pub const BN2D_RELU: &[OpType] = &[BATCH_NORM2D, RELU];
/// BatchNorm3d → ReLU
pub const BN3D_RELU: &[OpType] = &[BATCH_NORM3D, RELU];

/// The stock catalog, longest patterns of each family first
pub const DEFAULT_PATTERNS: &[&[OpType]] = &[
    CONV1D_BN_RELU,
    CONV1D_BN,
    CONV1D_RELU,
    CONV2D_BN_RELU,
    CONV2D_BN,
    CONV2D_RELU,
    CONV3D_BN_RELU,
    CONV3D_BN,
    CONV3D_RELU,
    LINEAR_BN,
    LINEAR_RELU,
    BN2D_RELU,
    BN3D_RELU,
];

/// Ordered sequence of op types expected along a single-consumer chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusionPattern {
    types: SmallVec<[OpType; 4]>,
}

impl FusionPattern {
    /// Create a pattern from op types in chain order
    pub fn new<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OpType>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Op types in chain order
    pub fn types(&self) -> &[OpType] {
        &self.types
    }

    /// First op type of the chain
    pub fn leading_type(&self) -> Option<&OpType> {
        self.types.first()
    }

    /// Number of op types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl From<&[OpType]> for FusionPattern {
    fn from(types: &[OpType]) -> Self {
        Self::new(types.iter().cloned())
    }
}

impl std::fmt::Display for FusionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, t) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

/// Pattern builder for creating custom patterns
#[derive(Debug, Clone, Default)]
pub struct PatternBuilder {
    ops: Vec<OpType>,
}

impl PatternBuilder {
    /// Create a new pattern builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an op type to the pattern
    pub fn op(mut self, op_type: impl Into<OpType>) -> Self {
        self.ops.push(op_type.into());
        self
    }

    /// Add multiple op types
    pub fn ops(mut self, op_types: &[&str]) -> Self {
        self.ops.extend(op_types.iter().map(|&s| OpType::from(s)));
        self
    }

    /// Build the pattern
    pub fn build(self) -> FusionPattern {
        FusionPattern::new(self.ops)
    }
}

/// Validated, ordered list of fusion patterns
///
/// Keeps an index from leading op type to pattern positions so a matcher can
/// skip patterns that cannot start at a given op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<FusionPattern>", into = "Vec<FusionPattern>")]
pub struct PatternCatalog {
    patterns: Vec<FusionPattern>,
    by_leading_type: FxHashMap<OpType, SmallVec<[usize; 4]>>,
}

impl PatternCatalog {
    /// Create a catalog, rejecting an empty list or an empty pattern
    pub fn new(patterns: Vec<FusionPattern>) -> FusionResult<Self> {
        if patterns.is_empty() {
            return Err(FusionError::EmptyCatalog);
        }
        if let Some(index) = patterns.iter().position(FusionPattern::is_empty) {
            return Err(FusionError::EmptyPattern { index });
        }
        Ok(Self::indexed(patterns))
    }

    /// Create a catalog from string slices
    ///
    /// ```ignore
    /// let catalog = PatternCatalog::from_names(&[&["Conv2d", "ReLU"], &["Linear", "ReLU"]])?;
    /// ```
    pub fn from_names(patterns: &[&[&str]]) -> FusionResult<Self> {
        Self::new(
            patterns
                .iter()
                .map(|p| FusionPattern::new(p.iter().copied()))
                .collect(),
        )
    }

    fn indexed(patterns: Vec<FusionPattern>) -> Self {
        let mut by_leading_type: FxHashMap<OpType, SmallVec<[usize; 4]>> = FxHashMap::default();
        for (i, pattern) in patterns.iter().enumerate() {
            if let Some(lead) = pattern.leading_type() {
                by_leading_type.entry(lead.clone()).or_default().push(i);
            }
        }
        Self {
            patterns,
            by_leading_type,
        }
    }

    /// Patterns in catalog order
    pub fn patterns(&self) -> &[FusionPattern] {
        &self.patterns
    }

    /// Get pattern at index
    pub fn get(&self, index: usize) -> Option<&FusionPattern> {
        self.patterns.get(index)
    }

    /// Positions of the patterns starting with `op_type`, ascending
    pub fn positions_starting_with(&self, op_type: &OpType) -> &[usize] {
        self.by_leading_type
            .get(op_type)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    /// Number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if empty (never true for a validated catalog)
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Longest pattern length
    pub fn max_pattern_len(&self) -> usize {
        self.patterns.iter().map(FusionPattern::len).max().unwrap_or(0)
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::indexed(default_fusion_patterns())
    }
}

impl TryFrom<Vec<FusionPattern>> for PatternCatalog {
    type Error = FusionError;

    fn try_from(patterns: Vec<FusionPattern>) -> FusionResult<Self> {
        Self::new(patterns)
    }
}

impl From<PatternCatalog> for Vec<FusionPattern> {
    fn from(catalog: PatternCatalog) -> Self {
        catalog.patterns
    }
}

/// The stock module fusion patterns as owned values
pub fn default_fusion_patterns() -> Vec<FusionPattern> {
    DEFAULT_PATTERNS.iter().map(|&p| FusionPattern::from(p)).collect()
}
