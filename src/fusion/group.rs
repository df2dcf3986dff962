//! Fusion group result types

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::pattern::MatchResult;

/// FQNs of the modules forming one fusable chain, in chain order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusionGroup(Vec<String>);

impl FusionGroup {
    /// Create a group from FQNs in chain order
    pub fn new(fqns: Vec<String>) -> Self {
        Self(fqns)
    }

    /// FQNs in chain order
    pub fn fqns(&self) -> &[String] {
        &self.0
    }

    /// Number of modules in the group
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take the FQN list
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<MatchResult<'_>> for FusionGroup {
    fn from(m: MatchResult<'_>) -> Self {
        Self(m.fqns())
    }
}

impl From<Vec<&str>> for FusionGroup {
    fn from(fqns: Vec<&str>) -> Self {
        Self(fqns.into_iter().map(String::from).collect())
    }
}

impl fmt::Display for FusionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Ordered collection of distinct fusion groups
///
/// Keeps the order in which groups were first inserted; re-inserting an equal
/// group is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FusionGroups {
    groups: IndexSet<FusionGroup>,
}

impl FusionGroups {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a group; returns `false` if an equal group is already present
    pub fn insert(&mut self, group: FusionGroup) -> bool {
        self.groups.insert(group)
    }

    /// Check if an equal group is present
    pub fn contains(&self, group: &FusionGroup) -> bool {
        self.groups.contains(group)
    }

    /// Iterate in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FusionGroup> {
        self.groups.iter()
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in first-insertion order
    pub fn into_vec(self) -> Vec<FusionGroup> {
        self.groups.into_iter().collect()
    }

    /// Groups as plain FQN lists, in first-insertion order
    pub fn to_fqn_lists(&self) -> Vec<Vec<String>> {
        self.groups.iter().map(|g| g.fqns().to_vec()).collect()
    }
}

impl IntoIterator for FusionGroups {
    type Item = FusionGroup;
    type IntoIter = indexmap::set::IntoIter<FusionGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl FromIterator<FusionGroup> for FusionGroups {
    fn from_iter<I: IntoIterator<Item = FusionGroup>>(iter: I) -> Self {
        Self {
            groups: iter.into_iter().collect(),
        }
    }
}
