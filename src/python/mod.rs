//! Python bindings for autoquant-fusion using PyO3
//!
//! The tracing side serializes its module tree (with per-module traces) to
//! JSON; this module hands back the fusion groups as lists of FQNs.
//!
//! # Usage from Python
//!
//! ```python
//! import autoquant_fusion
//!
//! groups = autoquant_fusion.find_fusion_groups(tree_json)
//! torch.ao.quantization.fuse_modules(model, groups, inplace=True)
//!
//! # Custom catalog and configuration
//! config = autoquant_fusion.MatchConfig(index_leading_types=False, linear_scan=True)
//! groups = autoquant_fusion.find_fusion_groups(
//!     tree_json, [["Linear", "ReLU"]], config
//! )
//! ```

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::FusionError;
use crate::fusion::{ConsumerIndex, FusionFinder, MatchConfig};
use crate::io::module_tree_from_str;
use crate::pattern::{FusionPattern, PatternCatalog};

// ============================================================================
// Python-exposed configuration class
// ============================================================================

/// Configuration for the fusion scan.
///
/// Every setting returns the same groups; they only trade memory for time.
#[pyclass(name = "MatchConfig")]
#[derive(Clone, Debug)]
pub struct PyMatchConfig {
    /// Only try patterns whose first type equals the op's type
    #[pyo3(get, set)]
    pub index_leading_types: bool,

    /// Rescan the trace for every consumer query instead of indexing it
    #[pyo3(get, set)]
    pub linear_scan: bool,
}

#[pymethods]
impl PyMatchConfig {
    #[new]
    #[pyo3(signature = (index_leading_types = true, linear_scan = false))]
    fn new(index_leading_types: bool, linear_scan: bool) -> Self {
        Self {
            index_leading_types,
            linear_scan,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "MatchConfig(index_leading_types={}, linear_scan={})",
            py_bool(self.index_leading_types),
            py_bool(self.linear_scan)
        )
    }
}

impl Default for PyMatchConfig {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl From<&PyMatchConfig> for MatchConfig {
    fn from(config: &PyMatchConfig) -> Self {
        Self {
            consumer_index: if config.linear_scan {
                ConsumerIndex::LinearScan
            } else {
                ConsumerIndex::Precomputed
            },
            index_leading_types: config.index_leading_types,
        }
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn to_py_err(err: FusionError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn catalog_from_lists(patterns: Option<Vec<Vec<String>>>) -> Result<PatternCatalog, FusionError> {
    match patterns {
        Some(lists) => PatternCatalog::new(lists.into_iter().map(FusionPattern::new).collect()),
        None => Ok(PatternCatalog::default()),
    }
}

// ============================================================================
// Python-exposed functions
// ============================================================================

/// Find fusable module chains.
///
/// Args:
///     tree_json: Module tree with per-module traces, as JSON
///     patterns: List of op-type lists; the stock catalog when omitted
///     config: Optional MatchConfig
///
/// Returns:
///     List of FQN lists, one per fusion group
#[pyfunction]
#[pyo3(signature = (tree_json, patterns = None, config = None))]
fn find_fusion_groups(
    tree_json: &str,
    patterns: Option<Vec<Vec<String>>>,
    config: Option<PyMatchConfig>,
) -> PyResult<Vec<Vec<String>>> {
    let tree = module_tree_from_str(tree_json).map_err(to_py_err)?;
    let catalog = catalog_from_lists(patterns).map_err(to_py_err)?;
    let config = config.unwrap_or_default();

    let groups = FusionFinder::new(&catalog)
        .with_config(MatchConfig::from(&config))
        .find(&tree);
    Ok(groups.to_fqn_lists())
}

/// The stock fusion patterns as lists of op-type names.
#[pyfunction]
fn default_patterns() -> Vec<Vec<String>> {
    PatternCatalog::default()
        .patterns()
        .iter()
        .map(|p| p.types().iter().map(|t| t.to_string()).collect())
        .collect()
}

/// Get the version of this library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// Module registration
// ============================================================================

/// Python module for fusion pattern discovery.
#[pymodule]
#[pyo3(name = "autoquant_fusion")]
fn autoquant_fusion_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<PyMatchConfig>()?;

    // Functions
    m.add_function(wrap_pyfunction!(find_fusion_groups, m)?)?;
    m.add_function(wrap_pyfunction!(default_patterns, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
