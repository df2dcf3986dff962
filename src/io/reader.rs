//! JSON readers
//!
//! Load module trees and pattern catalogs from files or strings.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::FusionResult;
use crate::module::Module;
use crate::pattern::PatternCatalog;

/// Load a module tree from a JSON file
///
/// # Example
///
/// ```ignore
/// use autoquant_fusion::io::load_module_tree;
///
/// let model = load_module_tree("traced_model.json")?;
/// println!("{} modules", model.named_modules().count());
/// ```
pub fn load_module_tree<P: AsRef<Path>>(path: P) -> FusionResult<Module> {
    let module: Module = read_json(path.as_ref())?;
    module.validate_names()?;
    Ok(module)
}

/// Parse a module tree from a JSON string
///
/// ```ignore
/// let model = module_tree_from_str(r#"{
///     "children": {
///         "conv": {"type": "Conv2d"}
///     },
///     "auto_quant_state": [
///         {"idx": 0, "type": "Conv2d", "fqn": "conv", "input_tensor_ids": [0], "output_tensor_ids": [1]}
///     ]
/// }"#)?;
/// ```
pub fn module_tree_from_str(json: &str) -> FusionResult<Module> {
    let module: Module = serde_json::from_str(json)?;
    module.validate_names()?;
    Ok(module)
}

/// Load a pattern catalog (a JSON list of lists of op types) from a file
pub fn load_pattern_catalog<P: AsRef<Path>>(path: P) -> FusionResult<PatternCatalog> {
    read_json(path.as_ref())
}

/// Parse a pattern catalog from a JSON string
pub fn pattern_catalog_from_str(json: &str) -> FusionResult<PatternCatalog> {
    Ok(serde_json::from_str(json)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> FusionResult<T> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
