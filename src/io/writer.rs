//! JSON writers for fusion results

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::FusionResult;
use crate::fusion::FusionGroups;

/// Serialize groups as a pretty-printed JSON list of FQN lists
pub fn fusion_groups_to_string(groups: &FusionGroups) -> FusionResult<String> {
    Ok(serde_json::to_string_pretty(groups)?)
}

/// Write groups to a JSON file
///
/// # Example
///
/// ```ignore
/// use autoquant_fusion::io::save_fusion_groups;
///
/// let groups = FusionFinder::new(&catalog).find(&model);
/// save_fusion_groups(&groups, "fusions.json")?;
/// ```
pub fn save_fusion_groups<P: AsRef<Path>>(groups: &FusionGroups, path: P) -> FusionResult<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, groups)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
