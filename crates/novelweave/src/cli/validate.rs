//! Script validation handler.

use super::files::{read_text, write_json};
use novelweave::{normalize_script_value, JsonError, NovelweaveConfig, NovelweaveResult};
use std::path::Path;

/// Re-run integrity repairs on a saved script and report what changed.
pub fn run_validate(script: &Path, output: Option<&Path>, config: &NovelweaveConfig) -> NovelweaveResult<()> {
    let text = read_text(script)?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| JsonError::new(e.to_string()))?;

    let (repaired, report) = normalize_script_value(&value, &config.generation.continue_label)?;

    println!(
        "{}: {} nodes, {} characters, {} scenes",
        repaired.title,
        repaired.nodes.len(),
        repaired.characters.len(),
        repaired.scenes.len()
    );
    if report.is_clean() {
        println!("No repairs needed");
    } else {
        println!("Repairs: {}", report);
    }

    if output.is_some() {
        write_json(&repaired, output)?;
    }
    Ok(())
}
