//! Route table output.

use super::load_context;
use anyhow::Result;
use std::path::Path;

pub fn print_paths(config_path: &Path, json: bool) -> Result<()> {
    let context = load_context(config_path)?;
    let paths = context.static_paths();

    if json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
    } else {
        for (route, target) in &paths {
            if route == target {
                println!("{}", route);
            } else {
                println!("{} -> {}", route, target);
            }
        }
    }
    Ok(())
}
