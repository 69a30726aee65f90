//! Validate subcommand - load the atlas and report what it contains.

use std::sync::Arc;

use crate::config::Config;
use crate::loader::DataLoader;

/// Run the validate command.
pub async fn run() -> color_eyre::Result<()> {
    let config = Arc::new(Config::load()?);
    let report = DataLoader::new(config.clone()).load().await?;
    let atlas = &report.atlas;

    println!(
        "Loaded {} nodes from {} sources ({} links)",
        atlas.len(),
        atlas.sources().len(),
        atlas.links().len()
    );

    if !atlas.contains(atlas.entry()) {
        println!("warning: entry node '{}' is not in the data", atlas.entry());
    }

    if report.warnings.is_empty() {
        println!("All forks validated");
    } else {
        for warning in &report.warnings {
            println!("warning: {}", warning);
        }
        println!("{} fork warnings", report.warnings.len());
    }

    Ok(())
}
