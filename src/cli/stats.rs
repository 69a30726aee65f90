//! Stats subcommand - node counts and progression snapshot.

use std::sync::Arc;

use crate::config::Config;
use crate::loader::DataLoader;
use crate::models::PlayerState;

/// Run the stats command.
pub async fn run() -> color_eyre::Result<()> {
    let config = Arc::new(Config::load()?);
    let report = DataLoader::new(config.clone()).load_or_fallback().await;
    let atlas = &report.atlas;

    println!("Nodes by dimension:");
    for (dimension, count) in atlas.dimension_counts() {
        match dimension {
            Some(dimension) => println!("  {:>4}  {}", dimension.to_string(), count),
            None => println!("  none  {}", count),
        }
    }

    println!("Sources:");
    for source in atlas.sources() {
        let nodes = atlas.nodes_in_source(&source.file).count();
        match source.dimension {
            Some(dimension) => println!("  {} ({}) - {} nodes", source.file, dimension, nodes),
            None => println!("  {} - {} nodes", source.file, nodes),
        }
    }

    let player = PlayerState::new(config.data.entry_node.clone());
    println!(
        "Fresh session: clearance {}D, {} unlocked, gating {}",
        player.clearance_level,
        player.unlocked_nodes.len(),
        if config.progression.gating_enabled {
            "on"
        } else {
            "off"
        }
    );

    Ok(())
}
