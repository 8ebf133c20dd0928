use std::path::PathBuf;

use anyhow::{Context, Result};
use mapforge::{Adjacency, BoundaryData, MapConfig};

use crate::cli::{Cli, GenerateArgs};

/// Configuration file (or defaults) with command line overrides applied.
fn load_config(args: &GenerateArgs) -> Result<MapConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("[generate] cannot read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("[generate] invalid config {}", path.display()))?
        }
        None => MapConfig::default(),
    };

    if let Some(name) = &args.name { config.name = name.clone() }
    if let Some(level) = args.territory_level { config.territory_level = Some(level) }
    if let Some(levels) = &args.bonus_levels { config.bonus_levels = levels.clone() }
    if let Some(width) = args.width { config.width = width }
    if let Some(height) = args.height { config.height = height }
    if let Some(tolerance) = args.compression { config.compression_tolerance = tolerance }
    if let Some(tolerance) = args.filter { config.filter_tolerance = tolerance }
    if args.rook { config.adjacency = Adjacency::Rook }
    Ok(config)
}

pub fn run(cli: &Cli, args: &GenerateArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or_else(|| PathBuf::from("./map.json"));
    let config = load_config(args)?;

    tracing::info!(input = %args.input.display(), "reading boundaries");
    let data = BoundaryData::read_from_json(&args.input)?;

    let (map, summary) = mapforge::run(&config, data)?;

    tracing::info!(output = %out_path.display(), "writing map");
    map.write_json(&out_path)?;

    eprintln!(
        "[generate] {}: {} territories, {} bonuses, {} super bonuses on a {}x{} canvas",
        map.name, summary.territories, summary.bonuses, summary.super_bonuses, summary.width, summary.height,
    );
    if cli.verbose > 0 {
        eprintln!(
            "[generate] level {}, nodes {} -> {}, {} islands, {} connections, {} ungrouped",
            summary.territory_level, summary.compression.nodes_before, summary.compression.nodes_after,
            summary.components, summary.edges, summary.ungrouped_territories,
        );
        if let Some(filter) = &summary.filter {
            eprintln!("[generate] filter removed {} islands and {} emptied containers ({} -> {} areas)",
                filter.components_removed, filter.containers_removed, filter.areas_before, filter.areas_after);
        }
    }
    Ok(())
}
