use anyhow::Result;
use mapforge::BoundaryData;

use crate::cli::{Cli, LevelsArgs};

pub fn run(_cli: &Cli, args: &LevelsArgs) -> Result<()> {
    let data = BoundaryData::read_from_json(&args.input)?;
    let counts = data.level_counts();
    let detected = data.detect_territory_level();

    for (level, count) in &counts {
        let marker = if Some(*level) == detected { "  <- territories" } else { "" };
        println!("{level:>3} {count:>8}{marker}");
    }
    if data.incomplete_relations > 0 {
        println!("incomplete relations: {}", data.incomplete_relations);
    }
    Ok(())
}
