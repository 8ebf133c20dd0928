use std::path::PathBuf;

/// Game map generator (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "mapforge", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build a map from assembled boundary data
    Generate(GenerateArgs),

    /// Print the level histogram of a boundary file
    Levels(LevelsArgs),
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Boundary handoff document (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Map configuration (JSON); command line flags override its values
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Output map file, defaults to "./map.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Map name
    #[arg(long)]
    pub name: Option<String>,

    /// Level whose boundaries become territories
    #[arg(short, long)]
    pub territory_level: Option<u8>,

    /// Levels whose boundaries group territories (at most two)
    #[arg(short, long, value_delimiter = ',')]
    pub bonus_levels: Option<Vec<u8>>,

    /// Canvas width, 0 derives it from the height
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height, 0 derives it from the width
    #[arg(long)]
    pub height: Option<u32>,

    /// Douglas-Peucker tolerance in source units
    #[arg(long)]
    pub compression: Option<f64>,

    /// Minimum share of the total territory area an island must reach
    #[arg(long)]
    pub filter: Option<f64>,

    /// Require a shared boundary segment instead of a shared node for neighbours
    #[arg(long)]
    pub rook: bool,
}

#[derive(clap::Args, Debug)]
pub struct LevelsArgs {
    /// Boundary handoff document (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,
}
