use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Lowest and highest administrative level accepted.
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 12;

/// At most this many levels may group territories.
pub const MAX_BONUS_LEVELS: usize = 2;

/// Which shared boundary makes two areas neighbours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Any shared boundary node.
    #[default]
    Queen,
    /// A shared boundary segment (two consecutive nodes).
    Rook,
}

/// Spherical to planar projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ProjectionKind {
    #[default]
    Mercator,
    /// Lambert cylindrical equal-area with the given standard parallel in degrees.
    CylindricalEqualArea { standard_parallel: f64 },
}

/// Bonus army scoring parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmyConfig {
    pub min: u32,
    pub max: u32,
    /// Weight of the number of territories in the bonus.
    pub territory_weight: f64,
    /// Weight of the number of outside territories bordering the bonus.
    pub connection_weight: f64,
}

impl Default for ArmyConfig {
    fn default() -> Self { Self { min: 1, max: 10, territory_weight: 0.5, connection_weight: 0.5 } }
}

/// Parameters of one map generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub name: String,
    /// Level whose areas become territories; `None` picks the most frequent level.
    pub territory_level: Option<u8>,
    /// Levels whose areas group territories, outermost last.
    pub bonus_levels: Vec<u8>,
    /// Canvas width; `0` derives it from the height.
    pub width: u32,
    /// Canvas height; `0` derives it from the width.
    pub height: u32,
    /// Douglas-Peucker tolerance in source units, `0` disables simplification.
    pub compression_tolerance: f64,
    /// Minimum share of total territory area an island must reach, `0` disables filtering.
    pub filter_tolerance: f64,
    pub adjacency: Adjacency,
    pub projection: ProjectionKind,
    /// Central meridian in degrees.
    pub central_meridian: f64,
    /// Flip the y axis so north is up in screen coordinates.
    pub mirror_y: bool,
    pub armies: ArmyConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            name: "map".to_string(),
            territory_level: None,
            bonus_levels: Vec::new(),
            width: 1000,
            height: 0,
            compression_tolerance: 0.0,
            filter_tolerance: 0.0,
            adjacency: Adjacency::default(),
            projection: ProjectionKind::default(),
            central_meridian: 0.0,
            mirror_y: false,
            armies: ArmyConfig::default(),
        }
    }
}

fn check_level(level: u8, what: &str) -> Result<()> {
    ensure!((MIN_LEVEL..=MAX_LEVEL).contains(&level),
        "[MapConfig.validate] {what} {level} outside {MIN_LEVEL}..={MAX_LEVEL}");
    Ok(())
}

impl MapConfig {
    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.name.trim().is_empty(), "[MapConfig.validate] name must not be empty");

        ensure!(self.width > 0 || self.height > 0,
            "[MapConfig.validate] width and height cannot both be 0");

        ensure!(self.compression_tolerance.is_finite() && self.compression_tolerance >= 0.0,
            "[MapConfig.validate] compression_tolerance must be finite and >= 0, got {}", self.compression_tolerance);
        ensure!(self.filter_tolerance.is_finite() && (0.0..1.0).contains(&self.filter_tolerance),
            "[MapConfig.validate] filter_tolerance must lie in [0, 1), got {}", self.filter_tolerance);
        ensure!(self.central_meridian.is_finite() && self.central_meridian.abs() <= 180.0,
            "[MapConfig.validate] central_meridian must lie in [-180, 180], got {}", self.central_meridian);

        if let ProjectionKind::CylindricalEqualArea { standard_parallel } = self.projection {
            ensure!(standard_parallel.is_finite() && standard_parallel.abs() < 90.0,
                "[MapConfig.validate] standard_parallel must lie in (-90, 90), got {standard_parallel}");
        }

        ensure!(self.bonus_levels.len() <= MAX_BONUS_LEVELS,
            "[MapConfig.validate] at most {MAX_BONUS_LEVELS} bonus levels, got {}", self.bonus_levels.len());
        for &level in &self.bonus_levels { check_level(level, "bonus level")? }
        ensure!(self.bonus_levels.windows(2).all(|w| w[0] != w[1]),
            "[MapConfig.validate] bonus levels must be distinct");

        match self.territory_level {
            Some(territory) => {
                check_level(territory, "territory level")?;
                for &level in &self.bonus_levels {
                    ensure!(level < territory,
                        "[MapConfig.validate] bonus level {level} must be below territory level {territory}");
                }
            }
            None => ensure!(self.bonus_levels.is_empty(),
                "[MapConfig.validate] bonus levels require an explicit territory level"),
        }

        let armies = &self.armies;
        ensure!(armies.min <= armies.max,
            "[MapConfig.validate] armies.min {} exceeds armies.max {}", armies.min, armies.max);
        ensure!(armies.territory_weight >= 0.0 && armies.connection_weight >= 0.0
            && armies.territory_weight.is_finite() && armies.connection_weight.is_finite(),
            "[MapConfig.validate] army weights must be finite and >= 0");

        Ok(())
    }

    /// Bonus levels ordered from the level just above territories outwards.
    pub fn bonus_levels_inner_first(&self) -> Vec<u8> {
        let mut levels = self.bonus_levels.clone();
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels
    }

    #[inline] pub fn filters(&self) -> bool { self.filter_tolerance > 0.0 }
}
