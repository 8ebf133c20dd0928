use geo::{Coord, MultiPolygon, Rect};
use serde::Serialize;

/// Lowest-level playable region.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Territory {
    pub id: usize,
    /// Id of the boundary this territory was built from.
    pub source_id: u64,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub center: Coord<f64>,
    /// Ids of bordering territories, ascending.
    pub neighbors: Vec<usize>,
    /// Bonus holding this territory, if any.
    pub bonus: Option<usize>,
}

/// A group of territories worth extra armies when held together.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bonus {
    pub id: usize,
    pub source_id: u64,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub center: Coord<f64>,
    /// Envelope in canvas space.
    pub bounds: Rect<f64>,
    /// Ids of member territories, ascending.
    pub children: Vec<usize>,
    pub armies: u32,
    /// Super bonus holding this bonus, if any.
    pub super_bonus: Option<usize>,
}

/// A group of bonuses.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuperBonus {
    pub id: usize,
    pub source_id: u64,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub center: Coord<f64>,
    pub bounds: Rect<f64>,
    /// Ids of member bonuses, ascending.
    pub children: Vec<usize>,
    pub armies: u32,
}
