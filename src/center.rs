use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

use geo::{BoundingRect, Coord, MultiPolygon, Polygon};

use crate::geom::{boundary_distance, point_in_polygon, polygon_area, polygon_centroid, Location};

/// Lower bound of the logistic precision factor.
pub const PRECISION_MIN: f64 = 1e-4;

/// Steepness of the logistic precision curve.
pub const PRECISION_STEEPNESS: f64 = 25.0;

/// Precision of a shape covering the whole map, relative to its linear size.
pub const PRECISION_SCALE: f64 = 0.05;

/// Polygons with more vertices than this get a pole-of-inaccessibility search.
pub const SIMPLE_VERTEX_LIMIT: usize = 16;

/// Logistic factor in `[PRECISION_MIN, 1]` growing with the share of the total area.
pub fn precision_factor(area: f64, total: f64) -> f64 {
    if total <= 0.0 { return 1.0 }
    let factor = 1.0 / (1.0 + (-PRECISION_STEEPNESS * area / total).exp() * (1.0 / PRECISION_MIN - 1.0));
    factor.clamp(PRECISION_MIN, 1.0)
}

/// Search precision (a distance) for a shape of `area` on a map of `total` area.
///
/// Proportional to the shape's linear size, tightened for shapes that are
/// small relative to the map. The logistic factor scales `sqrt(area)`, not
/// `area`, so the result is a length in map units.
pub fn precision(area: f64, total: f64) -> f64 {
    area.max(0.0).sqrt() * PRECISION_SCALE * precision_factor(area, total)
}

/// Distance to the boundary, positive inside, negative outside.
pub fn signed_distance(p: Coord<f64>, polygon: &Polygon<f64>) -> f64 {
    let d = boundary_distance(p, polygon);
    match point_in_polygon(p, polygon) {
        Location::Inside => d,
        Location::Outside => -d,
        Location::Boundary => 0.0,
    }
}

#[derive(Clone, Copy, Debug)]
struct Cell {
    center: Coord<f64>,
    half: f64,
    /// Signed distance from the center to the polygon boundary.
    distance: f64,
    /// Upper bound of the distance reachable within the cell.
    max: f64,
}

impl Cell {
    fn new(center: Coord<f64>, half: f64, polygon: &Polygon<f64>) -> Self {
        let distance = signed_distance(center, polygon);
        Self { center, half, distance, max: distance + half * SQRT_2 }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool { self.max.total_cmp(&other.max) == Ordering::Equal }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering { self.max.total_cmp(&other.max) }
}

/// Approximate pole of inaccessibility: the interior point farthest from the
/// boundary, found to within `precision`.
///
/// Returns the point and its distance to the boundary, or `None` for empty or
/// zero-extent polygons.
pub fn pole_of_inaccessibility(polygon: &Polygon<f64>, precision: f64) -> Option<(Coord<f64>, f64)> {
    let bounds = polygon.exterior().bounding_rect()?;
    let cell_size = bounds.width().min(bounds.height());
    if !(cell_size > 0.0) { return None }
    let half = cell_size / 2.0;
    let precision = precision.max(cell_size * 1e-9);

    let mut queue = BinaryHeap::new();
    let mut y = bounds.min().y;
    while y < bounds.max().y {
        let mut x = bounds.min().x;
        while x < bounds.max().x {
            queue.push(Cell::new(Coord { x: x + half, y: y + half }, half, polygon));
            x += cell_size;
        }
        y += cell_size;
    }

    let mut best = Cell::new(bounds.center(), 0.0, polygon);
    if let Some(centroid) = polygon_centroid(polygon) {
        let candidate = Cell::new(centroid, 0.0, polygon);
        if candidate.distance > best.distance { best = candidate }
    }

    while let Some(cell) = queue.pop() {
        if cell.distance > best.distance { best = cell }
        if cell.max - best.distance <= precision { continue }

        let h = cell.half / 2.0;
        for (dx, dy) in [(-h, -h), (h, -h), (-h, h), (h, h)] {
            queue.push(Cell::new(Coord { x: cell.center.x + dx, y: cell.center.y + dy }, h, polygon));
        }
    }

    Some((best.center, best.distance))
}

/// Which strategy produced a center.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CenterMethod {
    Centroid,
    Pole,
}

/// Representative points for map labels and army markers.
#[derive(Clone, Copy, Debug)]
pub struct CenterCalculator {
    total_area: f64,
}

impl CenterCalculator {
    /// `total_area` is the area of the whole map in the same units as the shapes.
    pub fn new(total_area: f64) -> Self { Self { total_area } }

    /// Center of one polygon.
    ///
    /// Small simple polygons whose centroid lies inside use the centroid;
    /// everything else runs the pole-of-inaccessibility search.
    pub fn polygon_center(&self, polygon: &Polygon<f64>) -> Option<(Coord<f64>, CenterMethod)> {
        let centroid = polygon_centroid(polygon)?;
        let simple = polygon.interiors().is_empty()
            && polygon.exterior().0.len() <= SIMPLE_VERTEX_LIMIT + 1
            && point_in_polygon(centroid, polygon) == Location::Inside;
        if simple { return Some((centroid, CenterMethod::Centroid)) }

        let precision = precision(polygon_area(polygon), self.total_area);
        match pole_of_inaccessibility(polygon, precision) {
            Some((pole, d)) if d > 0.0 => Some((pole, CenterMethod::Pole)),
            _ => Some((centroid, CenterMethod::Centroid)),
        }
    }

    /// Center of a multipolygon: the center of its largest exclave.
    pub fn center(&self, shape: &MultiPolygon<f64>) -> Option<Coord<f64>> {
        let largest = shape.0.iter().max_by(|a, b| polygon_area(a).total_cmp(&polygon_area(b)))?;
        self.polygon_center(largest).map(|(c, _)| c)
    }
}
