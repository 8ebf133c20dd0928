use geo::{BoundingRect, Coord, LineString, Polygon};

use super::bbox::rect_in_rect;
use super::measure::{cross, dot, open_coords};

/// Where a point lies relative to a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Inside,
    Outside,
    Boundary,
}

impl Location {
    /// `1` inside, `-1` outside, `0` on the boundary.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Location::Inside => 1,
            Location::Outside => -1,
            Location::Boundary => 0,
        }
    }
}

/// Relative tolerance for collinearity checks.
const COLLINEAR_EPS: f64 = 1e-9;

/// Whether `p` lies on the closed segment `[a, b]`.
pub fn on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> bool {
    if p == a || p == b { return true }
    let ab = b - a;
    let len2 = dot(ab, ab);
    if len2 == 0.0 { return false }
    let ap = p - a;
    // |cross| = |ab| * dist, so this bounds dist by a fraction of |ab|.
    if cross(ab, ap).abs() > COLLINEAR_EPS * len2 { return false }
    let t = dot(ap, ab);
    t >= 0.0 && t <= len2
}

/// Even-odd ray casting with explicit boundary detection.
pub fn point_in_ring(p: Coord<f64>, ring: &LineString<f64>) -> Location {
    let coords = &ring.0;
    if coords.len() < 2 { return Location::Outside }

    let mut inside = false;
    for w in coords.windows(2) {
        let (a, b) = (w[0], w[1]);
        if on_segment(p, a, b) { return Location::Boundary }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x { inside = !inside }
        }
    }
    if coords.first() != coords.last() {
        let (a, b) = (coords[coords.len() - 1], coords[0]);
        if on_segment(p, a, b) { return Location::Boundary }
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x { inside = !inside }
        }
    }

    if inside { Location::Inside } else { Location::Outside }
}

/// Location of `p` in a polygon, holes excluded.
pub fn point_in_polygon(p: Coord<f64>, polygon: &Polygon<f64>) -> Location {
    match point_in_ring(p, polygon.exterior()) {
        Location::Inside => {
            for hole in polygon.interiors() {
                match point_in_ring(p, hole) {
                    Location::Inside => return Location::Outside,
                    Location::Boundary => return Location::Boundary,
                    Location::Outside => {}
                }
            }
            Location::Inside
        }
        other => other,
    }
}

/// Whether segments `[p1, p2]` and `[q1, q2]` properly cross.
///
/// Collinear overlaps and contacts at an endpoint do not count.
pub fn segments_intersect(p1: Coord<f64>, p2: Coord<f64>, q1: Coord<f64>, q2: Coord<f64>) -> bool {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = cross(r, s);
    let scale = dot(r, r).sqrt() * dot(s, s).sqrt();
    if scale == 0.0 || denom.abs() <= COLLINEAR_EPS * scale { return false }

    let qp = q1 - p1;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;

    let open = |v: f64| v > COLLINEAR_EPS && v < 1.0 - COLLINEAR_EPS;
    open(t) && open(u)
}

fn rings_cross(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    a.0.windows(2).any(|sa| {
        b.0.windows(2).any(|sb| segments_intersect(sa[0], sa[1], sb[0], sb[1]))
    })
}

/// Whether ring `a` lies inside or on ring `b` without crossing it.
pub fn ring_in_ring(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    let (Some(ba), Some(bb)) = (a.bounding_rect(), b.bounding_rect()) else { return false };
    if !rect_in_rect(&ba, &bb) { return false }

    let mut classified = false;
    for &p in open_coords(a) {
        match point_in_ring(p, b) {
            Location::Outside => return false,
            Location::Inside => classified = true,
            Location::Boundary => {}
        }
    }

    // Every vertex sits on b: classify edge midpoints instead.
    if !classified {
        for w in a.0.windows(2) {
            match point_in_ring((w[0] + w[1]) / 2.0, b) {
                Location::Outside => return false,
                Location::Inside => classified = true,
                Location::Boundary => {}
            }
        }
        if !classified { return true }
    }

    !rings_cross(a, b)
}

/// Whether ring `a` lies inside the polygon, i.e. inside its exterior and
/// not inside any of its holes.
pub fn ring_in_polygon(a: &LineString<f64>, polygon: &Polygon<f64>) -> bool {
    ring_in_ring(a, polygon.exterior())
        && !polygon.interiors().iter().any(|hole| ring_in_ring(a, hole))
}
