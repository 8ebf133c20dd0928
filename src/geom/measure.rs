use geo::{Coord, LineString, MultiPolygon, Polygon};

/// 2D cross product (z component of `a x b`).
#[inline] pub fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.y - a.y * b.x }

#[inline] pub fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

#[inline] pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 { (a.x - b.x).hypot(a.y - b.y) }

/// Signed shoelace area: positive for counter-clockwise rings.
pub fn signed_area(ring: &LineString<f64>) -> f64 {
    ring.0.windows(2).map(|w| cross(w[0], w[1])).sum::<f64>() / 2.0
}

#[inline] pub fn is_ccw(ring: &LineString<f64>) -> bool { signed_area(ring) > 0.0 }

/// Unsigned area enclosed by a closed ring.
#[inline] pub fn ring_area(ring: &LineString<f64>) -> f64 { signed_area(ring).abs() }

/// Outer area minus hole areas, never negative.
pub fn polygon_area(polygon: &Polygon<f64>) -> f64 {
    let holes: f64 = polygon.interiors().iter().map(ring_area).sum();
    (ring_area(polygon.exterior()) - holes).max(0.0)
}

pub fn multipolygon_area(multipolygon: &MultiPolygon<f64>) -> f64 {
    multipolygon.0.iter().map(polygon_area).sum()
}

/// Signed area-weighted centroid accumulator of one ring, relative to its
/// first vertex.
///
/// Returns `(origin, Σ (p_i + p_{i+1}) * cross_i, Σ cross_i)`; the sign of both
/// sums follows the winding, so a clockwise ring subtracts from a running sum.
fn centroid_terms(ring: &LineString<f64>) -> (Coord<f64>, Coord<f64>, f64) {
    let origin = ring.0.first().copied().unwrap_or_else(Coord::zero);
    let (sum, twice_area) = ring.0.windows(2).fold((Coord::zero(), 0.0), |(acc, a), w| {
        let (p, q) = (w[0] - origin, w[1] - origin);
        let c = cross(p, q);
        (acc + (p + q) * c, a + c)
    });
    (origin, sum, twice_area)
}

fn vertex_mean(ring: &LineString<f64>) -> Option<Coord<f64>> {
    let open = open_coords(ring);
    if open.is_empty() { return None }
    let sum = open.iter().fold(Coord::zero(), |acc, &c| acc + c);
    Some(sum / open.len() as f64)
}

/// Coordinates of a ring without the closing repeat.
pub fn open_coords(ring: &LineString<f64>) -> &[Coord<f64>] {
    match ring.0.as_slice() {
        [first, .., last] if first == last => &ring.0[..ring.0.len() - 1],
        coords => coords,
    }
}

/// Area-weighted centroid of a ring, falling back to the vertex mean for
/// degenerate (zero-area) rings.
pub fn ring_centroid(ring: &LineString<f64>) -> Option<Coord<f64>> {
    let (origin, sum, twice_area) = centroid_terms(ring);
    if twice_area.abs() > f64::EPSILON {
        Some(origin + sum / (3.0 * twice_area))
    } else {
        vertex_mean(ring)
    }
}

/// Centroid of a polygon: the outer ring weighted by its area, each hole
/// weighted by the negative of its area.
pub fn polygon_centroid(polygon: &Polygon<f64>) -> Option<Coord<f64>> {
    let mut weighted = Coord::zero();
    let mut total = 0.0;

    let mut add = |ring: &LineString<f64>, sign: f64| {
        let area = ring_area(ring);
        if let Some(c) = ring_centroid(ring) {
            weighted = weighted + c * (sign * area);
            total += sign * area;
        }
    };
    add(polygon.exterior(), 1.0);
    polygon.interiors().iter().for_each(|hole| add(hole, -1.0));

    if total > f64::EPSILON {
        Some(weighted / total)
    } else {
        vertex_mean(polygon.exterior())
    }
}

/// Area-weighted centroid over all exclaves.
pub fn multipolygon_centroid(multipolygon: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let (weighted, total) = multipolygon.0.iter()
        .filter_map(|p| Some((polygon_centroid(p)?, polygon_area(p))))
        .fold((Coord::zero(), 0.0), |(acc, t), (c, a)| (acc + c * a, t + a));

    if total > f64::EPSILON {
        Some(weighted / total)
    } else {
        multipolygon.0.first().and_then(polygon_centroid)
    }
}

/// Distance from `p` to the infinite line through `a` and `b`.
///
/// Degenerates to the point distance when `a == b`.
pub fn perpendicular_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = b - a;
    let len = ab.x.hypot(ab.y);
    if len == 0.0 { return distance(p, a) }
    cross(ab, p - a).abs() / len
}

/// Distance from `p` to the closed segment `[a, b]`.
pub fn segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = b - a;
    let len2 = dot(ab, ab);
    if len2 == 0.0 { return distance(p, a) }
    let t = (dot(p - a, ab) / len2).clamp(0.0, 1.0);
    distance(p, a + ab * t)
}

/// Distance from `p` to the nearest edge of any ring of the polygon.
pub fn boundary_distance(p: Coord<f64>, polygon: &Polygon<f64>) -> f64 {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(|ring| ring.0.windows(2))
        .map(|w| segment_distance(p, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, LineString, Polygon};

    fn square(x0: f64, y0: f64, side: f64) -> LineString<f64> {
        LineString::from(vec![(x0, y0), (x0 + side, y0), (x0 + side, y0 + side), (x0, y0 + side), (x0, y0)])
    }

    #[test]
    fn unit_square_has_unit_area() {
        let ring = square(0.0, 0.0, 1.0);
        assert_eq!(ring_area(&ring), 1.0);
        assert_eq!(signed_area(&ring), 1.0);
        assert!(is_ccw(&ring));
    }

    #[test]
    fn clockwise_ring_has_negative_signed_area() {
        let mut ring = square(0.0, 0.0, 2.0);
        ring.0.reverse();
        assert_eq!(signed_area(&ring), -4.0);
        assert_eq!(ring_area(&ring), 4.0);
    }

    #[test]
    fn polygon_area_subtracts_holes() {
        let polygon = Polygon::new(square(0.0, 0.0, 4.0), vec![square(1.0, 1.0, 1.0), square(2.0, 2.0, 1.0)]);
        assert_eq!(polygon_area(&polygon), 14.0);
    }

    #[test]
    fn polygon_area_is_clamped_at_zero() {
        let polygon = Polygon::new(square(0.0, 0.0, 1.0), vec![square(0.0, 0.0, 2.0)]);
        assert_eq!(polygon_area(&polygon), 0.0);
    }

    #[test]
    fn ring_centroid_ignores_winding() {
        let ring = square(2.0, 4.0, 2.0);
        let mut reversed = ring.clone();
        reversed.0.reverse();
        assert_eq!(ring_centroid(&ring), Some(coord! { x: 3.0, y: 5.0 }));
        assert_eq!(ring_centroid(&reversed), Some(coord! { x: 3.0, y: 5.0 }));
    }

    #[test]
    fn hole_pulls_centroid_away() {
        // 4x4 square with a 2x2 hole in its right half
        let polygon = Polygon::new(square(0.0, 0.0, 4.0), vec![square(2.0, 1.0, 2.0)]);
        let c = polygon_centroid(&polygon).unwrap();
        // (16 * 2 - 4 * 3) / 12
        assert!((c.x - 20.0 / 12.0).abs() < 1e-12);
        assert!((c.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn multipolygon_centroid_weights_by_area() {
        let mp = MultiPolygon(vec![
            Polygon::new(square(0.0, 0.0, 2.0), vec![]),
            Polygon::new(square(10.0, 0.0, 1.0), vec![]),
        ]);
        let c = multipolygon_centroid(&mp).unwrap();
        assert!((c.x - (4.0 * 1.0 + 1.0 * 10.5) / 5.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_ring_centroid_is_vertex_mean() {
        let ring = LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (4.0, 0.0), (0.0, 0.0)]);
        assert_eq!(ring_centroid(&ring), Some(coord! { x: 2.0, y: 0.0 }));
        assert_eq!(ring_centroid(&LineString::new(vec![])), None);
    }

    #[test]
    fn perpendicular_distance_uses_infinite_line() {
        let a = coord! { x: 0.0, y: 0.0 };
        let b = coord! { x: 1.0, y: 0.0 };
        assert_eq!(perpendicular_distance(coord! { x: 5.0, y: 3.0 }, a, b), 3.0);
        assert_eq!(segment_distance(coord! { x: 5.0, y: 3.0 }, a, b), 5.0);
        assert_eq!(perpendicular_distance(coord! { x: 3.0, y: 4.0 }, a, a), 5.0);
    }

    #[test]
    fn boundary_distance_includes_holes() {
        let polygon = Polygon::new(square(0.0, 0.0, 10.0), vec![square(4.0, 4.0, 2.0)]);
        assert_eq!(boundary_distance(coord! { x: 2.0, y: 5.0 }, &polygon), 2.0);
        assert_eq!(boundary_distance(coord! { x: 3.5, y: 5.0 }, &polygon), 0.5);
    }
}
