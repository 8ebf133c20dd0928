use std::f64::consts::{FRAC_PI_4, PI};

use geo::{Coord, Rect};

/// Web Mercator latitude limit in degrees; beyond it `y` diverges.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_78;

/// One coordinate transformation step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transform {
    /// Degrees to radians on both axes.
    Radians,
    /// Spherical Mercator on radian input.
    Mercator { central_meridian: f64 },
    /// Lambert cylindrical equal-area on radian input.
    CylindricalEqualArea { central_meridian: f64, standard_parallel: f64 },
    /// Linear map of the `source` rectangle onto the `target` rectangle.
    Interval { source: Rect<f64>, target: Rect<f64> },
    /// Multiply each axis by a factor.
    Scale { x: f64, y: f64 },
    /// Flip axes inside the unit interval (`v -> 1 - v`).
    Mirror { x: bool, y: bool },
}

/// Longitude relative to the central meridian, clamped to `[-π, π]`.
#[inline]
fn relative_longitude(lambda: f64, central_meridian: f64) -> f64 {
    (lambda - central_meridian).clamp(-PI, PI)
}

impl Transform {
    /// Map a unit-square-normalising interval over `source`.
    pub fn unit(source: Rect<f64>) -> Self {
        Transform::Interval { source, target: Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }) }
    }

    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        match *self {
            Transform::Radians => Coord { x: c.x.to_radians(), y: c.y.to_radians() },
            Transform::Mercator { central_meridian } => {
                let limit = MERCATOR_MAX_LATITUDE.to_radians();
                let phi = c.y.clamp(-limit, limit);
                Coord { x: relative_longitude(c.x, central_meridian), y: (FRAC_PI_4 + phi / 2.0).tan().ln() }
            }
            Transform::CylindricalEqualArea { central_meridian, standard_parallel } => {
                let cos_p = standard_parallel.cos();
                Coord { x: relative_longitude(c.x, central_meridian) * cos_p, y: c.y.sin() / cos_p }
            }
            Transform::Interval { source, target } => {
                let sx = if source.width() > 0.0 { target.width() / source.width() } else { 0.0 };
                let sy = if source.height() > 0.0 { target.height() / source.height() } else { 0.0 };
                Coord {
                    x: target.min().x + sx * (c.x - source.min().x),
                    y: target.min().y + sy * (c.y - source.min().y),
                }
            }
            Transform::Scale { x, y } => Coord { x: c.x * x, y: c.y * y },
            Transform::Mirror { x, y } => Coord {
                x: if x { 1.0 - c.x } else { c.x },
                y: if y { 1.0 - c.y } else { c.y },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn close(a: Coord<f64>, b: Coord<f64>) -> bool { (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 }

    #[test]
    fn radians_converts_both_axes() {
        let c = Transform::Radians.apply(coord! { x: 180.0, y: -90.0 });
        assert!(close(c, coord! { x: PI, y: -PI / 2.0 }));
    }

    #[test]
    fn mercator_is_zero_at_origin_and_symmetric() {
        let m = Transform::Mercator { central_meridian: 0.0 };
        assert!(close(m.apply(coord! { x: 0.0, y: 0.0 }), coord! { x: 0.0, y: 0.0 }));
        let n = m.apply(coord! { x: 0.3, y: 0.7 });
        let s = m.apply(coord! { x: 0.3, y: -0.7 });
        assert!((n.y + s.y).abs() < 1e-12);
        assert!(n.y > 0.7, "mercator stretches latitude");
    }

    #[test]
    fn mercator_clamps_poles_and_longitude() {
        let m = Transform::Mercator { central_meridian: PI / 2.0 };
        let pole = m.apply(coord! { x: 0.0, y: PI / 2.0 });
        assert!(pole.y.is_finite());
        assert!((pole.y - PI).abs() < 1e-6, "85.0511° maps to y = π");
        assert!((m.apply(coord! { x: PI, y: 0.0 }).x - PI / 2.0).abs() < 1e-12);
        // 170°W seen from 90°E would be 260° west
        assert_eq!(m.apply(coord! { x: -170f64.to_radians(), y: 0.0 }).x, -PI);
    }

    #[test]
    fn equal_area_preserves_band_areas() {
        let t = Transform::CylindricalEqualArea { central_meridian: 0.0, standard_parallel: 0.0 };
        // equal-width latitude bands near the pole are thinner than near the equator
        let band = |lo: f64, hi: f64| t.apply(coord! { x: 0.0, y: hi }).y - t.apply(coord! { x: 0.0, y: lo }).y;
        assert!(band(0.0, 0.1) > band(1.4, 1.5));
        assert!((t.apply(coord! { x: 0.0, y: PI / 2.0 }).y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interval_maps_rectangles() {
        let t = Transform::Interval {
            source: Rect::new(coord! { x: -2.0, y: 10.0 }, coord! { x: 2.0, y: 20.0 }),
            target: Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 100.0, y: 50.0 }),
        };
        assert!(close(t.apply(coord! { x: -2.0, y: 10.0 }), coord! { x: 0.0, y: 0.0 }));
        assert!(close(t.apply(coord! { x: 0.0, y: 15.0 }), coord! { x: 50.0, y: 25.0 }));
        assert!(close(t.apply(coord! { x: 2.0, y: 20.0 }), coord! { x: 100.0, y: 50.0 }));
    }

    #[test]
    fn unit_interval_and_mirror() {
        let unit = Transform::unit(Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 4.0, y: 2.0 }));
        let c = unit.apply(coord! { x: 1.0, y: 0.5 });
        assert!(close(c, coord! { x: 0.25, y: 0.25 }));
        assert!(close(Transform::Mirror { x: false, y: true }.apply(c), coord! { x: 0.25, y: 0.75 }));
        assert!(close(Transform::Scale { x: 4.0, y: 8.0 }.apply(c), coord! { x: 1.0, y: 2.0 }));
    }
}
