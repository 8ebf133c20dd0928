//! Ordered coordinate transformation pipeline from source degrees to canvas
//! pixels.

mod transform;

use anyhow::{ensure, Context, Result};
use geo::Coord;

pub use transform::{Transform, MERCATOR_MAX_LATITUDE};

use crate::config::{MapConfig, ProjectionKind};
use crate::geom::points_envelope;
use crate::topology::Topology;

/// A sequence of transforms applied in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    stages: Vec<Transform>,
}

impl Projection {
    pub fn new() -> Self { Self::default() }

    /// Append a stage, returning the extended pipeline.
    pub fn then(mut self, transform: Transform) -> Self {
        self.stages.push(transform);
        self
    }

    #[inline] pub fn stages(&self) -> &[Transform] { &self.stages }

    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        self.stages.iter().fold(c, |c, t| t.apply(c))
    }

    /// Project every node of the topology in place.
    pub fn apply_to(&self, topology: &mut Topology) {
        for node in topology.nodes.iter_mut() { node.point = self.apply(node.point) }
    }
}

/// The planar projection stage for the configured kind.
pub fn planar(config: &MapConfig) -> Transform {
    let central_meridian = config.central_meridian.to_radians();
    match config.projection {
        ProjectionKind::Mercator => Transform::Mercator { central_meridian },
        ProjectionKind::CylindricalEqualArea { standard_parallel } => Transform::CylindricalEqualArea {
            central_meridian,
            standard_parallel: standard_parallel.to_radians(),
        },
    }
}

/// Canvas size for a projected extent, deriving a zero dimension from the
/// other through the extent's aspect ratio.
pub fn canvas_size(width: u32, height: u32, extent_width: f64, extent_height: f64) -> Result<(u32, u32)> {
    ensure!(width > 0 || height > 0, "[projection.canvas_size] width and height cannot both be 0");
    ensure!(extent_width > 0.0 && extent_height > 0.0,
        "[projection.canvas_size] degenerate extent {extent_width} x {extent_height}");

    let derive = |known: u32, ratio: f64| ((known as f64 * ratio).round() as u32).max(1);
    Ok(match (width, height) {
        (w, 0) => (w, derive(w, extent_height / extent_width)),
        (0, h) => (derive(h, extent_width / extent_height), h),
        (w, h) => (w, h),
    })
}

/// A projection fitted to a particular point set.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedProjection {
    pub projection: Projection,
    pub width: u32,
    pub height: u32,
}

/// Build the full pipeline (radians, planar, unit interval, optional mirror,
/// canvas scale) so that `points` fill `[0, width] x [0, height]`.
pub fn fit(config: &MapConfig, points: impl IntoIterator<Item = Coord<f64>>) -> Result<FittedProjection> {
    let spherical = Projection::new().then(Transform::Radians).then(planar(config));
    let extent = points_envelope(points.into_iter().map(|p| spherical.apply(p)))
        .context("[projection.fit] no points to project")?;

    let (width, height) = canvas_size(config.width, config.height, extent.width(), extent.height())
        .context("[projection.fit] cannot size canvas")?;

    let mut projection = spherical.then(Transform::unit(extent));
    if config.mirror_y {
        projection = projection.then(Transform::Mirror { x: false, y: true });
    }
    projection = projection.then(Transform::Scale { x: width as f64, y: height as f64 });

    Ok(FittedProjection { projection, width, height })
}
