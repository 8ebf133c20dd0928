use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use rstar::{RTreeObject, AABB};

/// A bounding box in an R-tree, associated with an owner by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of the owning entity
    part: usize, // Index of the polygon within the owner
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: usize, part: usize, bbox: Rect<f64>) -> Self {
        Self { idx, part, bbox }
    }

    /// Get the index of the owning entity.
    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }

    /// Get the index of the polygon within the owner.
    #[inline] pub(crate) fn part(&self) -> usize { self.part }

    /// Get a reference to the bounding rectangle.
    #[inline] pub(crate) fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// One box per exclave of every multipolygon, for bulk loading an R-tree.
pub(crate) fn exclave_boxes<'a>(shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Vec<BoundingBox> {
    shapes.into_iter().enumerate()
        .flat_map(|(idx, shape)| {
            shape.0.iter().enumerate().filter_map(move |(part, polygon)| {
                polygon.bounding_rect().map(|bbox| BoundingBox::new(idx, part, bbox))
            })
        })
        .collect()
}

/// The envelope of `rect` as an rstar query box.
#[inline]
pub(crate) fn aabb(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}

/// Smallest rectangle covering both inputs.
pub fn rect_union(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

/// Envelope of a set of points by linear scan.
pub fn points_envelope(points: impl IntoIterator<Item = Coord<f64>>) -> Option<Rect<f64>> {
    points.into_iter()
        .map(|p| Rect::new(p, p))
        .reduce(|a, b| rect_union(&a, &b))
}

/// Whether `inner` lies within `outer`, boundaries inclusive.
pub fn rect_in_rect(inner: &Rect<f64>, outer: &Rect<f64>) -> bool {
    inner.min().x >= outer.min().x && inner.min().y >= outer.min().y
        && inner.max().x <= outer.max().x && inner.max().y <= outer.max().y
}
