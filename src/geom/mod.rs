//! Planar geometry kernel over `geo` value types.
//!
//! Rings are closed `LineString`s (first == last). Counter-clockwise rings
//! have positive signed area; outer rings are stored that way and holes the
//! other way round.

mod bbox;
mod contain;
mod measure;

pub(crate) use bbox::{aabb, exclave_boxes, BoundingBox};
pub use bbox::{points_envelope, rect_in_rect, rect_union};
pub use contain::{on_segment, point_in_polygon, point_in_ring, ring_in_polygon, ring_in_ring, segments_intersect, Location};
pub use measure::{
    boundary_distance, cross, distance, dot, is_ccw, multipolygon_area, multipolygon_centroid, open_coords,
    perpendicular_distance, polygon_area, polygon_centroid, ring_area, ring_centroid, segment_distance, signed_area,
};
