use anyhow::{ensure, Result};
use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::RTree;

use crate::geom::{aabb, exclave_boxes, rect_in_rect, ring_in_polygon, BoundingBox};

/// Parent assignment between two consecutive levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Grouping {
    /// Parent index of every child, `None` for ungrouped children.
    pub parent_of: Vec<Option<usize>>,
    /// Child indices of every parent, ascending.
    pub children: Vec<Vec<usize>>,
}

impl Grouping {
    /// Children left without a parent.
    pub fn ungrouped(&self) -> impl Iterator<Item = usize> + '_ {
        self.parent_of.iter().enumerate().filter(|(_, p)| p.is_none()).map(|(i, _)| i)
    }

    /// Drop parents without children and renumber the rest in order.
    /// Returns the mask of kept parents.
    pub fn prune_empty(&mut self) -> Vec<bool> {
        let keep: Vec<bool> = self.children.iter().map(|c| !c.is_empty()).collect();
        let mut next = 0;
        let renumbered: Vec<Option<usize>> = keep.iter()
            .map(|&k| k.then(|| { next += 1; next - 1 }))
            .collect();
        for parent in self.parent_of.iter_mut() {
            *parent = parent.and_then(|p| renumbered[p]);
        }
        self.children.retain(|c| !c.is_empty());
        keep
    }
}

/// Assigns children to the container shape that holds them.
///
/// A child belongs to a parent when one of its exclave outer rings lies
/// inside one of the parent's polygons and outside that polygon's holes.
/// When several parents qualify the lowest index wins.
#[derive(Debug)]
pub struct HierarchyBuilder<'a> {
    parents: &'a [MultiPolygon<f64>],
    /// Envelope of every parent, the first pre-filter.
    bounds: Vec<Option<Rect<f64>>>,
    rtree: RTree<BoundingBox>,
}

impl<'a> HierarchyBuilder<'a> {
    /// `bounds` holds the stored envelope of every parent.
    pub fn new(parents: &'a [MultiPolygon<f64>], bounds: Vec<Option<Rect<f64>>>) -> Result<Self> {
        ensure!(bounds.len() == parents.len(),
            "[HierarchyBuilder.new] {} envelopes for {} parents", bounds.len(), parents.len());
        Ok(Self { parents, bounds, rtree: RTree::bulk_load(exclave_boxes(parents)) })
    }

    /// The parent holding `child`, if any.
    pub fn parent_of(&self, child: &MultiPolygon<f64>) -> Option<usize> {
        // (parent, exclave of the child, polygon of the parent)
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for (exclave, polygon) in child.0.iter().enumerate() {
            let Some(rect) = polygon.exterior().bounding_rect() else { continue };
            candidates.extend(
                self.rtree.locate_in_envelope_intersecting(&aabb(&rect))
                    .filter(|bb| self.bounds[bb.idx()].is_some_and(|b| rect_in_rect(&rect, &b)))
                    .filter(|bb| rect_in_rect(&rect, bb.bbox()))
                    .map(|bb| (bb.idx(), exclave, bb.part())),
            );
        }
        candidates.sort_unstable();

        candidates.into_iter()
            .find(|&(parent, exclave, part)| {
                ring_in_polygon(child.0[exclave].exterior(), &self.parents[parent].0[part])
            })
            .map(|(parent, _, _)| parent)
    }

    /// Assign every child to its parent.
    #[tracing::instrument(skip_all, fields(parents = self.parents.len(), children = children.len()))]
    pub fn group(&self, children: &[MultiPolygon<f64>]) -> Grouping {
        let parent_of: Vec<Option<usize>> = children.iter().map(|c| self.parent_of(c)).collect();

        let mut grouped = vec![Vec::new(); self.parents.len()];
        for (child, parent) in parent_of.iter().enumerate() {
            if let Some(p) = parent { grouped[*p].push(child) }
        }

        let grouping = Grouping { parent_of, children: grouped };
        let ungrouped = grouping.ungrouped().count();
        if ungrouped > 0 {
            tracing::warn!(ungrouped, "children without a containing parent");
        }
        tracing::debug!(grouped = children.len() - ungrouped, "grouped children");
        grouping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon<f64> {
        Polygon::new(LineString::from(vec![(x0, y0), (x0 + w, y0), (x0 + w, y0 + h), (x0, y0 + h), (x0, y0)]), vec![])
    }

    fn shape(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> { MultiPolygon(polygons) }

    fn builder(parents: &[MultiPolygon<f64>]) -> HierarchyBuilder<'_> {
        HierarchyBuilder::new(parents, parents.iter().map(|p| p.bounding_rect()).collect()).unwrap()
    }

    #[test]
    fn children_go_to_the_containing_parent() {
        let parents = vec![shape(vec![rect(0.0, 0.0, 2.0, 1.0)]), shape(vec![rect(2.0, 0.0, 2.0, 1.0)])];
        let children = vec![
            shape(vec![rect(0.0, 0.0, 1.0, 1.0)]),
            shape(vec![rect(1.0, 0.0, 1.0, 1.0)]),
            shape(vec![rect(2.0, 0.0, 1.0, 1.0)]),
            shape(vec![rect(3.5, 0.5, 1.0, 1.0)]),
        ];
        let grouping = builder(&parents).group(&children);

        assert_eq!(grouping.parent_of, vec![Some(0), Some(0), Some(1), None]);
        assert_eq!(grouping.children, vec![vec![0, 1], vec![2]]);
        assert_eq!(grouping.ungrouped().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn lowest_index_wins_between_overlapping_parents() {
        let parents = vec![shape(vec![rect(0.0, 0.0, 10.0, 10.0)]), shape(vec![rect(0.0, 0.0, 5.0, 5.0)])];
        let hierarchy = builder(&parents);
        assert_eq!(hierarchy.parent_of(&shape(vec![rect(1.0, 1.0, 1.0, 1.0)])), Some(0));
    }

    #[test]
    fn child_in_a_hole_is_not_contained() {
        let holed = Polygon::new(
            rect(0.0, 0.0, 10.0, 10.0).exterior().clone(),
            vec![LineString::from(vec![(3.0, 3.0), (3.0, 7.0), (7.0, 7.0), (7.0, 3.0), (3.0, 3.0)])],
        );
        let parents = vec![shape(vec![holed]), shape(vec![rect(3.0, 3.0, 4.0, 4.0)])];
        let hierarchy = builder(&parents);

        assert_eq!(hierarchy.parent_of(&shape(vec![rect(4.0, 4.0, 1.0, 1.0)])), Some(1));
        assert_eq!(hierarchy.parent_of(&shape(vec![rect(0.0, 0.0, 3.0, 3.0)])), Some(0));
    }

    #[test]
    fn any_exclave_can_match_any_parent_polygon() {
        let parents = vec![shape(vec![rect(0.0, 0.0, 1.0, 1.0), rect(20.0, 20.0, 5.0, 5.0)])];
        let child = shape(vec![rect(50.0, 50.0, 1.0, 1.0), rect(21.0, 21.0, 1.0, 1.0)]);
        assert_eq!(builder(&parents).parent_of(&child), Some(0));
    }

    #[test]
    fn empty_parent_set_groups_nothing() {
        let grouping = builder(&[]).group(&[shape(vec![rect(0.0, 0.0, 1.0, 1.0)])]);
        assert_eq!(grouping.parent_of, vec![None]);
        assert!(grouping.children.is_empty());
    }

    #[test]
    fn stored_envelopes_gate_candidates() {
        let parents = vec![shape(vec![rect(0.0, 0.0, 4.0, 4.0)])];
        let child = shape(vec![rect(1.0, 1.0, 1.0, 1.0)]);
        let narrow = vec![Some(Rect::new((0.0, 0.0), (1.5, 1.5)))];

        assert_eq!(builder(&parents).parent_of(&child), Some(0));
        assert_eq!(HierarchyBuilder::new(&parents, narrow).unwrap().parent_of(&child), None);
        assert!(HierarchyBuilder::new(&parents, vec![]).is_err());
    }

    #[test]
    fn pruning_renumbers_remaining_parents() {
        let mut grouping = Grouping {
            parent_of: vec![Some(2), None, Some(0), Some(2)],
            children: vec![vec![2], vec![], vec![0, 3]],
        };
        assert_eq!(grouping.prune_empty(), vec![true, false, true]);
        assert_eq!(grouping.parent_of, vec![Some(1), None, Some(0), Some(1)]);
        assert_eq!(grouping.children, vec![vec![2], vec![0, 3]]);
    }
}
