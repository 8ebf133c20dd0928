use std::collections::BTreeSet;

use anyhow::{ensure, Context, Result};
use geo::{BoundingRect, Coord, MultiPolygon, Rect};
use topobuf::{Area, DenseId, UndirectedGraph};

use crate::center::CenterCalculator;
use crate::config::MapConfig;
use crate::geom::{multipolygon_area, multipolygon_centroid};
use crate::hierarchy::{Grouping, HierarchyBuilder};
use crate::topology::Topology;

use super::{ArmyCalculator, Bonus, Map, SuperBonus, Territory};

/// An area resolved into projected geometry.
struct Resolved<'a> {
    area: &'a Area,
    geometry: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

/// Assembles the output [`Map`] from a projected topology and its neighbour
/// graph.
pub struct MapBuilder<'a> {
    config: &'a MapConfig,
    territory_level: u8,
}

impl<'a> MapBuilder<'a> {
    pub fn new(config: &'a MapConfig, territory_level: u8) -> Self { Self { config, territory_level } }

    /// Bonus and super bonus levels, if configured.
    fn group_levels(&self) -> (Option<u8>, Option<u8>) {
        let levels = self.config.bonus_levels_inner_first();
        (levels.first().copied(), levels.get(1).copied())
    }

    fn resolve<'t>(topology: &'t Topology, level: Option<u8>) -> Result<Vec<Resolved<'t>>> {
        let Some(level) = level else { return Ok(Vec::new()) };
        topology.areas_at_level(level)
            .map(|area| {
                let geometry = topology.area_shape(area)?;
                Ok(Resolved { area, bounds: geometry.bounding_rect(), geometry })
            })
            .collect()
    }

    fn center(calculator: &CenterCalculator, r: &Resolved) -> Coord<f64> {
        calculator.center(&r.geometry)
            .or_else(|| multipolygon_centroid(&r.geometry))
            .unwrap_or_else(|| {
                tracing::warn!(area = %r.area.id, name = %r.area.name, "no center for degenerate geometry");
                Coord { x: 0.0, y: 0.0 }
            })
    }

    fn bounds(r: &Resolved) -> Result<Rect<f64>> {
        r.bounds
            .with_context(|| format!("[MapBuilder.bounds] area {} ({}) has no geometry", r.area.id, r.area.name))
    }

    /// Group `children` into `parents`. Parents that receive no child are
    /// dropped and the grouping is renumbered onto the survivors.
    fn group<'t>(parents: Vec<Resolved<'t>>, children: &[Resolved]) -> Result<(Vec<Resolved<'t>>, Grouping)> {
        if parents.is_empty() {
            return Ok((parents, Grouping { parent_of: vec![None; children.len()], children: Vec::new() }));
        }
        let shapes: Vec<MultiPolygon<f64>> = parents.iter().map(|r| r.geometry.clone()).collect();
        let child_shapes: Vec<MultiPolygon<f64>> = children.iter().map(|r| r.geometry.clone()).collect();
        let mut grouping = HierarchyBuilder::new(&shapes, parents.iter().map(|r| r.bounds).collect())?
            .group(&child_shapes);

        let keep = grouping.prune_empty();
        let parents = parents.into_iter().zip(keep)
            .filter_map(|(r, keep)| {
                if !keep {
                    tracing::warn!(area = %r.area.id, name = %r.area.name, "dropping container without children");
                }
                keep.then_some(r)
            })
            .collect();
        Ok((parents, grouping))
    }

    /// Build the map. `graph` must have one vertex per area of `topology`.
    #[tracing::instrument(skip_all, fields(territory_level = self.territory_level))]
    pub fn build(&self, topology: &Topology, graph: &UndirectedGraph, width: u32, height: u32) -> Result<Map> {
        ensure!(graph.vertex_count() == topology.areas.len(),
            "[MapBuilder.build] graph has {} vertices for {} areas", graph.vertex_count(), topology.areas.len());

        let (bonus_level, super_level) = self.group_levels();
        let territories = Self::resolve(topology, Some(self.territory_level))?;
        let (bonuses, bonus_grouping) = Self::group(Self::resolve(topology, bonus_level)?, &territories)?;
        let (super_bonuses, super_grouping) = Self::group(Self::resolve(topology, super_level)?, &bonuses)?;

        let total: f64 = territories.iter().map(|r| multipolygon_area(&r.geometry)).sum();
        let calculator = CenterCalculator::new(total);

        // area index -> territory id
        let mut territory_of = vec![None; topology.areas.len()];
        for (i, r) in territories.iter().enumerate() { territory_of[r.area.id.index()] = Some(i) }

        let map_territories: Vec<Territory> = territories.iter().zip(&bonus_grouping.parent_of).enumerate()
            .map(|(id, (r, &bonus))| {
                let mut neighbors: Vec<usize> = graph.adjacents(r.area.id)
                    .filter_map(|a| territory_of[a.index()])
                    .collect();
                neighbors.sort_unstable();
                neighbors.dedup();
                Territory {
                    id,
                    source_id: r.area.source_id,
                    name: r.area.name.clone(),
                    geometry: r.geometry.clone(),
                    center: Self::center(&calculator, r),
                    neighbors,
                    bonus,
                }
            })
            .collect();

        let mut map_bonuses = bonuses.iter()
            .zip(bonus_grouping.children)
            .zip(&super_grouping.parent_of)
            .enumerate()
            .map(|(id, ((r, children), &super_bonus))| Ok(Bonus {
                id,
                source_id: r.area.source_id,
                name: r.area.name.clone(),
                geometry: r.geometry.clone(),
                center: Self::center(&calculator, r),
                bounds: Self::bounds(r)?,
                children,
                armies: 0,
                super_bonus,
            }))
            .collect::<Result<Vec<_>>>()?;

        let mut map_super_bonuses = super_bonuses.iter()
            .zip(super_grouping.children)
            .enumerate()
            .map(|(id, (r, children))| Ok(SuperBonus {
                id,
                source_id: r.area.source_id,
                name: r.area.name.clone(),
                geometry: r.geometry.clone(),
                center: Self::center(&calculator, r),
                bounds: Self::bounds(r)?,
                children,
                armies: 0,
            }))
            .collect::<Result<Vec<_>>>()?;

        ArmyCalculator::new(self.config.armies).assign(&map_territories, &mut map_bonuses, &mut map_super_bonuses);

        let map = Map {
            name: self.config.name.clone(),
            width,
            height,
            levels: topology.areas.iter().map(|a| a.level).collect::<BTreeSet<u8>>(),
            territories: map_territories,
            bonuses: map_bonuses,
            super_bonuses: map_super_bonuses,
        };
        tracing::info!(
            territories = map.territories.len(), bonuses = map.bonuses.len(),
            super_bonuses = map.super_bonuses.len(), connections = map.connection_count(), "built map",
        );
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Adjacency;
    use crate::inspector::NeighborInspector;
    use crate::topology::fixtures::{add_area, square};

    /// Four unit territories in a row, two bonuses of two, one super bonus.
    fn world() -> Topology {
        let mut topology = Topology::new();
        for i in 0..4 {
            add_area(&mut topology, &format!("t{i}"), 8, &square(i as f64, 0.0, 1.0));
        }
        add_area(&mut topology, "west", 6, &[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]);
        add_area(&mut topology, "east", 6, &[(2.0, 0.0), (4.0, 0.0), (4.0, 1.0), (2.0, 1.0)]);
        add_area(&mut topology, "all", 4, &[(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (0.0, 1.0)]);
        topology
    }

    fn build(config: &MapConfig, topology: &Topology) -> Map {
        let graph = NeighborInspector::new(topology, Adjacency::Rook).build_graph().unwrap();
        MapBuilder::new(config, 8).build(topology, &graph, 400, 100).unwrap()
    }

    #[test]
    fn builds_three_level_map() {
        let topology = world();
        let config = MapConfig { bonus_levels: vec![4, 6], territory_level: Some(8), ..MapConfig::default() };
        let map = build(&config, &topology);

        assert_eq!(map.levels.iter().copied().collect::<Vec<_>>(), vec![4, 6, 8]);
        assert_eq!(map.territories.len(), 4);
        assert_eq!(map.territories[1].neighbors, vec![0, 2]);
        assert_eq!(map.territories[0].center, Coord { x: 0.5, y: 0.5 });
        assert_eq!(map.territories[3].source_id, 1003);

        assert_eq!(map.bonuses.len(), 2);
        assert_eq!(map.bonuses[0].children, vec![0, 1]);
        assert_eq!(map.bonuses[1].children, vec![2, 3]);
        assert_eq!(map.bonuses[1].bounds, Rect::new(Coord { x: 2.0, y: 0.0 }, Coord { x: 4.0, y: 1.0 }));
        assert_eq!(map.territories[2].bonus, Some(1));

        assert_eq!(map.super_bonuses.len(), 1);
        assert_eq!(map.super_bonuses[0].children, vec![0, 1]);
        assert_eq!(map.bonuses[0].super_bonus, Some(0));
        // equal bonuses: both score the maximum
        assert_eq!(map.bonuses[0].armies, 10);
        assert_eq!(map.super_bonuses[0].armies, 20);
        assert_eq!(map.connection_count(), 3);
        map.validate().unwrap();
    }

    #[test]
    fn without_bonus_levels_only_territories_are_built() {
        let topology = world();
        let config = MapConfig { territory_level: Some(8), ..MapConfig::default() };
        let map = build(&config, &topology);

        assert_eq!(map.territories.len(), 4);
        assert!(map.bonuses.is_empty() && map.super_bonuses.is_empty());
        assert_eq!(map.ungrouped_territories().count(), 4);
        assert_eq!((map.width, map.height), (400, 100));
        map.validate().unwrap();
    }

    #[test]
    fn mismatched_graph_is_rejected() {
        let topology = world();
        let config = MapConfig::default();
        let graph = UndirectedGraph::new(1);
        assert!(MapBuilder::new(&config, 8).build(&topology, &graph, 10, 10).is_err());
    }

    #[test]
    fn containers_without_children_are_dropped() {
        let mut topology = Topology::new();
        add_area(&mut topology, "t0", 8, &square(0.0, 0.0, 1.0));
        add_area(&mut topology, "t1", 8, &square(1.0, 0.0, 1.0));
        add_area(&mut topology, "void", 6, &square(5.0, 0.0, 1.0));
        add_area(&mut topology, "pair", 6, &[(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (0.0, 1.0)]);
        let config = MapConfig { bonus_levels: vec![6], territory_level: Some(8), ..MapConfig::default() };
        let map = build(&config, &topology);

        assert_eq!(map.bonuses.len(), 1);
        assert_eq!(map.bonuses[0].name, "pair");
        assert_eq!(map.bonuses[0].id, 0);
        assert_eq!(map.bonuses[0].children, vec![0, 1]);
        assert_eq!(map.territories[1].bonus, Some(0));
        map.validate().unwrap();
    }
}
