use std::collections::BTreeSet;

use crate::buffer::IdMap;
use crate::error::TopologyError;
use crate::ids::{AreaId, DenseId};

/// Undirected graph over a dense vertex range `[0, V)`.
///
/// Each edge is stored in both directions in an ordered set, so degree and
/// neighbour queries are range scans keyed on the source vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndirectedGraph<I: DenseId = AreaId> {
    vertices: usize,
    edges: BTreeSet<(I, I)>,
}

impl<I: DenseId> UndirectedGraph<I> {
    /// A graph with `vertices` isolated vertices.
    pub fn new(vertices: usize) -> Self { Self { vertices, edges: BTreeSet::new() } }

    #[inline] pub fn vertex_count(&self) -> usize { self.vertices }

    /// Number of undirected edges.
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() / 2 }

    #[inline] pub fn vertices(&self) -> impl Iterator<Item = I> { (0..self.vertices).map(I::from_index) }

    fn check(&self, v: I) -> Result<(), TopologyError> {
        if v.index() >= self.vertices {
            return Err(TopologyError::OutOfRange { kind: I::KIND, id: v.index(), len: self.vertices });
        }
        Ok(())
    }

    /// Insert `u -- v`. Returns whether the edge was new.
    pub fn insert_edge(&mut self, u: I, v: I) -> Result<bool, TopologyError> {
        self.check(u)?;
        self.check(v)?;
        if u == v { return Err(TopologyError::SelfLoop { kind: I::KIND, id: u.index() }) }

        let inserted = self.edges.insert((u, v));
        self.edges.insert((v, u));
        Ok(inserted)
    }

    #[inline] pub fn contains_edge(&self, u: I, v: I) -> bool { self.edges.contains(&(u, v)) }

    /// Neighbours of `v` in ascending order.
    pub fn adjacents(&self, v: I) -> impl Iterator<Item = I> + '_ {
        self.edges.range((v, I::from_index(0))..=(v, I::MAX)).map(|&(_, w)| w)
    }

    #[inline] pub fn degree(&self, v: I) -> usize { self.adjacents(v).count() }

    /// Each undirected edge once, as `(low, high)`.
    pub fn edges(&self) -> impl Iterator<Item = (I, I)> + '_ {
        self.edges.iter().copied().filter(|(u, v)| u < v)
    }

    /// Label every vertex with a connected component.
    ///
    /// Components are numbered in order of their smallest vertex.
    pub fn connected_components(&self) -> Components<I> {
        let mut component_of = vec![usize::MAX; self.vertices];
        let mut sizes = Vec::new();
        let mut stack = Vec::new();

        for root in 0..self.vertices {
            if component_of[root] != usize::MAX { continue }

            let label = sizes.len();
            let mut size = 0;
            component_of[root] = label;
            stack.push(I::from_index(root));

            while let Some(v) = stack.pop() {
                size += 1;
                for w in self.adjacents(v) {
                    if component_of[w.index()] == usize::MAX {
                        component_of[w.index()] = label;
                        stack.push(w);
                    }
                }
            }
            sizes.push(size);
        }

        Components { component_of, sizes, _id: std::marker::PhantomData }
    }

    /// Restrict the graph to the vertices surviving `map` and renumber them.
    ///
    /// Edges survive only when both endpoints do.
    pub fn remap(&self, map: &IdMap<I>) -> Result<Self, TopologyError> {
        if map.old_len() != self.vertices {
            return Err(TopologyError::MaskLength { mask: map.old_len(), len: self.vertices });
        }
        let edges = self.edges.iter()
            .filter_map(|&(u, v)| Some((map.get(u)?, map.get(v)?)))
            .collect();
        Ok(Self { vertices: map.new_len(), edges })
    }
}

/// Connected-component labelling of an [`UndirectedGraph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Components<I: DenseId = AreaId> {
    component_of: Vec<usize>,
    sizes: Vec<usize>,
    _id: std::marker::PhantomData<I>,
}

impl<I: DenseId> Components<I> {
    /// Number of components.
    #[inline] pub fn len(&self) -> usize { self.sizes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.sizes.is_empty() }

    /// Component label of `v`.
    #[inline] pub fn component(&self, v: I) -> usize { self.component_of[v.index()] }

    /// Per-vertex labels.
    #[inline] pub fn labels(&self) -> &[usize] { &self.component_of }

    /// Vertex count of each component.
    #[inline] pub fn sizes(&self) -> &[usize] { &self.sizes }

    /// Members of every component, each list in ascending order.
    pub fn groups(&self) -> Vec<Vec<I>> {
        let mut groups: Vec<Vec<I>> = self.sizes.iter().map(|&s| Vec::with_capacity(s)).collect();
        for (v, &c) in self.component_of.iter().enumerate() {
            groups[c].push(I::from_index(v));
        }
        groups
    }
}
