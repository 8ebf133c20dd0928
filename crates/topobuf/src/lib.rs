//! Dense arena storage for boundary topology.
//!
//! Nodes, rings and areas live in [`Buffer`]s addressed by typed ids equal to
//! their position. Removing entries goes through [`Buffer::reindex`], which
//! hands back an [`IdMap`] that every dependent structure (rings, areas,
//! graphs) is remapped through before the old buffer is discarded.

pub mod buffer;
pub mod entity;
pub mod error;
pub mod graph;
pub mod ids;

pub use buffer::{Buffer, Entity, IdMap};
pub use entity::{Area, Node, Ring};
pub use error::TopologyError;
pub use graph::{Components, UndirectedGraph};
pub use ids::{AreaId, DenseId, NodeId, RingId};

pub type NodeBuffer = Buffer<Node>;
pub type RingBuffer = Buffer<Ring>;
pub type AreaBuffer = Buffer<Area>;
