use thiserror::Error;

/// Invariant violations raised by the buffers and the graph.
///
/// These indicate programmer error: downstream stages assume dense ids and
/// valid references unconditionally, so callers should abort the run rather
/// than attempt to recover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// An entity was appended whose id is not the next free position.
    #[error("{kind} id {found} appended to a buffer of length {expected}")]
    NonDenseId { kind: &'static str, expected: usize, found: usize },

    /// A lookup or reference addressed a position outside the buffer.
    #[error("{kind} id {id} out of range (len {len})")]
    OutOfRange { kind: &'static str, id: usize, len: usize },

    /// An edge from a vertex to itself.
    #[error("self loop on {kind} vertex {id}")]
    SelfLoop { kind: &'static str, id: usize },

    /// A keep mask whose length does not match the buffer it filters.
    #[error("keep mask has {mask} entries for a buffer of length {len}")]
    MaskLength { mask: usize, len: usize },

    /// A ring has fewer than three distinct nodes.
    #[error("ring {ring} has {distinct} distinct nodes, at least 3 required")]
    ShortRing { ring: usize, distinct: usize },

    /// A node remap left a ring with fewer than two nodes.
    #[error("ring {ring} collapsed to {nodes} nodes during reindex")]
    DegenerateRing { ring: usize, nodes: usize },
}
