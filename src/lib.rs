#![doc = "Mapforge public API"]
pub mod center;
pub mod compressor;
pub mod config;
pub mod filter;
pub mod geom;
pub mod hierarchy;
pub mod input;
pub mod inspector;
pub mod map;
pub mod pipeline;
pub mod projection;
pub mod topology;

#[doc(inline)]
pub use config::{Adjacency, ArmyConfig, MapConfig, ProjectionKind};

#[doc(inline)]
pub use input::BoundaryData;

#[doc(inline)]
pub use map::{Bonus, Map, SuperBonus, Territory};

#[doc(inline)]
pub use pipeline::{run, Summary};

#[doc(inline)]
pub use topology::Topology;
