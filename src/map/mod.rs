//! The output model: territories, bonuses and super bonuses in canvas space.

mod armies;
mod builder;
mod entity;
mod map;

pub use armies::ArmyCalculator;
pub use builder::MapBuilder;
pub use entity::{Bonus, SuperBonus, Territory};
pub use map::Map;
