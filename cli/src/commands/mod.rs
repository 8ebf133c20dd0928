pub mod generate;
pub mod levels;
