pub mod board;
pub mod grid;

pub use board::*;
pub use grid::*;
