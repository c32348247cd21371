pub mod commands;
pub mod programs;

pub use commands::*;
pub use programs::*;
