pub mod board_parser;

pub use board_parser::*;
