//! The shipped board files parse and round-trip.

use fluidic::parser::board_parser::{BoardParser, spec_string};

#[test]
fn test_rectangular_fixture() {
    let grid = BoardParser::new().parse_file("boards/01.board").unwrap();
    assert_eq!(grid.len(), 45);
    assert!(grid.is_connected());

    let bounds = grid.bounds().unwrap();
    assert_eq!((bounds.height(), bounds.width()), (5, 9));
}

#[test]
fn test_irregular_fixture() {
    let grid = BoardParser::new().parse_file("boards/02.board").unwrap();
    assert!(grid.is_connected());
    // one heater, labeled pins 0-4 on the top row
    let heaters = grid.iter().filter(|(_, cell)| cell.heater).count();
    assert_eq!(heaters, 1);
}

#[test]
fn test_fixtures_round_trip() {
    let parser = BoardParser::new();
    for path in ["boards/01.board", "boards/02.board"] {
        let grid = parser.parse_file(path).unwrap();
        let reparsed = parser.parse_str(&spec_string(&grid)).unwrap();
        assert_eq!(reparsed, grid, "{} did not round-trip", path);
    }
}
