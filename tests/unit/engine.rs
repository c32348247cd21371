//! Queue discipline: dependency edges, laziness bookkeeping, payload laws.

use fluidic::board::grid::Grid;
use fluidic::runtime::session::{InputRequest, Session};

fn session() -> Session {
    Session::new(Grid::rectangle(5, 9))
}

#[test]
fn test_outputs_stay_virtual_until_flush() {
    let mut s = session();
    let a = s.input(InputRequest::new().at((1, 1))).unwrap();
    let b = s.input(InputRequest::new().at((3, 1))).unwrap();
    let ab = s.mix(a, b).unwrap();

    assert!(!s.board().droplet(ab).unwrap().is_real());
    s.flush().unwrap();
    assert!(s.board().droplet(ab).unwrap().is_real());
}

#[test]
fn test_dependency_edges_are_bound_at_enqueue() {
    let mut s = session();
    let a = s.input(InputRequest::new().at((1, 1))).unwrap();
    let b = s.input(InputRequest::new().at((3, 1))).unwrap();
    let ab = s.mix(a, b).unwrap();

    let board = s.board();
    assert!(board.droplet(a).unwrap().produced_by.is_some());
    assert!(board.droplet(a).unwrap().consumed_by.is_some());
    assert!(board.droplet(ab).unwrap().produced_by.is_some());
    assert!(board.droplet(ab).unwrap().consumed_by.is_none());
}

#[test]
fn test_move_is_non_consuming() {
    let mut s = session();
    let a = s.input(InputRequest::new().at((1, 1))).unwrap();
    let b = s.input(InputRequest::new().at((3, 1))).unwrap();

    s.move_droplet(a, (1, 5)).unwrap();
    // a pending move does not block a later consumer
    let ab = s.mix(a, b).unwrap();
    s.flush().unwrap();

    assert!(s.board().droplet(ab).unwrap().is_real());
    assert_eq!(s.board().real_droplets().count(), 1);
}

#[test]
fn test_move_rebinds_the_producer_edge() {
    let mut s = session();
    let a = s.input(InputRequest::new().at((1, 1))).unwrap();
    let produced_by_input = {
        s.flush().unwrap();
        s.board().droplet(a).unwrap().produced_by.unwrap()
    };

    s.move_droplet(a, (4, 4)).unwrap();
    s.flush().unwrap();

    let produced_by_move = s.board().droplet(a).unwrap().produced_by.unwrap();
    assert_ne!(produced_by_input, produced_by_move);
    assert!(s.board().droplet(a).unwrap().consumed_by.is_none());
}

#[test]
fn test_mix_payload_laws() {
    let mut s = session();
    let a = s
        .input(InputRequest::new().at((1, 1)).volume(1.5).concentration(0.2).info("a"))
        .unwrap();
    let b = s
        .input(InputRequest::new().at((3, 1)).volume(2.5).concentration(0.6).info("b"))
        .unwrap();
    let ab = s.mix(a, b).unwrap();
    s.flush().unwrap();

    let volume = s.volume(ab).unwrap();
    let concentration = s.concentration(ab).unwrap();
    assert_eq!(volume, 4.0);
    assert!((volume * concentration - (1.5 * 0.2 + 2.5 * 0.6)).abs() < 1e-12);
    assert_eq!(s.info(ab).unwrap(), "(a, b)");
}

#[test]
fn test_split_payload_laws() {
    let mut s = session();
    let d = s
        .input(InputRequest::new().at((2, 2)).volume(3.0).concentration(0.4).info("d"))
        .unwrap();
    let (x, y) = s.split(d).unwrap();
    s.flush().unwrap();

    assert_eq!(s.volume(x).unwrap(), 1.5);
    assert_eq!(s.volume(y).unwrap(), 1.5);
    assert_eq!(s.concentration(x).unwrap(), 0.4);
    assert_eq!(s.concentration(y).unwrap(), 0.4);
    assert_eq!(s.info(x).unwrap(), "d");
    assert_eq!(s.info(y).unwrap(), "d");
}

#[test]
fn test_split_outputs_end_in_distinct_groups() {
    let mut s = session();
    let d = s.input(InputRequest::new().at((2, 2))).unwrap();
    let (x, y) = s.split(d).unwrap();
    s.flush().unwrap();

    let gx = s.board().droplet(x).unwrap().collision_group;
    let gy = s.board().droplet(y).unwrap().collision_group;
    assert_ne!(gx, gy);
    // and they really are apart: the 1x5 line put 4 cells between them
    let lx = s.location(x).unwrap();
    let ly = s.location(y).unwrap();
    assert!(lx.chebyshev_distance(ly) >= 2);
}

#[test]
fn test_destinations_clear_after_each_command() {
    let mut s = session();
    let a = s.input(InputRequest::new().at((1, 1))).unwrap();
    let b = s.input(InputRequest::new().at((3, 1))).unwrap();
    let _ab = s.mix(a, b).unwrap();
    s.flush().unwrap();

    for droplet in s.board().droplets() {
        assert!(droplet.destination.is_none());
    }
}
