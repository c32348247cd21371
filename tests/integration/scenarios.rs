//! The canonical end-to-end programs, each on a 5x9 rectangular board.

use fluidic::board::grid::Grid;
use fluidic::runtime::session::{InputRequest, Session};
use fluidic::types::error::FluidicError;
use fluidic::types::location::Location;

fn session() -> Session {
    Session::new(Grid::rectangle(5, 9))
}

#[test]
fn test_simple_mix() {
    let mut session = session();

    let a = session.input(InputRequest::new().at((1, 1)).info("a")).unwrap();
    let b = session.input(InputRequest::new().at((3, 1)).info("b")).unwrap();
    let ab = session.mix(a, b).unwrap();
    session.flush().unwrap();

    assert_eq!(session.info(ab).unwrap(), "(a, b)");
    assert_eq!(session.volume(ab).unwrap(), 2.0);
    assert_eq!(session.board().real_droplets().count(), 1);
}

#[test]
fn test_chain_mix_split() {
    let mut session = session();

    let a = session.input(InputRequest::new().at((1, 1)).info("a")).unwrap();
    let b = session.input(InputRequest::new().at((3, 1)).info("b")).unwrap();
    let c = session.input(InputRequest::new().at((4, 3)).info("c")).unwrap();

    let ab = session.mix(a, b).unwrap();
    let (ab1, ab2) = session.split(ab).unwrap();
    let abc = session.mix(ab1, c).unwrap();
    let ababc = session.mix(abc, ab2).unwrap();
    session.flush().unwrap();

    assert_eq!(session.board().real_droplets().count(), 1);
    // all four volumes ended up in the one droplet
    assert_eq!(session.volume(ababc).unwrap(), 3.0);
    assert_eq!(session.info(ababc).unwrap(), "(((a, b), c), (a, b))");
}

#[test]
fn test_collision_on_input() {
    let mut session = session();

    let a = session.input(InputRequest::new().at((3, 1))).unwrap();
    session.flush().unwrap();

    let _b = session.input(InputRequest::new().at((3, 2))).unwrap();
    let err = session.flush().unwrap_err();
    assert!(matches!(err, FluidicError::Collision(_)), "got {:?}", err);

    // the board keeps its last known-good state and the command its place
    // in the queue
    assert_eq!(session.board().real_droplets().count(), 1);
    assert_eq!(session.location(a).unwrap(), Location::new(3, 1));
    assert_eq!(session.pending_commands(), 1);
}

#[test]
fn test_move_preserves_identity() {
    let mut session = session();

    let d = session.input(InputRequest::new().at((1, 1)).info("d")).unwrap();
    session.move_droplet(d, (4, 4)).unwrap();
    session.flush().unwrap();

    // same handle, new location
    assert_eq!(session.location(d).unwrap(), Location::new(4, 4));
    assert_eq!(session.info(d).unwrap(), "d");
    assert_eq!(session.board().real_droplets().count(), 1);
}

#[test]
fn test_dilution_convergence() {
    let target = 0.25;
    let epsilon = 0.1;
    let mut session = session();

    let water = session
        .input(InputRequest::new().concentration(0.0).info("w"))
        .unwrap();
    let reagent = session
        .input(InputRequest::new().concentration(1.0).info("r"))
        .unwrap();
    let first = session.mix(water, reagent).unwrap();
    let (mut sample, _rest) = session.split(first).unwrap();

    let mut converged = false;
    for _round in 0..50 {
        let c = session.concentration(sample).unwrap();
        if (c - target).abs() < epsilon {
            converged = true;
            break;
        }
        let stock = if c < target {
            session.input(InputRequest::new().concentration(1.0).info("r"))
        } else {
            session.input(InputRequest::new().concentration(0.0).info("w"))
        }
        .unwrap();
        let mixed = session.mix(sample, stock).unwrap();
        let (kept, _rest) = session.split(mixed).unwrap();
        sample = kept;
    }

    assert!(converged, "dilution did not reach the target band");
    let c = session.concentration(sample).unwrap();
    assert!((c - target).abs() < epsilon);
    // splits keep the working volume constant
    assert_eq!(session.volume(sample).unwrap(), 1.0);
}

#[test]
fn test_multi_agent_lanes() {
    let mut session = session();

    let mut inputs = Vec::new();
    for i in 0..5 {
        inputs.push(session.input(InputRequest::new().at((0, 2 * i))).unwrap());
    }

    let ab = session.mix(inputs[0], inputs[1]).unwrap();
    let (ab1, ab2) = session.split(ab).unwrap();
    let cd = session.mix(inputs[2], inputs[3]).unwrap();
    let (cd1, cd2) = session.split(cd).unwrap();
    let x = session.mix(ab1, cd1).unwrap();
    let (x1, _x2) = session.split(x).unwrap();
    let y = session.mix(ab2, inputs[4]).unwrap();
    let (_y1, _y2) = session.split(y).unwrap();
    let z = session.mix(cd2, x1).unwrap();
    let (_z1, _z2) = session.split(z).unwrap();

    session.flush().unwrap();

    assert!(session.board().check_collisions().is_ok());
    assert_eq!(session.board().real_droplets().count(), 5);
    assert_eq!(session.pending_commands(), 0);
}
