//! Placement against real boards and commands: the isomorphism law, the
//! clear-neighborhood rule, strictness, pinning.

use fluidic::board::board::Board;
use fluidic::board::grid::Grid;
use fluidic::runtime::command::{Command, Input, Mix, Split};
use fluidic::runtime::droplet::Droplet;
use fluidic::runtime::placer::Placer;
use fluidic::types::error::PlaceError;
use fluidic::types::ids::{CommandId, DropletId};
use fluidic::types::location::Location;

fn add_real(board: &mut Board, loc: Location) -> DropletId {
    let id = board.next_droplet_id();
    let group = board.next_collision_group();
    let mut droplet = Droplet::new(id, group);
    droplet.realize(loc);
    board.add(droplet).unwrap();
    id
}

fn register_virtual(board: &mut Board) -> DropletId {
    let id = board.next_droplet_id();
    let group = board.next_collision_group();
    board.register(Droplet::new(id, group));
    id
}

fn mix_command(board: &mut Board, a: DropletId, b: DropletId) -> Command {
    let output = register_virtual(board);
    Command::Mix(Mix {
        id: CommandId(0),
        a,
        b,
        output,
        done: false,
    })
}

#[test]
fn test_mix_placement_round_trips_the_shape() {
    let mut board = Board::new(Grid::rectangle(5, 9));
    let a = add_real(&mut board, Location::new(1, 1));
    let b = add_real(&mut board, Location::new(3, 1));
    let command = mix_command(&mut board, a, b);

    let placement = Placer::place(&board, &command).unwrap();
    assert_eq!(placement.len(), 6);

    // injective onto board cells
    let mut images: Vec<Location> = placement.values().copied().collect();
    images.sort();
    images.dedup();
    assert_eq!(images.len(), 6);
    for &cell in &images {
        assert!(board.grid.contains(cell));
    }

    // the induced subgraph is isomorphic to the 2x3 grid: edges and
    // non-edges both survive the mapping
    for (&sa, &ba) in &placement {
        for (&sb, &bb) in &placement {
            assert_eq!(
                sa.manhattan_distance(sb) == 1,
                ba.manhattan_distance(bb) == 1,
                "mapping broke an edge: {} -> {}, {} -> {}",
                sa,
                ba,
                sb,
                bb
            );
        }
    }
}

#[test]
fn test_placement_keeps_clear_of_bystanders() {
    let mut board = Board::new(Grid::rectangle(5, 9));
    let a = add_real(&mut board, Location::new(1, 1));
    let b = add_real(&mut board, Location::new(3, 1));
    let bystander = add_real(&mut board, Location::new(2, 6));
    let command = mix_command(&mut board, a, b);

    let placement = Placer::place(&board, &command).unwrap();
    let obstacle = board
        .droplet(bystander)
        .unwrap()
        .location()
        .unwrap();
    for &cell in placement.values() {
        assert!(
            cell.chebyshev_distance(obstacle) >= 2,
            "placed {} too close to bystander at {}",
            cell,
            obstacle
        );
    }
}

#[test]
fn test_placement_may_use_the_inputs_own_region() {
    let mut board = Board::new(Grid::rectangle(5, 9));
    let a = add_real(&mut board, Location::new(1, 1));
    let b = add_real(&mut board, Location::new(3, 1));
    // unify groups the way mix does before placing
    let group = board.droplet(a).unwrap().collision_group;
    board.droplet_mut(b).unwrap().collision_group = group;
    let command = mix_command(&mut board, a, b);

    // exempted inputs are not obstacles: the whole board is available
    let placement = Placer::place(&board, &command).unwrap();
    assert_eq!(placement.len(), 6);
}

#[test]
fn test_strict_split_gets_a_straight_line() {
    let mut board = Board::new(Grid::rectangle(5, 9));
    let d = add_real(&mut board, Location::new(2, 4));
    let out_a = register_virtual(&mut board);
    let out_b = register_virtual(&mut board);
    let command = Command::Split(Split {
        id: CommandId(0),
        input: d,
        out_a,
        out_b,
        done: false,
    });

    let placement = Placer::place(&board, &command).unwrap();
    let cells: Vec<Location> = (0..5)
        .map(|x| placement[&Location::new(0, x)])
        .collect();
    for pair in cells.windows(2) {
        assert_eq!(pair[0].y, pair[1].y, "strict line must not bend");
        assert_eq!(pair[1].x - pair[0].x, 1);
    }
}

#[test]
fn test_pinned_placement_is_identity() {
    let mut board = Board::new(Grid::rectangle(5, 9));
    let output = register_virtual(&mut board);
    let command = Command::Input(Input {
        id: CommandId(0),
        output,
        location: Some(Location::new(2, 7)),
        done: false,
    });

    let placement = Placer::place(&board, &command).unwrap();
    assert_eq!(placement.len(), 1);
    assert_eq!(placement[&Location::origin()], Location::new(2, 7));
}

#[test]
fn test_pinned_placement_requires_a_cell() {
    let mut board = Board::new(Grid::rectangle(3, 3));
    let output = register_virtual(&mut board);
    let command = Command::Input(Input {
        id: CommandId(0),
        output,
        location: Some(Location::new(9, 9)),
        done: false,
    });

    assert_eq!(
        Placer::place(&board, &command).unwrap_err(),
        PlaceError::PinnedCellMissing(Location::new(9, 9))
    );
}

#[test]
fn test_no_placement_on_a_full_board() {
    // a 2x3 board cannot host a 2x3 mixer once a foreign droplet blocks it
    let mut board = Board::new(Grid::rectangle(2, 3));
    let a = add_real(&mut board, Location::new(0, 0));
    let b = register_virtual(&mut board);
    let _blocker = add_real(&mut board, Location::new(0, 2));
    let command = mix_command(&mut board, a, b);

    assert_eq!(
        Placer::place(&board, &command).unwrap_err(),
        PlaceError::NoPlacement
    );
}
