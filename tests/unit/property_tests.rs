//! Property-based tests using proptest: router correctness on random
//! boards, payload conservation laws, location algebra.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use fluidic::board::board::Board;
use fluidic::board::grid::Grid;
use fluidic::runtime::droplet::Droplet;
use fluidic::runtime::router::Router;
use fluidic::runtime::session::{InputRequest, Session};
use fluidic::types::location::Location;

/// Scatter up to `want` droplets on the grid, pairwise Chebyshev >= 2
/// apart, each with a destination picked the same way.
fn scatter(board: &mut Board, grid: &Grid, want: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cells: Vec<Location> = grid.locations().collect();
    cells.sort();
    cells.shuffle(&mut rng);

    let mut starts: Vec<Location> = Vec::new();
    let mut goals: Vec<Location> = Vec::new();
    for &cell in &cells {
        if starts.len() >= want {
            break;
        }
        if starts.iter().all(|s| s.chebyshev_distance(cell) >= 2) {
            starts.push(cell);
        }
    }
    for &cell in cells.iter().rev() {
        if goals.len() >= starts.len() {
            break;
        }
        if goals.iter().all(|g| g.chebyshev_distance(cell) >= 2) {
            goals.push(cell);
        }
    }

    for (&start, &goal) in starts.iter().zip(goals.iter()) {
        let id = board.next_droplet_id();
        let group = board.next_collision_group();
        let mut droplet = Droplet::new(id, group);
        droplet.realize(start);
        droplet.destination = Some(goal);
        board.add(droplet).expect("scattered droplets are spaced");
    }
}

proptest! {
    #[test]
    fn prop_routed_paths_are_correct(
        h in 5i32..9,
        w in 5i32..9,
        n in 1usize..4,
        seed in any::<u64>(),
    ) {
        let grid = Grid::rectangle(h, w);
        let mut board = Board::new(grid.clone());
        scatter(&mut board, &grid, n, seed);

        let expected: Vec<_> = board
            .real_droplets()
            .map(|d| (d.id, d.current_location().unwrap(), d.destination.unwrap()))
            .collect();

        // congestion may legitimately defeat the sequential router; the
        // law only constrains the paths it does return
        let paths = match Router::default().route(&board) {
            Ok(paths) => paths,
            Err(_) => return Ok(()),
        };

        for (id, start, goal) in &expected {
            let path = &paths[id];
            prop_assert_eq!(*path.first().unwrap(), *start);
            prop_assert_eq!(*path.last().unwrap(), *goal);
            for leg in path.windows(2) {
                prop_assert!(grid.contains(leg[1]));
                prop_assert!(leg[0].manhattan_distance(leg[1]) <= 1);
            }
        }

        // no two droplets ever share a neighborhood at the same step
        let horizon = paths.values().map(|p| p.len()).max().unwrap_or(0);
        let at = |id, t: usize| -> Location {
            let p = &paths[&id];
            *p.get(t).unwrap_or_else(|| p.last().unwrap())
        };
        for (i, (ida, ..)) in expected.iter().enumerate() {
            for (idb, ..) in expected.iter().skip(i + 1) {
                for t in 0..horizon {
                    prop_assert!(
                        at(*ida, t).chebyshev_distance(at(*idb, t)) >= 2,
                        "droplets {} and {} collide at step {}", ida, idb, t
                    );
                }
            }
        }
    }

    #[test]
    fn prop_mix_conserves_mass(
        va in 0.1f64..4.0,
        vb in 0.1f64..4.0,
        ca in 0.0f64..1.0,
        cb in 0.0f64..1.0,
    ) {
        let mut s = Session::new(Grid::rectangle(5, 9));
        let a = s.input(InputRequest::new().at((1, 1)).volume(va).concentration(ca)).unwrap();
        let b = s.input(InputRequest::new().at((3, 1)).volume(vb).concentration(cb)).unwrap();
        let ab = s.mix(a, b).unwrap();
        s.flush().unwrap();

        let v = s.volume(ab).unwrap();
        let c = s.concentration(ab).unwrap();
        prop_assert!((v - (va + vb)).abs() < 1e-9);
        prop_assert!((v * c - (va * ca + vb * cb)).abs() < 1e-9);
    }

    #[test]
    fn prop_split_is_symmetric(
        v in 0.1f64..4.0,
        c in 0.0f64..1.0,
    ) {
        let mut s = Session::new(Grid::rectangle(5, 9));
        let d = s.input(InputRequest::new().at((2, 4)).volume(v).concentration(c)).unwrap();
        let (x, y) = s.split(d).unwrap();
        s.flush().unwrap();

        prop_assert_eq!(s.volume(x).unwrap(), v / 2.0);
        prop_assert_eq!(s.volume(y).unwrap(), v / 2.0);
        prop_assert_eq!(s.concentration(x).unwrap(), c);
        prop_assert_eq!(s.concentration(y).unwrap(), c);
    }

    #[test]
    fn prop_location_metrics(
        y1 in -50i32..50, x1 in -50i32..50,
        y2 in -50i32..50, x2 in -50i32..50,
    ) {
        let a = Location::new(y1, x1);
        let b = Location::new(y2, x2);

        prop_assert_eq!(a.manhattan_distance(b), b.manhattan_distance(a));
        prop_assert_eq!(a.chebyshev_distance(b), b.chebyshev_distance(a));
        // chebyshev never exceeds manhattan
        prop_assert!(a.chebyshev_distance(b) <= a.manhattan_distance(b));
        prop_assert_eq!(a.adjacent_or_same(b), a.chebyshev_distance(b) <= 1);
    }
}
