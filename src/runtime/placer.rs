use std::collections::{BTreeSet, HashMap, HashSet};

use log::trace;

use crate::board::board::Board;
use crate::runtime::command::Command;
use crate::types::error::PlaceError;
use crate::types::ids::CollisionGroup;
use crate::types::location::Location;
use crate::types::shape::Shape;

/// An injective map from command-shape cells to board cells, preserving
/// edges and keeping the command clear of bystanding droplets.
pub type Placement = HashMap<Location, Location>;

pub struct Placer;

impl Placer {
    /// Find where a command may run. Pinned commands skip the search;
    /// strict commands may only translate their shape; everything else
    /// gets the first induced-subgraph-isomorphic embedding.
    pub fn place(board: &Board, command: &Command) -> Result<Placement, PlaceError> {
        if let Some(pins) = command.pinned_mapping() {
            let mut placement = Placement::new();
            for (shape_cell, board_cell) in pins {
                if !board.grid.contains(board_cell) {
                    return Err(PlaceError::PinnedCellMissing(board_cell));
                }
                placement.insert(shape_cell, board_cell);
            }
            return Ok(placement);
        }

        let shape = command.shape();
        let residual = residual_cells(board, command.collision_exemption(board));
        trace!(
            "placing {} ({} cells) into {} residual cells",
            command,
            shape.len(),
            residual.len()
        );

        let placement = if command.strict() {
            place_translated(&shape, &residual)
        } else {
            place_isomorphic(&shape, &residual)
        };
        placement.ok_or(PlaceError::NoPlacement)
    }
}

/// Board cells minus the Chebyshev-1 closure of every Real droplet whose
/// collision group is not exempted. The exemption keeps the command's own
/// inputs' region available.
fn residual_cells(board: &Board, exemption: Option<CollisionGroup>) -> BTreeSet<Location> {
    let mut forbidden: HashSet<Location> = HashSet::new();
    for droplet in board.real_droplets() {
        if Some(droplet.collision_group) == exemption {
            continue;
        }
        let anchor = droplet
            .current_location()
            .expect("real droplet has a location");
        forbidden.extend(droplet.shape.neighborhood(anchor));
    }
    board
        .grid
        .locations()
        .filter(|loc| !forbidden.contains(loc))
        .collect()
}

/// Strict placement: search translations only, no bending. Sorted anchor
/// order makes the result deterministic.
fn place_translated(shape: &Shape, residual: &BTreeSet<Location>) -> Option<Placement> {
    let offsets: Vec<Location> = shape.offsets().collect();
    for &anchor in residual {
        if offsets.iter().all(|&off| residual.contains(&(anchor + off))) {
            return Some(offsets.iter().map(|&off| (off, anchor + off)).collect());
        }
    }
    None
}

/// First match of a backtracking induced-subgraph-isomorphism search from
/// the shape graph into the residual grid graph. Shape cells are assigned
/// in BFS order from the origin so each new cell is adjacent to a placed
/// one.
fn place_isomorphic(shape: &Shape, residual: &BTreeSet<Location>) -> Option<Placement> {
    let order = bfs_order(shape);
    let mut assignment = Placement::new();
    let mut used = HashSet::new();
    if extend(&order, 0, residual, &mut assignment, &mut used) {
        Some(assignment)
    } else {
        None
    }
}

fn bfs_order(shape: &Shape) -> Vec<Location> {
    let cells: BTreeSet<Location> = shape.offsets().collect();
    let mut order = Vec::with_capacity(cells.len());
    let mut seen = HashSet::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(Location::origin());
    seen.insert(Location::origin());
    while let Some(cell) = queue.pop_front() {
        order.push(cell);
        for nbr in cell.neighbors4() {
            if cells.contains(&nbr) && seen.insert(nbr) {
                queue.push_back(nbr);
            }
        }
    }
    order
}

fn extend(
    order: &[Location],
    idx: usize,
    residual: &BTreeSet<Location>,
    assignment: &mut Placement,
    used: &mut HashSet<Location>,
) -> bool {
    if idx == order.len() {
        return true;
    }
    let node = order[idx];

    let candidates: Vec<Location> = if idx == 0 {
        residual.iter().copied().collect()
    } else {
        // some earlier node is shape-adjacent to this one; extend from its image
        let anchor = order[..idx]
            .iter()
            .find(|&&prev| prev.manhattan_distance(node) == 1)
            .expect("BFS order keeps the frontier connected");
        assignment[anchor]
            .neighbors4()
            .into_iter()
            .filter(|cand| residual.contains(cand))
            .collect()
    };

    for cand in candidates {
        if used.contains(&cand) {
            continue;
        }
        // induced: shape edges and non-edges must both be preserved
        let consistent = assignment.iter().all(|(&shape_cell, &board_cell)| {
            let shape_edge = shape_cell.manhattan_distance(node) == 1;
            let board_edge = board_cell.manhattan_distance(cand) == 1;
            shape_edge == board_edge
        });
        if !consistent {
            continue;
        }

        assignment.insert(node, cand);
        used.insert(cand);
        if extend(order, idx + 1, residual, assignment, used) {
            return true;
        }
        assignment.remove(&node);
        used.remove(&cand);
    }
    false
}
