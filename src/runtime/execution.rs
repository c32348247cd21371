use std::collections::HashMap;

use log::debug;

use crate::board::board::{ActiveCommand, Board};
use crate::runtime::command::Command;
use crate::runtime::placer::Placer;
use crate::runtime::router::{Path, Router};
use crate::types::error::{ExecutionError, Result};
use crate::types::ids::{CollisionGroup, DropletId};
use crate::types::location::Location;

/// Runs one command through the place -> route -> step -> apply pipeline.
pub struct Execution {
    pub router: Router,
    pub n_mix_loops: usize,
}

impl Execution {
    pub fn new(router: Router, n_mix_loops: usize) -> Self {
        Execution { router, n_mix_loops }
    }

    pub fn run(&self, board: &mut Board, command: &mut Command) -> Result<()> {
        debug!("executing {}", command);

        // snapshot positions and collision groups before anything mutates,
        // so a failed command leaves the board in its last known-good state
        let snapshot: Vec<(DropletId, Option<Location>, CollisionGroup)> = board
            .droplets()
            .map(|d| (d.id, d.current_location(), d.collision_group))
            .collect();

        let result = self.place_and_run(board, command);

        if result.is_err() {
            // commands sequence every fallible step before consuming their
            // inputs, so on failure each snapshotted droplet is still here
            for (id, location, group) in snapshot {
                let droplet = board
                    .droplet_mut(id)
                    .expect("nothing is consumed before a command fails");
                droplet.destination = None;
                droplet.collision_group = group;
                match (location, droplet.current_location()) {
                    (Some(location), Some(_)) => droplet.relocate(location),
                    (None, Some(_)) => droplet.unrealize(),
                    _ => {}
                }
            }
        }
        result
    }

    fn place_and_run(&self, board: &mut Board, command: &mut Command) -> Result<()> {
        // group adjustments first: the placer's exemption must already
        // cover every input of the command
        command.pre_route(board);

        let placement = Placer::place(board, command).map_err(|source| ExecutionError::Placement {
            command: command.name(),
            source,
        })?;

        board.push_command(ActiveCommand {
            id: command.id(),
            name: command.name(),
            cells: placement.values().copied().collect(),
        });

        let result = self.run_placed(board, command, &placement);
        board.pop_command();
        result
    }

    fn run_placed(
        &self,
        board: &mut Board,
        command: &mut Command,
        placement: &HashMap<Location, Location>,
    ) -> Result<()> {
        for (id, shape_loc) in command
            .input_droplets()
            .into_iter()
            .zip(command.input_locations())
        {
            let dest = placement[&shape_loc];
            board.droplet_mut(id)?.destination = Some(dest);
        }

        let paths = self
            .router
            .route(board)
            .map_err(|source| ExecutionError::Routing {
                command: command.name(),
                source,
            })?;

        step_droplets(board, &paths)?;

        command.apply(board, placement, self.n_mix_loops)?;

        // destinations are only meaningful inside a command; on the way
        // out each must have been reached
        for id in board.droplet_ids() {
            let droplet = board.droplet_mut(id).expect("registered droplet");
            if let Some(dest) = droplet.destination.take() {
                assert_eq!(
                    Some(dest),
                    droplet.current_location(),
                    "droplet {} did not reach its destination",
                    id
                );
            }
        }
        Ok(())
    }
}

/// Advance every droplet along its path in lockstep: all droplets take
/// step i before any takes step i+1, with a board wait at each boundary.
fn step_droplets(board: &mut Board, paths: &HashMap<DropletId, Path>) -> Result<()> {
    let max_len = paths.values().map(|p| p.len()).max().unwrap_or(0);
    let mut ids: Vec<DropletId> = paths.keys().copied().collect();
    ids.sort();

    for t in 1..max_len {
        for &id in &ids {
            let path = &paths[&id];
            if t < path.len() {
                board.move_droplet(id, path[t]);
            }
        }
        board.wait()?;
    }
    Ok(())
}
