use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::board::board::Board;
use crate::runtime::command::Command;
use crate::runtime::execution::Execution;
use crate::types::error::{DropletStateError, Result};
use crate::types::ids::{CommandId, DropletId};

/// The lazy command queue. Enqueueing records dependency edges on the
/// droplets; flushing executes commands in FIFO order, which is a valid
/// topological order because consumers are checked against producers at
/// insertion time.
pub struct Engine {
    pending: VecDeque<Command>,
    execution: Execution,
    next_command: usize,
}

impl Engine {
    pub fn new(execution: Execution) -> Self {
        Engine {
            pending: VecDeque::new(),
            execution,
            next_command: 0,
        }
    }

    pub fn next_command_id(&mut self) -> CommandId {
        let id = CommandId(self.next_command);
        self.next_command += 1;
        id
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queue a command, binding its droplet edges. Nothing is mutated if
    /// validation fails.
    pub fn enqueue(&mut self, board: &mut Board, command: Command) -> Result<()> {
        let inputs = command.input_droplets();
        for (i, &id) in inputs.iter().enumerate() {
            let droplet = board.droplet(id)?;
            if droplet.consumed_by.is_some() || inputs[..i].contains(&id) {
                return Err(DropletStateError::AlreadyBound { id }.into());
            }
        }

        if command.consumes() {
            for id in command.input_droplets() {
                board.droplet_mut(id)?.consumed_by = Some(command.id());
            }
        }
        // a Move re-produces its own input; that edge is rebound when the
        // move applies, not here
        for id in command.output_droplets() {
            let droplet = board.droplet_mut(id)?;
            if droplet.produced_by.is_none() {
                droplet.produced_by = Some(command.id());
            }
        }

        debug!("enqueued {}", command);
        self.pending.push_back(command);
        Ok(())
    }

    /// Execute pending commands. With no target, everything runs; with a
    /// target droplet, only the transitive closure needed to realize it.
    /// A failing command stays queued, as does everything after it.
    pub fn flush(&mut self, board: &mut Board, target: Option<DropletId>) -> Result<()> {
        match target {
            None => self.flush_all(board),
            Some(id) => self.flush_for(board, id),
        }
    }

    fn flush_all(&mut self, board: &mut Board) -> Result<()> {
        while let Some(mut command) = self.pending.pop_front() {
            if let Err(err) = self.execution.run(board, &mut command) {
                self.pending.push_front(command);
                return Err(err);
            }
            debug_assert!(command.is_done());
        }
        Ok(())
    }

    fn flush_for(&mut self, board: &mut Board, target: DropletId) -> Result<()> {
        // backward scan: FIFO order is topological, so walking the queue in
        // reverse sees every consumer before its producers
        let mut needed_droplets: HashSet<DropletId> = HashSet::from([target]);
        let mut needed: HashSet<CommandId> = HashSet::new();
        for command in self.pending.iter().rev() {
            if command
                .output_droplets()
                .iter()
                .any(|id| needed_droplets.contains(id))
            {
                needed.insert(command.id());
                needed_droplets.extend(command.input_droplets());
            }
        }

        let mut i = 0;
        while i < self.pending.len() {
            if needed.contains(&self.pending[i].id()) {
                let mut command = self.pending.remove(i).expect("index in bounds");
                if let Err(err) = self.execution.run(board, &mut command) {
                    self.pending.insert(i, command);
                    return Err(err);
                }
            } else {
                i += 1;
            }
        }
        Ok(())
    }
}
