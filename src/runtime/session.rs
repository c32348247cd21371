use crate::board::board::{Board, StepBarrier};
use crate::board::grid::Grid;
use crate::runtime::command::{Command, Input, Mix, Move, Split};
use crate::runtime::droplet::Droplet;
use crate::runtime::engine::Engine;
use crate::runtime::execution::Execution;
use crate::runtime::router::Router;
use crate::types::error::Result;
use crate::types::ids::DropletId;
use crate::types::location::Location;
use crate::types::shape::Shape;

/// What happens when an observable attribute of a non-Real droplet is
/// read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Flush the droplet's dependency closure, then read. The default.
    #[default]
    Eager,
    /// Fail with a lifecycle error.
    Strict,
}

/// Session-level tunables.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub read_mode: ReadMode,
    pub n_mix_loops: usize,
    pub route_retries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            read_mode: ReadMode::Eager,
            n_mix_loops: 1,
            route_retries: 10,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    pub fn with_n_mix_loops(mut self, n_mix_loops: usize) -> Self {
        self.n_mix_loops = n_mix_loops;
        self
    }

    pub fn with_route_retries(mut self, route_retries: usize) -> Self {
        self.route_retries = route_retries;
        self
    }
}

/// Everything an `input` call can specify about the new droplet.
#[derive(Debug, Clone)]
pub struct InputRequest {
    pub location: Option<Location>,
    pub volume: f64,
    pub concentration: f64,
    pub info: Option<String>,
    pub shape: Shape,
}

impl Default for InputRequest {
    fn default() -> Self {
        InputRequest {
            location: None,
            volume: 1.0,
            concentration: 0.0,
            info: None,
            shape: Shape::singleton(),
        }
    }
}

impl InputRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, location: impl Into<Location>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn concentration(mut self, concentration: f64) -> Self {
        self.concentration = concentration;
        self
    }

    pub fn info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }
}

/// The client API: enqueue chemistry on opaque droplet handles, flush
/// lazily, observe results.
pub struct Session {
    board: Board,
    engine: Engine,
    read_mode: ReadMode,
}

impl Session {
    pub fn new(grid: Grid) -> Self {
        Session::with_config(grid, SessionConfig::default())
    }

    pub fn with_config(grid: Grid, config: SessionConfig) -> Self {
        let execution = Execution::new(Router::new(config.route_retries), config.n_mix_loops);
        Session {
            board: Board::new(grid),
            engine: Engine::new(execution),
            read_mode: config.read_mode,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_barrier(&mut self, barrier: Box<dyn StepBarrier>) {
        self.board.set_barrier(barrier);
    }

    pub fn pending_commands(&self) -> usize {
        self.engine.pending_len()
    }

    /// Enqueue an Input command; returns the virtual droplet handle.
    pub fn input(&mut self, request: InputRequest) -> Result<DropletId> {
        let id = self.board.next_droplet_id();
        let group = self.board.next_collision_group();
        let mut droplet = Droplet::new(id, group)
            .with_volume(request.volume)
            .with_concentration(request.concentration)
            .with_shape(request.shape);
        if let Some(info) = request.info {
            droplet = droplet.with_info(info);
        }
        self.board.register(droplet);

        let command = Command::Input(Input {
            id: self.engine.next_command_id(),
            output: id,
            location: request.location,
            done: false,
        });
        self.enqueue_or_discard(command, &[id])?;
        Ok(id)
    }

    /// Enqueue a Move; the droplet keeps its identity and is at `dest`
    /// once realized.
    pub fn move_droplet(&mut self, droplet: DropletId, dest: impl Into<Location>) -> Result<()> {
        let command = Command::Move(Move {
            id: self.engine.next_command_id(),
            droplet,
            dest: dest.into(),
            done: false,
        });
        self.enqueue_or_discard(command, &[])
    }

    /// Enqueue a Mix of two droplets; returns the virtual result handle.
    pub fn mix(&mut self, a: DropletId, b: DropletId) -> Result<DropletId> {
        let output = self.spawn_virtual();
        let command = Command::Mix(Mix {
            id: self.engine.next_command_id(),
            a,
            b,
            output,
            done: false,
        });
        self.enqueue_or_discard(command, &[output])?;
        Ok(output)
    }

    /// Enqueue a Split; returns the two virtual output handles.
    pub fn split(&mut self, input: DropletId) -> Result<(DropletId, DropletId)> {
        let out_a = self.spawn_virtual();
        let out_b = self.spawn_virtual();
        let command = Command::Split(Split {
            id: self.engine.next_command_id(),
            input,
            out_a,
            out_b,
            done: false,
        });
        self.enqueue_or_discard(command, &[out_a, out_b])?;
        Ok((out_a, out_b))
    }

    /// Force realization of every pending command.
    pub fn flush(&mut self) -> Result<()> {
        self.engine.flush(&mut self.board, None)
    }

    /// Force realization of the commands `droplet` depends on.
    pub fn flush_droplet(&mut self, droplet: DropletId) -> Result<()> {
        self.engine.flush(&mut self.board, Some(droplet))
    }

    pub fn location(&mut self, droplet: DropletId) -> Result<Location> {
        Ok(self.realized(droplet)?.location()?)
    }

    pub fn volume(&mut self, droplet: DropletId) -> Result<f64> {
        Ok(self.realized(droplet)?.observe_volume()?)
    }

    pub fn info(&mut self, droplet: DropletId) -> Result<String> {
        Ok(self.realized(droplet)?.observe_info()?.to_string())
    }

    pub fn concentration(&mut self, droplet: DropletId) -> Result<f64> {
        Ok(self.realized(droplet)?.observe_concentration()?)
    }

    fn spawn_virtual(&mut self) -> DropletId {
        let id = self.board.next_droplet_id();
        let group = self.board.next_collision_group();
        self.board.register(Droplet::new(id, group));
        id
    }

    fn enqueue_or_discard(&mut self, command: Command, fresh_outputs: &[DropletId]) -> Result<()> {
        if let Err(err) = self.engine.enqueue(&mut self.board, command) {
            for &id in fresh_outputs {
                self.board.discard(id);
            }
            return Err(err);
        }
        Ok(())
    }

    fn realized(&mut self, droplet: DropletId) -> Result<&Droplet> {
        // validate the handle first so unknown/consumed reads fail cleanly
        self.board.droplet(droplet)?;
        if self.read_mode == ReadMode::Eager {
            // a Real droplet may still have a pending move in the queue
            self.flush_droplet(droplet)?;
        }
        Ok(self.board.droplet(droplet)?)
    }
}
