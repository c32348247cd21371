use std::fmt;

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::board::grid::Grid;
use crate::runtime::droplet::Droplet;
use crate::types::error::{CollisionError, DropletStateError};
use crate::types::ids::{CollisionGroup, CommandId, DropletId};
use crate::types::location::Location;

/// The visualization seam. When installed, the board calls `step_boundary`
/// after every physical step, while the droplet registry is consistent; an
/// implementation may block until an external reader releases it.
pub trait StepBarrier {
    fn step_boundary(&self, board: &Board);
}

/// A command currently being executed, exposed for introspection and
/// visualization.
#[derive(Debug, Clone)]
pub struct ActiveCommand {
    pub id: CommandId,
    pub name: &'static str,
    pub cells: Vec<Location>,
}

/// The single mutable resource of the engine: the grid graph plus the
/// droplet registry. Owns every non-consumed droplet by id; commands refer
/// to droplets by id only.
pub struct Board {
    pub grid: Grid,
    droplets: HashMap<DropletId, Droplet>,
    consumed: HashSet<DropletId>,
    active_commands: Vec<ActiveCommand>,
    barrier: Option<Box<dyn StepBarrier>>,
    next_droplet: usize,
    next_group: usize,
}

impl Board {
    pub fn new(grid: Grid) -> Self {
        Board {
            grid,
            droplets: HashMap::new(),
            consumed: HashSet::new(),
            active_commands: Vec::new(),
            barrier: None,
            next_droplet: 0,
            next_group: 0,
        }
    }

    pub fn next_droplet_id(&mut self) -> DropletId {
        let id = DropletId(self.next_droplet);
        self.next_droplet += 1;
        id
    }

    pub fn next_collision_group(&mut self) -> CollisionGroup {
        let group = CollisionGroup(self.next_group);
        self.next_group += 1;
        group
    }

    /// Register a droplet without a collision check; used for virtual
    /// droplets, which occupy no cells yet.
    pub fn register(&mut self, droplet: Droplet) {
        assert!(!droplet.is_real(), "use add() for realized droplets");
        let was_there = self.droplets.insert(droplet.id, droplet);
        assert!(was_there.is_none(), "droplet registered twice");
    }

    /// Insert a droplet. A Real droplet must sit on board cells and pass
    /// the collision check; on failure the insertion is rolled back.
    pub fn add(&mut self, droplet: Droplet) -> Result<(), CollisionError> {
        let id = droplet.id;
        for cell in droplet.cells() {
            assert!(self.grid.contains(cell), "droplet {} off the grid at {}", id, cell);
        }
        let was_there = self.droplets.insert(id, droplet);
        assert!(was_there.is_none(), "droplet added twice");

        if let Err(collision) = self.check_collisions() {
            self.droplets.remove(&id);
            return Err(collision);
        }
        Ok(())
    }

    /// Virtual -> Real transition with the same rollback discipline as
    /// `add`.
    pub fn realize_at(&mut self, id: DropletId, location: Location) -> Result<(), CollisionError> {
        let snapshot = self
            .droplets
            .get(&id)
            .expect("realizing unknown droplet")
            .clone();

        let droplet = self.droplets.get_mut(&id).expect("droplet vanished");
        droplet.realize(location);
        for cell in self.droplets[&id].cells() {
            assert!(self.grid.contains(cell), "droplet {} off the grid at {}", id, cell);
        }

        if let Err(collision) = self.check_collisions() {
            // roll back to the last known-good state
            self.droplets.insert(id, snapshot);
            return Err(collision);
        }
        Ok(())
    }

    /// Remove a droplet entirely; precondition membership.
    pub fn remove(&mut self, id: DropletId) -> Droplet {
        self.droplets
            .remove(&id)
            .unwrap_or_else(|| panic!("tried to remove non-existent droplet {}", id))
    }

    /// Consume a droplet: drop it from the registry, remembering the id so
    /// later reads report the lifecycle error rather than "unknown".
    pub fn consume(&mut self, id: DropletId) -> Droplet {
        let mut droplet = self.remove(id);
        droplet.consume();
        self.consumed.insert(id);
        debug!("consumed {}", droplet);
        droplet
    }

    /// Forget an orphaned virtual droplet (its command never enqueued).
    pub fn discard(&mut self, id: DropletId) {
        self.droplets.remove(&id);
    }

    pub fn droplet(&self, id: DropletId) -> Result<&Droplet, DropletStateError> {
        match self.droplets.get(&id) {
            Some(droplet) => Ok(droplet),
            None if self.consumed.contains(&id) => Err(DropletStateError::Consumed { id }),
            None => Err(DropletStateError::Unknown { id }),
        }
    }

    pub fn droplet_mut(&mut self, id: DropletId) -> Result<&mut Droplet, DropletStateError> {
        match self.droplets.get_mut(&id) {
            Some(droplet) => Ok(droplet),
            None if self.consumed.contains(&id) => Err(DropletStateError::Consumed { id }),
            None => Err(DropletStateError::Unknown { id }),
        }
    }

    pub fn droplets(&self) -> impl Iterator<Item = &Droplet> {
        self.droplets.values()
    }

    pub fn real_droplets(&self) -> impl Iterator<Item = &Droplet> {
        self.droplets.values().filter(|d| d.is_real())
    }

    pub fn droplet_ids(&self) -> Vec<DropletId> {
        let mut ids: Vec<_> = self.droplets.keys().copied().collect();
        ids.sort();
        ids
    }

    /// The Real droplet covering `loc`, if any. Linear scan; boards are
    /// small.
    pub fn get_at(&self, loc: Location) -> Option<DropletId> {
        self.real_droplets()
            .find(|d| d.cells().contains(&loc))
            .map(|d| d.id)
    }

    /// Advance a Real droplet by at most one cardinal step (or a wait).
    pub fn move_droplet(&mut self, id: DropletId, location: Location) {
        let droplet = self
            .droplets
            .get_mut(&id)
            .unwrap_or_else(|| panic!("tried to move non-existent droplet {}", id));
        let from = droplet.location().expect("moving an unrealized droplet");
        assert!(
            from.manhattan_distance(location) <= 1,
            "droplet {} cannot jump {} -> {}",
            id,
            from,
            location
        );
        droplet.relocate(location);
        for cell in self.droplets[&id].cells() {
            assert!(self.grid.contains(cell), "droplet {} off the grid at {}", id, cell);
        }
    }

    /// Invariant #1: no two Real droplets of different collision groups
    /// within Chebyshev distance 1 of each other's cells.
    pub fn check_collisions(&self) -> Result<(), CollisionError> {
        let reals: Vec<&Droplet> = self.real_droplets().collect();
        for (i, d1) in reals.iter().enumerate() {
            for d2 in reals.iter().skip(i + 1) {
                if d1.collision_group == d2.collision_group {
                    continue;
                }
                let a1 = d1.current_location().expect("real droplet has a location");
                let a2 = d2.current_location().expect("real droplet has a location");
                if d1.shape.collides_with(a1, &d2.shape, a2) {
                    return Err(CollisionError { a: d1.id, b: d2.id });
                }
            }
        }
        Ok(())
    }

    /// Collision check, then yield to the step barrier if one is
    /// installed. Called between every pair of physical steps.
    pub fn wait(&self) -> Result<(), CollisionError> {
        self.check_collisions()?;
        if let Some(barrier) = &self.barrier {
            barrier.step_boundary(self);
        }
        Ok(())
    }

    pub fn set_barrier(&mut self, barrier: Box<dyn StepBarrier>) {
        self.barrier = Some(barrier);
    }

    pub fn clear_barrier(&mut self) {
        self.barrier = None;
    }

    pub fn push_command(&mut self, command: ActiveCommand) {
        self.active_commands.push(command);
    }

    pub fn pop_command(&mut self) -> Option<ActiveCommand> {
        self.active_commands.pop()
    }

    pub fn active_commands(&self) -> &[ActiveCommand] {
        &self.active_commands
    }
}

impl fmt::Display for Board {
    /// Dotted-grid rendering with one glyph per droplet, for traces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bounds = match self.grid.bounds() {
            Some(bounds) => bounds,
            None => return Ok(()),
        };
        for y in bounds.min_y..=bounds.max_y {
            for x in bounds.min_x..=bounds.max_x {
                let loc = Location::new(y, x);
                let glyph = if !self.grid.contains(loc) {
                    ' '
                } else {
                    match self.get_at(loc) {
                        Some(id) => {
                            let droplet = &self.droplets[&id];
                            droplet.info.chars().next().unwrap_or('*')
                        }
                        None => '.',
                    }
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
