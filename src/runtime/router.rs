use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, trace, warn};
use rand::seq::SliceRandom;

use crate::board::board::Board;
use crate::board::grid::Grid;
use crate::types::error::RouteError;
use crate::types::ids::{CollisionGroup, DropletId};
use crate::types::location::Location;
use crate::types::shape::Shape;

/// A route: locations indexed by discrete time step. Consecutive entries
/// differ by one grid edge or are equal (a wait).
pub type Path = Vec<Location>;

type Time = u32;
type Cost = u32;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
struct Node {
    location: Location,
    time: Time,
}

/// Snapshot of one droplet as the router sees it.
#[derive(Debug, Clone)]
struct Agent {
    id: DropletId,
    location: Location,
    destination: Location,
    has_destination: bool,
    group: CollisionGroup,
    shape: Shape,
}

/// Multi-agent router: sequential-priority time-expanded A*. Every Real
/// droplet is routed on every call; droplets without a destination are
/// pinned to their own cell but may still step aside along the way.
pub struct Router {
    pub max_tries: usize,
}

impl Default for Router {
    fn default() -> Self {
        Router { max_tries: 10 }
    }
}

impl Router {
    pub fn new(max_tries: usize) -> Self {
        Router { max_tries }
    }

    pub fn route(&self, board: &Board) -> Result<HashMap<DropletId, Path>, RouteError> {
        let mut with_dest: Vec<Agent> = Vec::new();
        let mut without_dest: Vec<Agent> = Vec::new();
        for droplet in board.real_droplets() {
            let location = droplet
                .current_location()
                .expect("real droplet has a location");
            let agent = Agent {
                id: droplet.id,
                location,
                destination: droplet.destination.unwrap_or(location),
                has_destination: droplet.destination.is_some(),
                group: droplet.collision_group,
                shape: droplet.shape.clone(),
            };
            if agent.has_destination {
                with_dest.push(agent);
            } else {
                without_dest.push(agent);
            }
        }

        // easiest first, then the bystanders; ties broken by id for
        // determinism on the first try
        with_dest.sort_by_key(|a| (a.location.manhattan_distance(a.destination), a.id));
        without_dest.sort_by_key(|a| a.id);

        let mut rng = rand::thread_rng();
        for attempt in 0..self.max_tries {
            if attempt > 0 {
                with_dest.shuffle(&mut rng);
                without_dest.shuffle(&mut rng);
            }
            let order: Vec<&Agent> = with_dest.iter().chain(without_dest.iter()).collect();
            match route_attempt(&board.grid, &order) {
                Ok(paths) => {
                    if attempt > 0 {
                        warn!("took {} tries to route", attempt + 1);
                    }
                    return Ok(paths);
                }
                Err(err) => debug!("route attempt {} failed: {}", attempt, err),
            }
        }
        Err(RouteError::RetriesExhausted {
            tries: self.max_tries,
        })
    }
}

fn route_attempt(grid: &Grid, agents: &[&Agent]) -> Result<HashMap<DropletId, Path>, RouteError> {
    let mut avoid = AvoidanceSet::default();
    let mut paths = HashMap::new();
    let mut goal_time: Time = 0;

    for agent in agents {
        trace!(
            "routing {}: {} -> {}",
            agent.id, agent.location, agent.destination
        );
        let path = a_star(grid, agent, goal_time, &avoid).ok_or(RouteError::NoRoute {
            id: agent.id,
            from: agent.location,
            to: agent.destination,
        })?;

        goal_time = goal_time.max((path.len() as Time).saturating_sub(1));
        avoid.reserve_path(&path, &agent.shape, agent.group);
        paths.insert(agent.id, path);
    }
    Ok(paths)
}

/// Shared reservation table across the sequential per-droplet searches.
#[derive(Default)]
struct AvoidanceSet {
    /// (cell, time) -> group that reserved it; a step is legal iff absent
    /// or same-group.
    avoid: HashMap<(Location, Time), CollisionGroup>,
    /// Cells finally occupied (Chebyshev closure of a finished path's
    /// end): queries at any time are redirected to the final time.
    finals: HashMap<Location, Time>,
    max_time: Time,
}

impl AvoidanceSet {
    fn is_legal(&self, shape: &Shape, anchor: Location, time: Time, group: CollisionGroup) -> bool {
        shape.cells_at(anchor).all(|cell| {
            let t = self.finals.get(&cell).copied().unwrap_or(time);
            self.avoid.get(&(cell, t)).is_none_or(|&g| g == group)
        })
    }

    /// Would a later-arriving reservation cross this spot after `time`?
    /// Ending here would park the droplet in someone's way.
    fn would_finally_collide(
        &self,
        shape: &Shape,
        anchor: Location,
        time: Time,
        group: CollisionGroup,
    ) -> bool {
        shape.cells_at(anchor).any(|cell| {
            (time + 1..=self.max_time)
                .any(|t| self.avoid.get(&(cell, t)).is_some_and(|&g| g != group))
        })
    }

    /// Reserve the Chebyshev-1 closure of every path cell at times
    /// {t-1, t, t+1}; diagonal swaps are forbidden by the closure.
    fn reserve_path(&mut self, path: &Path, shape: &Shape, group: CollisionGroup) {
        for (i, &loc) in path.iter().enumerate() {
            for t in i.saturating_sub(1)..=i + 1 {
                for nbr in shape.neighborhood(loc) {
                    self.avoid.insert((nbr, t as Time), group);
                }
            }
        }

        let last = path.len() - 1;
        for nbr in shape.neighborhood(path[last]) {
            self.finals.insert(nbr, last as Time);
        }
        self.max_time = self.max_time.max(last as Time);
    }
}

/// Time-expanded A* for one droplet. Nodes are (location, t); neighbors
/// are grid moves at t+1 plus a wait, and waiting is disallowed once t has
/// passed the global goal-time watermark, forcing convergence.
fn a_star(grid: &Grid, agent: &Agent, goal_time: Time, avoid: &AvoidanceSet) -> Option<Path> {
    let max_time = grid.len() as Time + goal_time;
    let dest = agent.destination;

    let start = Node {
        location: agent.location,
        time: 0,
    };

    let mut todo: BinaryHeap<Reverse<(Cost, u32, Node)>> = BinaryHeap::new();
    let mut best: HashMap<Node, Cost> = HashMap::new();
    let mut came_from: HashMap<Node, Node> = HashMap::new();
    let mut closed: HashSet<Node> = HashSet::new();
    let mut counter: u32 = 0; // stable tie-break

    todo.push(Reverse((
        start.location.manhattan_distance(dest),
        counter,
        start,
    )));
    best.insert(start, 0);

    while let Some(Reverse((_, _, node))) = todo.pop() {
        if node.location == dest
            && node.time >= goal_time
            && !avoid.would_finally_collide(&agent.shape, node.location, node.time, agent.group)
        {
            return Some(build_path(&came_from, node));
        }

        if !closed.insert(node) || node.time > max_time {
            continue;
        }
        let node_cost = best[&node];

        let mut next_nodes: Vec<(Cost, Node)> = grid
            .neighbors4(node.location)
            .into_iter()
            .filter(|&nbr| agent.shape.cells_at(nbr).all(|cell| grid.contains(cell)))
            .map(|nbr| {
                (
                    1,
                    Node {
                        location: nbr,
                        time: node.time + 1,
                    },
                )
            })
            .collect();
        if node.time <= goal_time {
            // waiting is free while the fleet is still converging
            next_nodes.push((
                0,
                Node {
                    location: node.location,
                    time: node.time + 1,
                },
            ));
        }

        for (edge_cost, next) in next_nodes {
            if closed.contains(&next) {
                continue;
            }
            if !avoid.is_legal(&agent.shape, next.location, next.time, agent.group) {
                continue;
            }

            let next_cost = node_cost + edge_cost;
            let better = best.get(&next).is_none_or(|&old| next_cost < old);
            if better {
                best.insert(next, next_cost);
                came_from.insert(next, node);
                counter += 1;
                todo.push(Reverse((
                    next_cost + next.location.manhattan_distance(dest),
                    counter,
                    next,
                )));
            }
        }
    }

    None
}

fn build_path(came_from: &HashMap<Node, Node>, end: Node) -> Path {
    let mut path = vec![end.location];
    let mut current = end;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev.location);
        current = prev;
    }
    path.reverse();
    path
}
