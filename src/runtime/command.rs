use std::fmt;

use log::debug;

use crate::board::board::Board;
use crate::runtime::placer::Placement;
use crate::types::error::Result;
use crate::types::ids::{CollisionGroup, CommandId, DropletId};
use crate::types::location::Location;
use crate::types::shape::Shape;

/// The cycle a freshly mixed droplet walks around the 2x3 mix region; one
/// full lap shears the merged volumes together.
const MIX_LOOP: [Location; 7] = [
    Location::new(0, 0),
    Location::new(1, 0),
    Location::new(1, 1),
    Location::new(1, 2),
    Location::new(0, 2),
    Location::new(0, 1),
    Location::new(0, 0),
];

/// Split happens on a 1x5 line: the input arrives at the middle cell and
/// the two halves walk outward in lockstep.
const SPLIT_INPUT: Location = Location::new(0, 2);
const SPLIT_WALK_A: [Location; 2] = [Location::new(0, 1), Location::new(0, 0)];
const SPLIT_WALK_B: [Location; 2] = [Location::new(0, 3), Location::new(0, 4)];

#[derive(Debug, Clone)]
pub struct Input {
    pub id: CommandId,
    pub output: DropletId,
    pub location: Option<Location>,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct Move {
    pub id: CommandId,
    pub droplet: DropletId,
    pub dest: Location,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct Mix {
    pub id: CommandId,
    pub a: DropletId,
    pub b: DropletId,
    pub output: DropletId,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct Split {
    pub id: CommandId,
    pub input: DropletId,
    pub out_a: DropletId,
    pub out_b: DropletId,
    pub done: bool,
}

/// A queued operation: produces and/or consumes droplets, owns a shape,
/// and knows how to transition droplets once routing has brought its
/// inputs into position.
#[derive(Debug, Clone)]
pub enum Command {
    Input(Input),
    Move(Move),
    Mix(Mix),
    Split(Split),
}

impl Command {
    pub fn id(&self) -> CommandId {
        match self {
            Command::Input(cmd) => cmd.id,
            Command::Move(cmd) => cmd.id,
            Command::Mix(cmd) => cmd.id,
            Command::Split(cmd) => cmd.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Input(_) => "input",
            Command::Move(_) => "move",
            Command::Mix(_) => "mix",
            Command::Split(_) => "split",
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            Command::Input(cmd) => cmd.done,
            Command::Move(cmd) => cmd.done,
            Command::Mix(cmd) => cmd.done,
            Command::Split(cmd) => cmd.done,
        }
    }

    /// Cells this command needs, in its own coordinate system.
    pub fn shape(&self) -> Shape {
        match self {
            Command::Input(_) | Command::Move(_) => Shape::singleton(),
            Command::Mix(_) => Shape::rectangle(2, 3),
            Command::Split(_) => Shape::rectangle(1, 5),
        }
    }

    pub fn input_droplets(&self) -> Vec<DropletId> {
        match self {
            Command::Input(_) => vec![],
            Command::Move(cmd) => vec![cmd.droplet],
            Command::Mix(cmd) => vec![cmd.a, cmd.b],
            Command::Split(cmd) => vec![cmd.input],
        }
    }

    /// Required positions of the inputs within the command shape, paired
    /// with `input_droplets` by index.
    pub fn input_locations(&self) -> Vec<Location> {
        match self {
            Command::Input(_) => vec![],
            Command::Move(_) => vec![Location::origin()],
            Command::Mix(_) => vec![Location::origin(), Location::origin()],
            Command::Split(_) => vec![SPLIT_INPUT],
        }
    }

    pub fn output_droplets(&self) -> Vec<DropletId> {
        match self {
            Command::Input(cmd) => vec![cmd.output],
            Command::Move(cmd) => vec![cmd.droplet],
            Command::Mix(cmd) => vec![cmd.output],
            Command::Split(cmd) => vec![cmd.out_a, cmd.out_b],
        }
    }

    /// True for commands whose inputs end Consumed. Move keeps its droplet
    /// alive.
    pub fn consumes(&self) -> bool {
        matches!(self, Command::Mix(_) | Command::Split(_))
    }

    /// No bending allowed in placement: translations only.
    pub fn strict(&self) -> bool {
        matches!(self, Command::Split(_))
    }

    /// A client-pinned placement, skipping the search entirely.
    pub fn pinned_mapping(&self) -> Option<Vec<(Location, Location)>> {
        match self {
            Command::Input(cmd) => cmd
                .location
                .map(|loc| vec![(Location::origin(), loc)]),
            Command::Move(cmd) => Some(vec![(Location::origin(), cmd.dest)]),
            _ => None,
        }
    }

    pub fn locations_given(&self) -> bool {
        self.pinned_mapping().is_some()
    }

    /// Collision group whose droplets the placer must not treat as
    /// obstacles: the command's own inputs.
    pub fn collision_exemption(&self, board: &Board) -> Option<CollisionGroup> {
        let group_of = |id| board.droplet(id).ok().map(|d| d.collision_group);
        match self {
            Command::Input(_) => None,
            Command::Move(cmd) => group_of(cmd.droplet),
            Command::Mix(cmd) => match (group_of(cmd.a), group_of(cmd.b)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            Command::Split(cmd) => group_of(cmd.input),
        }
    }

    /// Adjustments before placement and routing. Mix folds its inputs into
    /// one collision group (the minimum) so the placer keeps their region
    /// available and they may legally approach each other.
    pub fn pre_route(&self, board: &mut Board) {
        if let Command::Mix(cmd) = self {
            let ga = board.droplet(cmd.a).expect("mix input present").collision_group;
            let gb = board.droplet(cmd.b).expect("mix input present").collision_group;
            let unified = ga.min(gb);
            board
                .droplet_mut(cmd.a)
                .expect("mix input present")
                .collision_group = unified;
            board
                .droplet_mut(cmd.b)
                .expect("mix input present")
                .collision_group = unified;
            debug!("mix {} unified groups {} {} -> {}", cmd.id, ga, gb, unified);
        }
    }

    /// Transition droplets now that routing has delivered every input to
    /// its placed position.
    pub fn apply(&mut self, board: &mut Board, placement: &Placement, n_mix_loops: usize) -> Result<()> {
        match self {
            Command::Input(cmd) => {
                let cell = placement[&Location::origin()];
                board.realize_at(cmd.output, cell)?;
                cmd.done = true;
            }

            Command::Move(cmd) => {
                let droplet = board.droplet_mut(cmd.droplet)?;
                assert_eq!(
                    droplet.current_location(),
                    Some(cmd.dest),
                    "move did not arrive"
                );
                // the droplet survives; it is now this command's product
                droplet.produced_by = Some(cmd.id);
                cmd.done = true;
            }

            Command::Mix(cmd) => {
                let meet = placement[&Location::origin()];
                for id in [cmd.a, cmd.b] {
                    let arrived = board.droplet(id)?.current_location();
                    assert_eq!(arrived, Some(meet), "mix input {} did not arrive", id);
                }

                let (a_volume, a_concentration, a_info, unified) = {
                    let a = board.droplet(cmd.a)?;
                    (a.volume, a.concentration, a.info.clone(), a.collision_group)
                };
                let (b_volume, b_concentration, b_info) = {
                    let b = board.droplet(cmd.b)?;
                    (b.volume, b.concentration, b.info.clone())
                };

                let volume = a_volume + b_volume;
                let concentration = if volume > 0.0 {
                    (a_volume * a_concentration + b_volume * b_concentration) / volume
                } else {
                    0.0
                };

                // the result appears on top of its still-present inputs,
                // sharing their group until they are gone
                let own_group = {
                    let out = board.droplet_mut(cmd.output)?;
                    out.info = format!("({}, {})", a_info, b_info);
                    out.volume = volume;
                    out.concentration = concentration;
                    let own = out.collision_group;
                    out.collision_group = unified;
                    own
                };
                board.realize_at(cmd.output, meet)?;

                for _ in 0..n_mix_loops {
                    for leg in MIX_LOOP.windows(2) {
                        board.move_droplet(cmd.output, placement[&leg[1]]);
                        board.wait()?;
                    }
                }

                // every fallible step has passed; consuming the inputs
                // commits the mix
                board.consume(cmd.a);
                board.consume(cmd.b);
                board
                    .droplet_mut(cmd.output)
                    .expect("mix output realized")
                    .collision_group = own_group;
                cmd.done = true;
            }

            Command::Split(cmd) => {
                let middle = placement[&SPLIT_INPUT];
                let arrived = board.droplet(cmd.input)?.current_location();
                assert_eq!(arrived, Some(middle), "split input {} did not arrive", cmd.input);

                let (half, concentration, info, shared) = {
                    let input = board.droplet(cmd.input)?;
                    (
                        input.volume / 2.0,
                        input.concentration,
                        input.info.clone(),
                        input.collision_group,
                    )
                };

                // both halves appear on top of the still-present input,
                // sharing its group while they are adjacent
                for out_id in [cmd.out_a, cmd.out_b] {
                    let out = board.droplet_mut(out_id)?;
                    out.info = info.clone();
                    out.volume = half;
                    out.concentration = concentration;
                    out.collision_group = shared;
                }
                board.realize_at(cmd.out_a, middle)?;
                board.realize_at(cmd.out_b, middle)?;

                for step in 0..SPLIT_WALK_A.len() {
                    board.move_droplet(cmd.out_a, placement[&SPLIT_WALK_A[step]]);
                    board.move_droplet(cmd.out_b, placement[&SPLIT_WALK_B[step]]);
                    board.wait()?;
                }

                // every fallible step has passed; consuming the input
                // commits the split
                board.consume(cmd.input);

                // separated now; the second half gets its own group back
                let fresh = board.next_collision_group();
                board
                    .droplet_mut(cmd.out_b)
                    .expect("split output realized")
                    .collision_group = fresh;
                cmd.done = true;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Input(cmd) => match cmd.location {
                Some(loc) => write!(f, "input@{} -> {}", loc, cmd.output),
                None => write!(f, "input -> {}", cmd.output),
            },
            Command::Move(cmd) => write!(f, "move({}) -> {}", cmd.droplet, cmd.dest),
            Command::Mix(cmd) => write!(f, "mix({}, {}) -> {}", cmd.a, cmd.b, cmd.output),
            Command::Split(cmd) => {
                write!(f, "split({}) -> {}, {}", cmd.input, cmd.out_a, cmd.out_b)
            }
        }
    }
}
