use thiserror::Error;

use crate::types::ids::DropletId;
use crate::types::location::Location;

/// Top-level error for everything the engine can surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidicError {
    #[error("collision: {0}")]
    Collision(#[from] CollisionError),

    #[error("placement: {0}")]
    Place(#[from] PlaceError),

    #[error("routing: {0}")]
    Route(#[from] RouteError),

    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    #[error("droplet state: {0}")]
    DropletState(#[from] DropletStateError),

    #[error("board description: {0}")]
    Architecture(#[from] ArchitectureError),

    #[error("shape: {0}")]
    Shape(#[from] ShapeError),
}

/// The spatial invariant was violated: two droplets of different collision
/// groups came within Chebyshev distance 1 of each other.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("droplets {a} and {b} are within collision distance")]
pub struct CollisionError {
    pub a: DropletId,
    pub b: DropletId,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaceError {
    #[error("no isomorphic placement with a clear neighborhood exists")]
    NoPlacement,

    #[error("pinned location {0} is not a board cell")]
    PinnedCellMissing(Location),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("no path for droplet {id} from {from} to {to}")]
    NoRoute {
        id: DropletId,
        from: Location,
        to: Location,
    },

    #[error("routing failed after {tries} shuffled attempts")]
    RetriesExhausted { tries: usize },
}

/// Command-level wrapper around placement and routing failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("could not place {command}: {source}")]
    Placement {
        command: &'static str,
        #[source]
        source: PlaceError,
    },

    #[error("could not route {command}: {source}")]
    Routing {
        command: &'static str,
        #[source]
        source: RouteError,
    },
}

/// Illegal droplet lifecycle transition or access.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DropletStateError {
    #[error("droplet {id} is {state}, not real; its attributes are unreadable")]
    NotReal { id: DropletId, state: &'static str },

    #[error("droplet {id} was already consumed")]
    Consumed { id: DropletId },

    #[error("droplet {id} is already bound to a consuming command")]
    AlreadyBound { id: DropletId },

    #[error("unknown droplet {id}")]
    Unknown { id: DropletId },
}

/// Ill-formed board description text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchitectureError {
    #[error("invalid board token '{token}' at row {row}, column {col}")]
    BadToken {
        token: String,
        row: usize,
        col: usize,
    },

    #[error("duplicate pin id {0}")]
    DuplicatePin(u32),

    #[error("pin ids must be dense 0..{expected}; missing {missing}")]
    SparsePins { expected: usize, missing: u32 },

    #[error("board has no cells")]
    EmptyBoard,

    #[error("I/O error: {0}")]
    Io(String),
}

/// A droplet or command footprint that is not a legal shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("shape has no cells")]
    Empty,

    #[error("shape does not contain the origin")]
    MissingOrigin,

    #[error("shape is not 4-connected")]
    Disconnected,
}

impl From<std::io::Error> for FluidicError {
    fn from(error: std::io::Error) -> Self {
        FluidicError::Architecture(ArchitectureError::Io(error.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, FluidicError>;
