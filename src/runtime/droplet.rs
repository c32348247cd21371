use std::fmt;

use crate::types::error::DropletStateError;
use crate::types::ids::{CollisionGroup, CommandId, DropletId};
use crate::types::location::Location;
use crate::types::shape::Shape;

/// Lifecycle of a droplet. The three states are load-bearing: attribute
/// reads are only legal on `Real`, and the engine drives the transitions
/// Virtual -> Real (producer finished) and Real -> Consumed (consumer
/// finished).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropletState {
    Virtual,
    Real { location: Location },
    Consumed,
}

impl DropletState {
    pub fn name(&self) -> &'static str {
        match self {
            DropletState::Virtual => "virtual",
            DropletState::Real { .. } => "real",
            DropletState::Consumed => "consumed",
        }
    }
}

/// A tracked liquid portion. Payload tags (`info`, `volume`,
/// `concentration`) are opaque to the engine and only propagated by mix
/// and split.
#[derive(Debug, Clone)]
pub struct Droplet {
    pub id: DropletId,
    state: DropletState,
    pub shape: Shape,
    pub info: String,
    pub volume: f64,
    pub concentration: f64,
    pub collision_group: CollisionGroup,
    /// Where the router should take this droplet; only ever `Some` inside
    /// an executing command.
    pub destination: Option<Location>,
    pub produced_by: Option<CommandId>,
    pub consumed_by: Option<CommandId>,
}

impl Droplet {
    /// A fresh virtual droplet with default payload.
    pub fn new(id: DropletId, collision_group: CollisionGroup) -> Self {
        Droplet {
            id,
            state: DropletState::Virtual,
            shape: Shape::singleton(),
            info: id.0.to_string(),
            volume: 1.0,
            concentration: 0.0,
            collision_group,
            destination: None,
            produced_by: None,
            consumed_by: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_concentration(mut self, concentration: f64) -> Self {
        self.concentration = concentration;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn state(&self) -> DropletState {
        self.state
    }

    pub fn is_real(&self) -> bool {
        matches!(self.state, DropletState::Real { .. })
    }

    /// Current anchor if realized, without the lifecycle gate.
    pub fn current_location(&self) -> Option<Location> {
        match self.state {
            DropletState::Real { location } => Some(location),
            _ => None,
        }
    }

    /// Cells this droplet covers right now; empty unless Real.
    pub fn cells(&self) -> Vec<Location> {
        match self.current_location() {
            Some(anchor) => self.shape.cells_at(anchor).collect(),
            None => Vec::new(),
        }
    }

    /// Observable anchor location; `Real` only.
    pub fn location(&self) -> Result<Location, DropletStateError> {
        match self.state {
            DropletState::Real { location } => Ok(location),
            _ => Err(self.not_real()),
        }
    }

    pub fn observe_volume(&self) -> Result<f64, DropletStateError> {
        self.require_real()?;
        Ok(self.volume)
    }

    pub fn observe_info(&self) -> Result<&str, DropletStateError> {
        self.require_real()?;
        Ok(&self.info)
    }

    pub fn observe_concentration(&self) -> Result<f64, DropletStateError> {
        self.require_real()?;
        Ok(self.concentration)
    }

    fn require_real(&self) -> Result<(), DropletStateError> {
        if self.is_real() { Ok(()) } else { Err(self.not_real()) }
    }

    fn not_real(&self) -> DropletStateError {
        DropletStateError::NotReal {
            id: self.id,
            state: self.state.name(),
        }
    }

    /// Virtual -> Real transition; the producer command just finished.
    pub fn realize(&mut self, location: Location) {
        assert!(
            matches!(self.state, DropletState::Virtual),
            "droplet {} realized twice",
            self.id
        );
        self.state = DropletState::Real { location };
    }

    /// Move a Real droplet; positions pass through here so the state stays
    /// a single source of truth.
    pub fn relocate(&mut self, location: Location) {
        assert!(self.is_real(), "cannot relocate {} droplet", self.state.name());
        self.state = DropletState::Real { location };
    }

    /// Real -> Virtual rewind; only the failure path of an executing
    /// command uses this, for a realization that did not commit.
    pub fn unrealize(&mut self) {
        assert!(self.is_real(), "cannot unrealize {} droplet", self.state.name());
        self.state = DropletState::Virtual;
    }

    /// Real -> Consumed transition; the consumer command just finished.
    pub fn consume(&mut self) {
        assert!(self.is_real(), "cannot consume {} droplet", self.state.name());
        self.state = DropletState::Consumed;
    }
}

impl fmt::Display for Droplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.current_location() {
            Some(loc) => write!(f, "Droplet({}, {:?}, at {})", self.id, self.info, loc),
            None => write!(f, "Droplet({}, {:?}, {})", self.id, self.info, self.state.name()),
        }
    }
}
