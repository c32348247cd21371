use std::collections::{BTreeSet, HashSet};

use crate::types::error::ShapeError;
use crate::types::location::Location;

/// A footprint: the set of cell offsets a droplet or command occupies,
/// relative to its anchor. Always contains the origin and is 4-connected.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Shape {
    offsets: BTreeSet<Location>,
}

impl Shape {
    /// The 1x1 footprint, the common case for droplets.
    pub fn singleton() -> Self {
        let mut offsets = BTreeSet::new();
        offsets.insert(Location::origin());
        Shape { offsets }
    }

    /// A full h x w block anchored at the origin.
    pub fn rectangle(height: i32, width: i32) -> Self {
        let offsets = (0..height)
            .flat_map(|y| (0..width).map(move |x| Location::new(y, x)))
            .collect();
        Shape { offsets }
    }

    pub fn from_offsets<I>(offsets: I) -> Result<Self, ShapeError>
    where
        I: IntoIterator<Item = Location>,
    {
        let offsets: BTreeSet<Location> = offsets.into_iter().collect();

        if offsets.is_empty() {
            return Err(ShapeError::Empty);
        }
        if !offsets.contains(&Location::origin()) {
            return Err(ShapeError::MissingOrigin);
        }

        let shape = Shape { offsets };
        if !shape.is_connected() {
            return Err(ShapeError::Disconnected);
        }
        Ok(shape)
    }

    fn is_connected(&self) -> bool {
        let mut seen = HashSet::new();
        let mut todo = vec![Location::origin()];
        while let Some(loc) = todo.pop() {
            if !seen.insert(loc) {
                continue;
            }
            for nbr in loc.neighbors4() {
                if self.offsets.contains(&nbr) && !seen.contains(&nbr) {
                    todo.push(nbr);
                }
            }
        }
        seen.len() == self.offsets.len()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = Location> + '_ {
        self.offsets.iter().copied()
    }

    /// Absolute cells covered when the shape is anchored at `anchor`.
    pub fn cells_at(&self, anchor: Location) -> impl Iterator<Item = Location> + '_ {
        self.offsets.iter().map(move |&off| anchor + off)
    }

    /// The Chebyshev-1 closure of the covered cells: everywhere a foreign
    /// droplet must not be.
    pub fn neighborhood(&self, anchor: Location) -> HashSet<Location> {
        self.cells_at(anchor)
            .flat_map(|cell| cell.neighborhood9())
            .collect()
    }

    /// True if any covered cell of `self` at `a` is adjacent-or-same to any
    /// covered cell of `other` at `b`.
    pub fn collides_with(&self, a: Location, other: &Shape, b: Location) -> bool {
        let nbrs = self.neighborhood(a);
        other.cells_at(b).any(|cell| nbrs.contains(&cell))
    }
}

impl Default for Shape {
    fn default() -> Self {
        Shape::singleton()
    }
}
