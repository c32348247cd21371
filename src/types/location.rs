use std::fmt;
use std::ops::{Add, Sub};

/// A cell position on the board, in (y, x) order.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Location {
    pub y: i32,
    pub x: i32,
}

impl Location {
    pub const fn new(y: i32, x: i32) -> Self {
        Location { y, x }
    }

    pub fn origin() -> Self {
        Location::new(0, 0)
    }

    /// Distance along the cardinal grid; the router's heuristic.
    pub fn manhattan_distance(self, other: Location) -> u32 {
        ((self.y - other.y).abs() + (self.x - other.x).abs()) as u32
    }

    /// Chessboard distance; governs the collision rule.
    pub fn chebyshev_distance(self, other: Location) -> u32 {
        i32::max((self.y - other.y).abs(), (self.x - other.x).abs()) as u32
    }

    /// Two locations may not be held by droplets of different collision
    /// groups iff this is true.
    pub fn adjacent_or_same(self, other: Location) -> bool {
        self.chebyshev_distance(other) <= 1
    }

    pub fn north(self) -> Location {
        Location::new(self.y - 1, self.x)
    }

    pub fn south(self) -> Location {
        Location::new(self.y + 1, self.x)
    }

    pub fn west(self) -> Location {
        Location::new(self.y, self.x - 1)
    }

    pub fn east(self) -> Location {
        Location::new(self.y, self.x + 1)
    }

    /// The four cardinal neighbors, whether or not they exist on any board.
    pub fn neighbors4(self) -> [Location; 4] {
        [self.north(), self.west(), self.south(), self.east()]
    }

    /// The 3x3 Chebyshev-1 closure, self included.
    pub fn neighborhood9(self) -> impl Iterator<Item = Location> {
        (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| Location::new(self.y + dy, self.x + dx)))
    }
}

impl Add for Location {
    type Output = Location;

    fn add(self, other: Location) -> Location {
        Location::new(self.y + other.y, self.x + other.x)
    }
}

impl Sub for Location {
    type Output = Location;

    fn sub(self, other: Location) -> Location {
        Location::new(self.y - other.y, self.x - other.x)
    }
}

impl From<(i32, i32)> for Location {
    fn from((y, x): (i32, i32)) -> Location {
        Location::new(y, x)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
