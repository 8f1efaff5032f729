//! Grid geometry: integer locations, Manhattan distance and single-unit steps.
//!
//! The city is a square grid `0..size` on both axes. Every ETA estimate and every
//! movement step in the simulation goes through [`distance`] and [`step_toward`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer point on the city grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Location) -> u32 {
        distance(self, other)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Location {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Manhattan distance, used as the ETA proxy.
pub fn distance(a: Location, b: Location) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Advance one unit from `from` toward `to`, resolving x before y.
///
/// Returns `from` unchanged when the two locations are equal.
pub fn step_toward(from: Location, to: Location) -> Location {
    if from.x != to.x {
        Location::new(from.x + (to.x - from.x).signum(), from.y)
    } else if from.y != to.y {
        Location::new(from.x, from.y + (to.y - from.y).signum())
    } else {
        from
    }
}

/// Square domain `0..size` on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    size: i32,
}

impl GridBounds {
    /// A non-positive size gives an empty domain.
    pub fn new(size: i32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn contains(&self, location: Location) -> bool {
        (0..self.size).contains(&location.x) && (0..self.size).contains(&location.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_manhattan() {
        assert_eq!(distance(Location::new(20, 20), Location::new(10, 10)), 20);
        assert_eq!(distance(Location::new(0, 99), Location::new(99, 0)), 198);
        assert_eq!(distance(Location::new(7, 3), Location::new(7, 3)), 0);
    }

    #[test]
    fn step_moves_horizontally_before_vertically() {
        let target = Location::new(10, 10);
        assert_eq!(
            step_toward(Location::new(20, 20), target),
            Location::new(19, 20)
        );
        assert_eq!(
            step_toward(Location::new(10, 20), target),
            Location::new(10, 19)
        );
        assert_eq!(step_toward(Location::new(5, 3), target), Location::new(6, 3));
        assert_eq!(
            step_toward(Location::new(10, 3), target),
            Location::new(10, 4)
        );
        assert_eq!(step_toward(target, target), target);
    }

    #[test]
    fn bounds_exclude_upper_edge() {
        let bounds = GridBounds::new(100);
        assert!(bounds.contains(Location::new(0, 0)));
        assert!(bounds.contains(Location::new(99, 99)));
        assert!(!bounds.contains(Location::new(100, 5)));
        assert!(!bounds.contains(Location::new(5, -1)));
    }

    #[test]
    fn empty_grid_contains_nothing() {
        assert!(!GridBounds::new(0).contains(Location::new(0, 0)));
        assert!(!GridBounds::new(-3).contains(Location::new(0, 0)));
    }
}
