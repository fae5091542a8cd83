//! Contraction directions on the square lattice.

use std::fmt;
use std::str::FromStr;

use crate::error::HotrgError;

/// The two families of directions.
///
/// Horizontal steps merge two vertically stacked tensors and compress the
/// left/right legs; vertical steps merge two side-by-side tensors and
/// compress the up/down legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Left and right.
    Horizontal,
    /// Up and down.
    Vertical,
}

/// A leg direction of a square-lattice tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `u`
    Up,
    /// `d`
    Down,
    /// `l`
    Left,
    /// `r`
    Right,
}

impl Direction {
    /// All directions in candidate scan order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Left | Direction::Right => Axis::Horizontal,
        }
    }

    /// Whether this is the forward member of its family (`up`, `left`).
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }

    /// Leg label of this direction.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "u",
            Direction::Down => "d",
            Direction::Left => "l",
            Direction::Right => "r",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Direction {
    type Err = HotrgError;

    /// Parses `u, d, l, r` or `up, down, left, right`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            "l" | "left" => Ok(Direction::Left),
            "r" | "right" => Ok(Direction::Right),
            _ => Err(HotrgError::InvalidDirection(s.to_string())),
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = HotrgError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'u' => Ok(Direction::Up),
            'd' => Ok(Direction::Down),
            'l' => Ok(Direction::Left),
            'r' => Ok(Direction::Right),
            _ => Err(HotrgError::InvalidDirection(c.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for d in Direction::ALL {
            assert_ne!(d, d.opposite());
            assert_eq!(d, d.opposite().opposite());
            assert_eq!(d.axis(), d.opposite().axis());
            assert_ne!(d.is_forward(), d.opposite().is_forward());
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for d in Direction::ALL {
            assert_eq!(d.label().parse::<Direction>().unwrap(), d);
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
        assert_eq!(Direction::try_from('l').unwrap(), Direction::Left);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!("x".parse::<Direction>(), Err(HotrgError::InvalidDirection(_))));
        assert!("U".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());
        assert!(Direction::try_from('q').is_err());
    }
}
