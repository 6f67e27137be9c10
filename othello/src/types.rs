//! Canonical identity, color and coordinate types for the project.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Width and height of the board.
pub const BOARD_SIZE: usize = 8;

/// Transport-assigned identity of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant as seen by a match: identity plus the name shown to the opponent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
}

impl Participant {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId(id),
            name: name.into(),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Opaque match identifier. Every lookup goes through this, never through a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Disk color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disk {
    Light,
    Dark,
}

impl Disk {
    pub fn flipped(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Light => 'O',
            Self::Dark => 'X',
        }
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seat in a match. `First` always plays light disks, `Second` dark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn disk(self) -> Disk {
        match self {
            Self::First => Disk::Light,
            Self::Second => Disk::Dark,
        }
    }

    pub fn from_disk(disk: Disk) -> Self {
        match disk {
            Disk::Light => Self::First,
            Disk::Dark => Self::Second,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// A board position. `x` is the column, `y` the row; both in `0..BOARD_SIZE`.
/// Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCoord")]
pub struct Coord {
    y: u8,
    x: u8,
}

/// Unchecked wire form; decoded coordinates go through [`Coord::new`].
#[derive(Deserialize)]
struct RawCoord {
    x: usize,
    y: usize,
}

impl TryFrom<RawCoord> for Coord {
    type Error = CoordError;

    fn try_from(raw: RawCoord) -> Result<Self, Self::Error> {
        Coord::new(raw.x, raw.y)
    }
}

impl Coord {
    pub fn new(x: usize, y: usize) -> Result<Self, CoordError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(CoordError::OutOfRange { x, y });
        }
        Ok(Self {
            x: x as u8,
            y: y as u8,
        })
    }

    pub fn x(self) -> usize {
        self.x as usize
    }

    pub fn y(self) -> usize {
        self.y as usize
    }

    /// Step one cell in `dir`, or `None` past the edge.
    pub fn step(self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.offset();
        let x = self.x as i8 + dx;
        let y = self.y as i8 + dy;
        if x < 0 || y < 0 || x >= BOARD_SIZE as i8 || y >= BOARD_SIZE as i8 {
            return None;
        }
        Some(Self {
            x: x as u8,
            y: y as u8,
        })
    }

    /// All coordinates, row by row.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|y| {
            (0..BOARD_SIZE).map(move |x| Coord {
                x: x as u8,
                y: y as u8,
            })
        })
    }
}

/// Same `x_y` form the transport uses for cell callbacks.
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}

impl FromStr for Coord {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once('_')
            .ok_or_else(|| CoordError::Malformed(s.to_string()))?;
        let x: usize = x
            .parse()
            .map_err(|_| CoordError::Malformed(s.to_string()))?;
        let y: usize = y
            .parse()
            .map_err(|_| CoordError::Malformed(s.to_string()))?;
        Coord::new(x, y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordError {
    #[error("Coordinate out of range: ({x}, {y})")]
    OutOfRange { x: usize, y: usize },
    #[error("Malformed coordinate: {0}")]
    Malformed(String),
}

/// The eight compass directions a capture run can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::West,
        Self::East,
        Self::SouthWest,
        Self::South,
        Self::SouthEast,
    ];

    /// `(dx, dy)` with `y` growing downwards.
    pub fn offset(self) -> (i8, i8) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::North => (0, -1),
            Self::NorthEast => (1, -1),
            Self::West => (-1, 0),
            Self::East => (1, 0),
            Self::SouthWest => (-1, 1),
            Self::South => (0, 1),
            Self::SouthEast => (1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_parse_roundtrip() {
        let c: Coord = "2_4".parse().unwrap();
        assert_eq!((c.x(), c.y()), (2, 4));
        assert_eq!(c.to_string(), "2_4");
    }

    #[test]
    fn test_coord_rejects_out_of_range() {
        assert_eq!(
            "8_0".parse::<Coord>(),
            Err(CoordError::OutOfRange { x: 8, y: 0 })
        );
        assert!(matches!(
            "a_1".parse::<Coord>(),
            Err(CoordError::Malformed(_))
        ));
        assert!(matches!("34".parse::<Coord>(), Err(CoordError::Malformed(_))));
    }

    #[test]
    fn test_coord_deserialize_checks_range() {
        let c: Coord = serde_json::from_str(r#"{"y":5,"x":2}"#).unwrap();
        assert_eq!((c.x(), c.y()), (2, 5));
        assert_eq!(serde_json::to_string(&c).unwrap(), r#"{"y":5,"x":2}"#);

        let err = serde_json::from_str::<Coord>(r#"{"y":9,"x":0}"#).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_step_stops_at_edge() {
        let corner = Coord::new(0, 0).unwrap();
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(
            corner.step(Direction::SouthEast),
            Some(Coord::new(1, 1).unwrap())
        );
    }

    #[test]
    fn test_side_disk_mapping() {
        assert_eq!(Side::First.disk(), Disk::Light);
        assert_eq!(Side::Second.disk(), Disk::Dark);
        assert_eq!(Side::from_disk(Disk::Dark), Side::Second);
        assert_eq!(Disk::Light.flipped(), Disk::Dark);
    }

    #[test]
    fn test_all_coords_cover_board() {
        assert_eq!(Coord::all().count(), BOARD_SIZE * BOARD_SIZE);
    }
}
