//! Building and door records produced by the town layout.

use serde::{Deserialize, Serialize};

use crate::grid::Position;

/// Index of a building within its town.
pub type BuildingId = usize;

/// Side of a building a corridor leaves from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

    pub fn opposite(&self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Step (dx, dy) in screen coordinates, y growing southward.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Doors in north/south walls are vertical passages, east/west ones horizontal.
    pub fn door_orientation(&self) -> DoorOrientation {
        match self {
            Direction::North | Direction::South => DoorOrientation::Vertical,
            Direction::East | Direction::West => DoorOrientation::Horizontal,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoorOrientation {
    Horizontal,
    Vertical,
}

impl DoorOrientation {
    pub fn symbol(&self) -> char {
        match self {
            DoorOrientation::Horizontal => 'H',
            DoorOrientation::Vertical => 'V',
        }
    }

    /// Offsets of the two tiles a door joins.
    pub fn passage(&self) -> [(i32, i32); 2] {
        match self {
            DoorOrientation::Horizontal => [(-1, 0), (1, 0)],
            DoorOrientation::Vertical => [(0, -1), (0, 1)],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub orientation: DoorOrientation,
    pub x: usize,
    pub y: usize,
}

impl Door {
    pub fn pos(&self) -> Position {
        (self.x, self.y)
    }
}

/// A walled room. `size` and `top_left` include the walls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub size: (usize, usize),
    pub top_left: Position,
    pub doors: Vec<Door>,
    pub connections: Vec<BuildingId>,
    pub single_connection_only: bool,
}

impl Building {
    pub fn new(id: BuildingId, name: &str, size: (usize, usize), single_connection_only: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            size,
            top_left: (0, 0),
            doors: Vec::new(),
            connections: Vec::new(),
            single_connection_only,
        }
    }

    /// 3x3 buildings are open waypoints rather than rooms.
    pub fn is_waypoint(&self) -> bool {
        self.size == (3, 3)
    }

    pub fn center(&self) -> Position {
        (self.top_left.0 + self.size.0 / 2, self.top_left.1 + self.size.1 / 2)
    }

    /// Whether `pos` lies inside the walls.
    pub fn interior_contains(&self, pos: Position) -> bool {
        let (left, top) = self.top_left;
        pos.0 > left && pos.0 < left + self.size.0 - 1 && pos.1 > top && pos.1 < top + self.size.1 - 1
    }

    /// Whether `pos` lies on the building footprint, walls included.
    pub fn footprint_contains(&self, pos: Position) -> bool {
        let (left, top) = self.top_left;
        pos.0 >= left && pos.0 < left + self.size.0 && pos.1 >= top && pos.1 < top + self.size.1
    }

    /// North wall cells without the corners.
    pub fn north_wall(&self) -> impl Iterator<Item = Position> + '_ {
        let (left, top) = self.top_left;
        (left + 1..left + self.size.0 - 1).map(move |x| (x, top))
    }

    /// Wall cells of one side without the corners.
    pub fn wall(&self, side: Direction) -> Vec<Position> {
        let (left, top) = self.top_left;
        let (w, h) = self.size;
        match side {
            Direction::North => (left + 1..left + w - 1).map(|x| (x, top)).collect(),
            Direction::South => (left + 1..left + w - 1).map(|x| (x, top + h - 1)).collect(),
            Direction::West => (top + 1..top + h - 1).map(|y| (left, y)).collect(),
            Direction::East => (top + 1..top + h - 1).map(|y| (left + w - 1, y)).collect(),
        }
    }

    pub(crate) fn translate(&mut self, dx: usize, dy: usize) {
        self.top_left = (self.top_left.0 - dx, self.top_left.1 - dy);
        for door in &mut self.doors {
            door.x -= dx;
            door.y -= dy;
        }
    }
}
