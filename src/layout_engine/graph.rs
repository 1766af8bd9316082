use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    #[serde(alias = "top")]
    Up,
    #[serde(alias = "bottom")]
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Steps `i` one sibling towards this direction, or `None` past either end.
    pub fn step(self, i: usize, len: usize) -> Option<usize> {
        let next = match self {
            Direction::Left | Direction::Up => i.checked_sub(1)?,
            Direction::Right | Direction::Down => i + 1,
        };
        (next < len).then_some(next)
    }
}

/// Axis of a resize request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn orientation(self) -> Orientation {
        match self {
            Axis::X => Orientation::Horizontal,
            Axis::Y => Orientation::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDirection {
    Grow,
    Shrink,
}

impl ResizeDirection {
    pub fn sign(self) -> f64 {
        match self {
            ResizeDirection::Grow => 1.0,
            ResizeDirection::Shrink => -1.0,
        }
    }
}

/// A placement request applied relative to the focused window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Reservation {
    Left,
    Right,
    Top,
    Bottom,
    Stack,
    Float,
}

impl Reservation {
    /// Branch orientation created by a directional reservation.
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            Reservation::Left | Reservation::Right => Some(Orientation::Horizontal),
            Reservation::Top | Reservation::Bottom => Some(Orientation::Vertical),
            Reservation::Stack | Reservation::Float => None,
        }
    }

    /// Whether the new window goes before the existing one.
    pub fn is_leading(self) -> bool { matches!(self, Reservation::Left | Reservation::Top) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Subtype {
    Temporal,
    #[default]
    Permanent,
}
