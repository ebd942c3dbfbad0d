//! Where rows land in a worksheet.

use serde::{Deserialize, Serialize};

/// Placement of new rows relative to the anchor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Below,
    Above,
}

/// A worksheet plus the 1-based anchor row new rows are inserted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub worksheet: String,
    pub anchor_row: u32,
    #[serde(default)]
    pub direction: Direction,
}

impl Destination {
    pub fn new(worksheet: impl Into<String>, anchor_row: u32) -> Self {
        Self {
            worksheet: worksheet.into(),
            anchor_row,
            direction: Direction::Below,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Row index the first inserted row occupies.
    pub fn first_insert_position(&self) -> u32 {
        match self.direction {
            Direction::Below => self.anchor_row,
            Direction::Above => self.anchor_row.saturating_sub(1).max(1),
        }
    }
}
