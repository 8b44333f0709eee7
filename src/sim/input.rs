//! Player intents for a single tick
//!
//! The shell keeps a `TickInput` updated from key events and hands it to the
//! controller every frame. Held intents stay set until released; lane
//! switches in the runner phase consume `left`/`right` once read.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Named intents the shell can map keys to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Left,
    Right,
    Up,
    Down,
    Sprint,
}

impl Intent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "left" => Some(Intent::Left),
            "right" => Some(Intent::Right),
            "up" => Some(Intent::Up),
            "down" => Some(Intent::Down),
            "sprint" => Some(Intent::Sprint),
            _ => None,
        }
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
}

impl TickInput {
    /// Set an intent's held state
    pub fn set(&mut self, intent: Intent, held: bool) {
        *self.slot(intent) = held;
    }

    pub fn held(&self, intent: Intent) -> bool {
        match intent {
            Intent::Left => self.left,
            Intent::Right => self.right,
            Intent::Up => self.up,
            Intent::Down => self.down,
            Intent::Sprint => self.sprint,
        }
    }

    /// Read an intent and clear it (edge-triggered use)
    pub fn take(&mut self, intent: Intent) -> bool {
        std::mem::take(self.slot(intent))
    }

    /// Unnormalised movement direction, each axis in {-1, 0, 1}
    pub fn direction(&self) -> Vec2 {
        let x = self.right as i32 - self.left as i32;
        let y = self.down as i32 - self.up as i32;
        Vec2::new(x as f32, y as f32)
    }

    fn slot(&mut self, intent: Intent) -> &mut bool {
        match intent {
            Intent::Left => &mut self.left,
            Intent::Right => &mut self.right,
            Intent::Up => &mut self.up,
            Intent::Down => &mut self.down,
            Intent::Sprint => &mut self.sprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_consumes() {
        let mut input = TickInput::default();
        input.set(Intent::from_name("LEFT").unwrap(), true);
        assert!(input.held(Intent::Left));
        assert!(input.take(Intent::Left));
        assert!(!input.take(Intent::Left));
        assert!(Intent::from_name("jump").is_none());
    }

    #[test]
    fn test_direction_cancels_opposites() {
        let input = TickInput { left: true, right: true, down: true, ..Default::default() };
        assert_eq!(input.direction(), Vec2::new(0.0, 1.0));
    }
}
