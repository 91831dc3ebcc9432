use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A discrete player action.
///
/// Actions are edges: each one is produced once by the input side and consumed
/// once by the physics tick that sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Jump press (the rising edge, not the held button).
    Jump,
    /// Teleport the player back to its reset point.
    ResetPosition,
    /// Remember the player's current foot position as the reset point.
    SetResetPoint,
    /// Zero horizontal velocity; vertical too when `vertical` is set.
    LockVelocity { vertical: bool },
}

/// Everything one physics tick needs from the input side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired horizontal movement in world XZ, length at most 1.
    pub movement: Vec2,
    pub jump_held: bool,
    pub actions: Vec<Action>,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn with_movement(movement: Vec2) -> Self {
        Self {
            movement: movement.clamp_length_max(1.0),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn has(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    pub fn jump_pressed(&self) -> bool {
        self.has(Action::Jump)
    }

    /// The strongest lock request this tick, if any.
    pub fn lock_request(&self) -> Option<bool> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::LockVelocity { vertical } => Some(*vertical),
                _ => None,
            })
            .reduce(|a, b| a || b)
    }
}
