use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Vec2;

use crate::action::{Action, TickInput};

#[derive(Debug, Default)]
struct Pending {
    movement: Vec2,
    jump_held: bool,
    actions: Vec<Action>,
}

/// Hands input from the main thread to the physics thread.
///
/// The main thread may publish several frames between two ticks, and a tick
/// may run with no frame in between. Held state keeps only the latest value;
/// actions accumulate until [`take`](Self::take) drains them.
#[derive(Debug, Default)]
pub struct InputMailbox {
    pending: Mutex<Pending>,
}

impl InputMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Main thread: publish this frame's held state and any new edges.
    pub fn publish(
        &self,
        movement: Vec2,
        jump_held: bool,
        actions: impl IntoIterator<Item = Action>,
    ) {
        let mut pending = self.lock();
        pending.movement = movement.clamp_length_max(1.0);
        pending.jump_held = jump_held;
        pending.actions.extend(actions);
    }

    /// Physics thread: read held state and drain latched actions.
    pub fn take(&self) -> TickInput {
        let mut pending = self.lock();
        TickInput {
            movement: pending.movement,
            jump_held: pending.jump_held,
            actions: std::mem::take(&mut pending.actions),
        }
    }

    /// Number of actions waiting for a tick.
    pub fn pending_actions(&self) -> usize {
        self.lock().actions.len()
    }
}
