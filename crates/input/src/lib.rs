//! Player input: discrete actions, edge-detected buttons, and the mailbox that
//! carries input from the main thread to the physics thread.
//!
//! # Invariants
//! - Held state (movement, jump held) is overwritten on every publish.
//! - Edge actions are latched until the physics thread takes them: each one is
//!   seen by exactly one tick.

pub mod action;
pub mod button;
pub mod mailbox;
pub mod scripted;

pub use action::{Action, TickInput};
pub use button::ButtonState;
pub use mailbox::InputMailbox;
pub use scripted::{InputError, InputSnapshot, InputSource, ScriptSegment, ScriptedInput};
