use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::button::ButtonState;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input script: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid input script: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("script segments out of order at index {index}")]
    Unordered { index: usize },
}

/// One frame's worth of polled input on the main thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub movement: Vec2,
    pub jump_held: bool,
    pub actions: Vec<Action>,
}

/// Anything the main loop can poll for input once per frame.
pub trait InputSource {
    /// Sample input at `elapsed` wall-clock time since the loop started.
    fn poll(&mut self, elapsed: Duration) -> InputSnapshot;
}

/// A segment of scripted input, in effect from `at` seconds until the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub at: f32,
    #[serde(default)]
    pub movement: Vec2,
    #[serde(default)]
    pub jump: bool,
    /// Fired once when the segment starts. `lock_velocity` is written as a
    /// single-key map rather than a YAML tag.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Script {
    segments: Vec<ScriptSegment>,
}

/// Input replayed from a timed script, for headless runs.
///
/// The jump button goes through [`ButtonState`] so a held jump produces a
/// single [`Action::Jump`] on its rising edge.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    segments: Vec<ScriptSegment>,
    cursor: usize,
    movement: Vec2,
    jump_down: bool,
    jump: ButtonState,
}

impl ScriptedInput {
    pub fn new(segments: Vec<ScriptSegment>) -> Result<Self, InputError> {
        if let Some(index) = segments
            .windows(2)
            .position(|w| w[1].at < w[0].at)
            .map(|i| i + 1)
        {
            return Err(InputError::Unordered { index });
        }
        Ok(Self {
            segments,
            ..Self::default()
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, InputError> {
        let script: Script = serde_yaml::from_str(text)?;
        Self::new(script.segments)
    }

    pub fn load(path: &Path) -> Result<Self, InputError> {
        let text = std::fs::read_to_string(path)?;
        let input = Self::from_yaml(&text)?;
        tracing::info!(
            path = %path.display(),
            segments = input.segments.len(),
            "input script loaded"
        );
        Ok(input)
    }

    /// Walk forward, hold the jump for a while, then stand still.
    pub fn demo() -> Self {
        let segments = vec![
            ScriptSegment {
                at: 0.0,
                movement: Vec2::ZERO,
                jump: false,
                actions: vec![],
            },
            ScriptSegment {
                at: 1.5,
                movement: Vec2::new(0.0, 1.0),
                jump: false,
                actions: vec![Action::SetResetPoint],
            },
            ScriptSegment {
                at: 2.5,
                movement: Vec2::new(0.7, 0.7),
                jump: true,
                actions: vec![],
            },
            ScriptSegment {
                at: 2.8,
                movement: Vec2::new(0.7, 0.7),
                jump: false,
                actions: vec![],
            },
            ScriptSegment {
                at: 4.0,
                movement: Vec2::ZERO,
                jump: false,
                actions: vec![Action::LockVelocity { vertical: false }],
            },
        ];
        Self {
            segments,
            ..Self::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.segments.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, elapsed: Duration) -> InputSnapshot {
        let now = elapsed.as_secs_f32();
        let mut actions = Vec::new();
        while let Some(segment) = self.segments.get(self.cursor) {
            if segment.at > now {
                break;
            }
            self.movement = segment.movement.clamp_length_max(1.0);
            self.jump_down = segment.jump;
            actions.extend(segment.actions.iter().copied());
            self.cursor += 1;
        }
        self.jump.update(self.jump_down);
        if self.jump.pressed() {
            actions.push(Action::Jump);
        }
        InputSnapshot {
            movement: self.movement,
            jump_held: self.jump.held(),
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
segments:
  - at: 0.0
    movement: [0.0, 1.0]
  - at: 1.0
    jump: true
    actions: [set_reset_point]
  - at: 2.0
    actions:
      - lock_velocity:
          vertical: true
"#;

    #[test]
    fn parses_yaml_script() {
        let mut input = ScriptedInput::from_yaml(SCRIPT).unwrap();
        let first = input.poll(Duration::from_millis(10));
        assert_eq!(first.movement, Vec2::new(0.0, 1.0));
        assert!(first.actions.is_empty());
    }

    #[test]
    fn held_jump_fires_once() {
        let mut input = ScriptedInput::from_yaml(SCRIPT).unwrap();
        input.poll(Duration::from_millis(500));
        let press = input.poll(Duration::from_millis(1000));
        assert_eq!(press.actions, vec![Action::SetResetPoint, Action::Jump]);
        assert!(press.jump_held);
        let held = input.poll(Duration::from_millis(1100));
        assert!(held.actions.is_empty());
        assert!(held.jump_held);
        // Segment without movement resets to zero.
        let late = input.poll(Duration::from_millis(2000));
        assert_eq!(late.movement, Vec2::ZERO);
        assert!(!late.jump_held);
        assert_eq!(late.actions, vec![Action::LockVelocity { vertical: true }]);
        assert!(input.is_finished());
    }

    #[test]
    fn skipped_segments_still_fire_their_actions() {
        let mut input = ScriptedInput::from_yaml(SCRIPT).unwrap();
        let snap = input.poll(Duration::from_secs(5));
        assert_eq!(
            snap.actions,
            vec![Action::SetResetPoint, Action::LockVelocity { vertical: true }]
        );
    }

    #[test]
    fn lock_velocity_is_written_as_a_map() {
        let segment = ScriptSegment {
            at: 0.5,
            movement: Vec2::ZERO,
            jump: false,
            actions: vec![Action::LockVelocity { vertical: false }],
        };
        let yaml = serde_yaml::to_string(&Script {
            segments: vec![segment.clone()],
        })
        .unwrap();
        assert!(yaml.contains("lock_velocity:"), "{yaml}");
        assert!(!yaml.contains('!'), "{yaml}");
        let input = ScriptedInput::from_yaml(&yaml).unwrap();
        assert_eq!(input.segments, vec![segment]);
    }

    #[test]
    fn rejects_unordered_segments() {
        let text = "segments:\n  - at: 2.0\n  - at: 1.0\n";
        assert!(matches!(
            ScriptedInput::from_yaml(text),
            Err(InputError::Unordered { index: 1 })
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.yaml");
        std::fs::write(&path, SCRIPT).unwrap();
        let input = ScriptedInput::load(&path).unwrap();
        assert!(!input.is_finished());
        assert!(matches!(
            ScriptedInput::load(&dir.path().join("missing.yaml")),
            Err(InputError::Io(_))
        ));
    }

    #[test]
    fn demo_script_is_ordered() {
        let demo = ScriptedInput::demo();
        assert!(ScriptedInput::new(demo.segments.clone()).is_ok());
    }
}
