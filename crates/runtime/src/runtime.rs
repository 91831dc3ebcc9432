use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::thread::JoinHandle;
use std::time::Instant;

use wayfarer_input::InputSource;
use wayfarer_kernel::{
    LevelFile, PhysicsFrame, Scene, SceneCommand, SceneError, interpolation_alpha,
};
use wayfarer_render::{AnimationPose, Animator};

use crate::config::{ConfigError, RuntimeConfig};
use crate::context::SimulationContext;
use crate::pacer::Pacer;
use crate::physics_thread::{self, PhysicsReport};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid loop transition {from:?} -> {to:?}")]
    InvalidTransition { from: LoopState, to: LoopState },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("failed to spawn physics thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("physics thread panicked")]
    PhysicsPanicked,
    #[error("physics thread is gone")]
    Disconnected,
}

impl<T> From<SendError<T>> for RuntimeError {
    fn from(_: SendError<T>) -> Self {
        Self::Disconnected
    }
}

/// Lifecycle of the dual-rate loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl LoopState {
    pub fn can_transition_to(self, next: LoopState) -> bool {
        matches!(
            (self, next),
            (Self::Initializing, Self::Running)
                | (Self::Initializing, Self::Stopped)
                | (Self::Running, Self::ShuttingDown)
                | (Self::ShuttingDown, Self::Stopped)
        )
    }
}

/// The main thread's per-frame consumer: renderer, window, or test probe.
pub trait Host {
    /// Present one frame. Return `false` to stop the loop.
    fn frame(&mut self, frame: &PhysicsFrame, alpha: f32, animation: &AnimationPose) -> bool;
}

impl<F> Host for F
where
    F: FnMut(&PhysicsFrame, f32, &AnimationPose) -> bool,
{
    fn frame(&mut self, frame: &PhysicsFrame, alpha: f32, animation: &AnimationPose) -> bool {
        self(frame, alpha, animation)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub frames: u64,
    pub physics: PhysicsReport,
}

/// Coordinates the physics thread and the main loop.
#[derive(Debug)]
pub struct Runtime {
    state: LoopState,
    config: RuntimeConfig,
    context: Arc<SimulationContext>,
    commands: Sender<SceneCommand>,
    /// Scene and command receiver, held until the physics thread takes them.
    pending: Option<(Scene, Receiver<SceneCommand>)>,
    physics: Option<JoinHandle<PhysicsReport>>,
}

impl Runtime {
    /// Build the scene from `level` and publish its initial frame.
    pub fn new(config: RuntimeConfig, level: &LevelFile) -> Result<Self, RuntimeError> {
        config.validate()?;
        let mut scene = Scene::new(config.world_config(), config.controller, config.locomotion)?;
        scene.spawn_level(level)?;
        scene.drain_events();

        let context = Arc::new(SimulationContext::new(config.tick_duration()));
        context.frames().publish(scene.snapshot());
        let (commands, receiver) = mpsc::channel();
        tracing::info!(level = %level.name, objects = scene.object_count(), "runtime initialized");

        Ok(Self {
            state: LoopState::Initializing,
            config,
            context,
            commands,
            pending: Some((scene, receiver)),
            physics: None,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<SimulationContext> {
        &self.context
    }

    /// Queue a scene change for the next tick boundary.
    pub fn send(&self, command: SceneCommand) -> Result<(), RuntimeError> {
        Ok(self.commands.send(command)?)
    }

    pub fn command_sender(&self) -> Sender<SceneCommand> {
        self.commands.clone()
    }

    fn transition(&mut self, next: LoopState) -> Result<(), RuntimeError> {
        if !self.state.can_transition_to(next) {
            return Err(RuntimeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = ?self.state, to = ?next, "loop state");
        self.state = next;
        Ok(())
    }

    /// Enter `Running` and spawn the physics thread.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        self.transition(LoopState::Running)?;
        let (scene, receiver) = self.pending.take().ok_or(RuntimeError::Disconnected)?;
        self.context.set_running(true);
        match physics_thread::spawn(
            Arc::clone(&self.context),
            scene,
            receiver,
            self.config.physics.pacing,
        ) {
            Ok(handle) => {
                self.physics = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.context.set_running(false);
                self.state = LoopState::Stopped;
                Err(RuntimeError::Spawn(e))
            }
        }
    }

    /// Run the display-rate loop until the host stops it or `running` is
    /// cleared. Returns the number of frames presented.
    pub fn run_main_loop(
        &mut self,
        host: &mut dyn Host,
        input: &mut dyn InputSource,
    ) -> Result<u64, RuntimeError> {
        if self.state != LoopState::Running {
            return Err(RuntimeError::InvalidTransition {
                from: self.state,
                to: LoopState::Running,
            });
        }
        let tick = self.context.tick_duration();
        let mut animator = Animator::new(self.config.animation);
        let mut pacer = Pacer::new(self.config.display.pacing.interval());
        let started = Instant::now();
        let mut last = started;
        let mut frames = 0;

        while self.context.is_running() {
            let _span = tracing::trace_span!("frame", frame = frames).entered();
            let now = Instant::now();
            let dt = (now - last).as_secs_f32().min(0.1);
            last = now;

            let polled = input.poll(now - started);
            self.context
                .input()
                .publish(polled.movement, polled.jump_held, polled.actions);

            let frame = self.context.frames().latest();
            animator.update(frame.player.as_ref(), dt);
            let since_publish = now.saturating_duration_since(frame.published_at);
            let alpha = interpolation_alpha(since_publish, tick);
            frames += 1;
            if !host.frame(&frame, alpha, &animator.pose()) {
                break;
            }
            pacer.wait();
        }
        tracing::info!(frames, "main loop finished");
        Ok(frames)
    }

    /// Clear `running`, join the physics thread and collect its report.
    ///
    /// Shared state stays alive until the join returns.
    pub fn shutdown(&mut self) -> Result<PhysicsReport, RuntimeError> {
        self.transition(LoopState::ShuttingDown)?;
        self.context.set_running(false);
        let handle = self.physics.take().ok_or(RuntimeError::Disconnected)?;
        let joined = handle.join();
        self.state = LoopState::Stopped;
        let report = joined.map_err(|_| RuntimeError::PhysicsPanicked)?;
        tracing::info!(ticks = report.ticks, "runtime stopped");
        Ok(report)
    }

    /// Start, run the main loop, and shut down.
    pub fn run(
        mut self,
        host: &mut dyn Host,
        input: &mut dyn InputSource,
    ) -> Result<RunReport, RuntimeError> {
        self.start()?;
        let frames = self.run_main_loop(host, input);
        let physics = self.shutdown()?;
        Ok(RunReport {
            frames: frames?,
            physics,
        })
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Some(handle) = self.physics.take() {
            self.context.set_running(false);
            if handle.join().is_err() {
                tracing::error!("physics thread panicked during drop");
            }
        }
    }
}
