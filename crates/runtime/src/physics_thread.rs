use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SendError, SyncSender, TryRecvError};
use std::thread::JoinHandle;

use wayfarer_kernel::{Scene, SceneCommand};
use wayfarer_physics::WorldStats;

use crate::config::PhysicsPacing;
use crate::context::SimulationContext;
use crate::pacer::Pacer;

/// What the physics thread hands back when it exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhysicsReport {
    pub ticks: u64,
    pub commands_applied: u64,
    pub commands_rejected: u64,
    /// Ticks that took longer than the tick duration.
    pub overruns: u64,
    pub world: WorldStats,
}

/// Start the physics thread. The scene crosses over only once the thread
/// exists; if it never starts, the scene is released on this thread.
pub(crate) fn spawn(
    context: Arc<SimulationContext>,
    scene: Scene,
    commands: Receiver<SceneCommand>,
    pacing: PhysicsPacing,
) -> std::io::Result<JoinHandle<PhysicsReport>> {
    let (handoff, arrival) = mpsc::sync_channel(1);
    let spawned = std::thread::Builder::new()
        .name("wayfarer-physics".into())
        .spawn(move || match arrival.recv() {
            Ok(scene) => run(&context, scene, &commands, pacing),
            Err(_) => PhysicsReport::default(),
        });
    hand_off(spawned, &handoff, scene).map_err(|(err, _)| err)
}

fn hand_off(
    spawned: std::io::Result<JoinHandle<PhysicsReport>>,
    handoff: &SyncSender<Scene>,
    scene: Scene,
) -> Result<JoinHandle<PhysicsReport>, (std::io::Error, WorldStats)> {
    match spawned {
        Ok(handle) => {
            if let Err(SendError(scene)) = handoff.send(scene) {
                let world = scene.release();
                tracing::error!(
                    remaining_actors = world.remaining_actors,
                    "physics thread exited before taking the scene"
                );
            }
            Ok(handle)
        }
        Err(err) => {
            let world = scene.release();
            tracing::error!(
                %err,
                remaining_actors = world.remaining_actors,
                "physics thread failed to start, scene released"
            );
            Err((err, world))
        }
    }
}

fn run(
    context: &SimulationContext,
    mut scene: Scene,
    commands: &Receiver<SceneCommand>,
    pacing: PhysicsPacing,
) -> PhysicsReport {
    let tick = context.tick_duration();
    let dt = tick.as_secs_f32();
    let mut pacer = Pacer::new(match pacing {
        PhysicsPacing::RealTime => Some(tick),
        PhysicsPacing::Unthrottled => None,
    });
    let mut applied = 0;
    let mut rejected = 0;
    let mut ticks = 0;
    tracing::info!(tick_ms = tick.as_secs_f64() * 1000.0, ?pacing, "physics thread started");

    while context.is_running() {
        loop {
            match commands.try_recv() {
                Ok(command) => match scene.apply(command) {
                    Ok(()) => applied += 1,
                    Err(error) => {
                        rejected += 1;
                        tracing::warn!(%error, "scene command rejected");
                    }
                },
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        if context.play_mode() {
            let input = context.input().take();
            let summary = scene.physics_tick(&input, dt);
            ticks += 1;
            if summary.trigger_events > 0 {
                tracing::debug!(
                    tick = summary.tick,
                    events = summary.trigger_events,
                    "trigger events"
                );
            }
        }
        for event in scene.drain_events() {
            tracing::debug!(?event, "scene event");
        }
        context.frames().publish(scene.snapshot());

        pacer.wait();
    }

    let world = scene.release();
    let report = PhysicsReport {
        ticks,
        commands_applied: applied,
        commands_rejected: rejected,
        overruns: pacer.overruns(),
        world,
    };
    tracing::info!(
        ticks = report.ticks,
        overruns = report.overruns,
        remaining_actors = report.world.remaining_actors,
        "physics thread stopped"
    );
    report
}
