use std::hint::black_box;
use std::time::Instant;

use glam::{Mat4, Vec3};
use wayfarer_physics::{
    BodyKind, CharacterController, ColliderDesc, ColliderShape, ControllerConfig, MeshSource,
    PhysicsComponent, PhysicsWorld, WorldConfig,
};

const DT: f32 = 1.0 / 50.0;

fn make_world(crates: usize) -> (PhysicsWorld, Vec<PhysicsComponent>) {
    let mut world = PhysicsWorld::new(WorldConfig::default()).expect("world");
    let mut components = Vec::new();

    let heights: Vec<f32> = (0..32 * 32).map(|i| ((i % 32) as f32 * 0.3).sin()).collect();
    components.push(PhysicsComponent::from_desc(
        &mut world,
        &Mat4::IDENTITY,
        &ColliderDesc::new(ColliderShape::TriangleMesh {
            mesh: MeshSource::grid(32, 32, 4.0, &heights),
        }),
    ));

    let side = (crates as f32).sqrt().ceil() as usize;
    for i in 0..crates {
        let x = (i % side) as f32 * 3.0 - 30.0;
        let z = (i / side) as f32 * 3.0 - 30.0;
        components.push(PhysicsComponent::from_desc(
            &mut world,
            &Mat4::from_translation(Vec3::new(x, 10.0, z)),
            &ColliderDesc::new(ColliderShape::Box { extents: Vec3::ONE })
                .with_body(BodyKind::Dynamic),
        ));
    }
    (world, components)
}

fn bench_world_tick(crates: usize, iterations: usize) {
    let (mut world, _components) = make_world(crates);

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(world.tick(DT));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  world tick ({crates} dynamic boxes, {iterations} iters)");
    println!("    {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_controller_tick(iterations: usize) {
    let (mut world, _components) = make_world(0);
    world.tick(DT);
    let mut controller = CharacterController::new(
        &mut world,
        ControllerConfig::default(),
        &Mat4::from_translation(Vec3::new(0.0, 8.0, 0.0)),
    );

    let start = Instant::now();
    for i in 0..iterations {
        let speed = if (i / 100) % 2 == 0 { 20.0 } else { -20.0 };
        controller.motor_mut().state_mut().velocity.x = speed;
        black_box(controller.physics_update(&mut world, DT, None));
        world.tick(DT);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  controller + world tick ({iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Physics Tick Benchmarks ===\n");

    println!("World step:");
    bench_world_tick(0, 1000);
    bench_world_tick(100, 500);
    bench_world_tick(1000, 100);

    println!("\nCharacter controller:");
    bench_controller_tick(1000);

    println!("\n=== Done ===");
}
