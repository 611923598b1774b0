//! Arcade Physics demo
//!
//! Runs a headless scene for a few seconds of simulated time: a tile floor,
//! a pile of crates dropped from seeded positions, and a player riding an
//! immovable moving platform. Contact counts are logged once per second.
//!
//! Usage: `arcade-physics [config.json]` (set `RUST_LOG=info` to see output)

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use arcade_physics::consts::SIM_DT;
use arcade_physics::sim::{Body, BodySet, Collider, Contact, TileGrid, World};
use arcade_physics::{PhysicsConfig, Rect};

const SEED: u64 = 0x5eed;
const CRATES: usize = 24;
const STEPS: u32 = 600;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => PhysicsConfig::load_or_default(path),
        None => PhysicsConfig {
            gravity: Vec2::new(0.0, 10.0),
            bounds: Rect::new(0.0, 0.0, 640.0, 480.0),
            step_duration: SIM_DT,
            ..Default::default()
        },
    };
    log::info!("Arcade physics demo starting: {config:?}");

    let mut world = World::new(config.clone());
    let mut bodies = BodySet::new();

    // 40x30 map of 16px tiles: solid bottom row and two ledges
    let mut rows = vec![vec![0u32; 40]; 30];
    rows[29].iter_mut().for_each(|t| *t = 1);
    rows[20][4..14].iter_mut().for_each(|t| *t = 2);
    rows[14][24..36].iter_mut().for_each(|t| *t = 2);
    let mut map = TileGrid::from_rows(&rows, 16.0, 16.0);
    map.set_collision_between(1, 2, true);

    let mut rng = Pcg32::seed_from_u64(SEED);
    let mut crates = bodies.create_group();
    for _ in 0..CRATES {
        let x = rng.random_range(16.0..600.0);
        let y = rng.random_range(0.0..120.0);
        let mut body = Body::new(x, y, 14.0, 14.0);
        body.bounce = Vec2::new(0.2, 0.3);
        body.drag.x = 40.0;
        body.set_mass(rng.random_range(0.5..2.0));
        body.collide_world_bounds = true;
        let handle = bodies.insert(body);
        crates.add(&mut bodies, handle);
    }

    let mut platform = Body::new(260.0, 300.0, 96.0, 12.0).immovable();
    platform.allow_gravity = false;
    platform.velocity.x = 60.0;
    let platform = bodies.insert(platform);

    let mut player = Body::new(290.0, 260.0, 16.0, 24.0);
    player.collide_world_bounds = true;
    let player = bodies.insert(player);

    let mut crate_contacts = 0u32;
    let mut tile_contacts = 0u32;
    for step in 1..=STEPS {
        world.step(&mut bodies);

        // Platform patrols between x=200 and x=440
        let p = &mut bodies[platform];
        if (p.position.x > 440.0 && p.velocity.x > 0.0) || (p.position.x < 200.0 && p.velocity.x < 0.0) {
            p.velocity.x = -p.velocity.x;
        }

        world.collide(&mut bodies, player, platform);
        world.collide_with(
            &mut bodies,
            &crates,
            &crates,
            Some(&mut |_, _| crate_contacts += 1),
            None,
        );
        world.collide(&mut bodies, &crates, player);
        world.collide_with(
            &mut bodies,
            &crates,
            Collider::TileLayer(&map),
            Some(&mut |_, other| {
                if matches!(other, Contact::Tile(_)) {
                    tile_contacts += 1;
                }
            }),
            None,
        );
        world.collide(&mut bodies, player, Collider::TileLayer(&map));

        if step % 60 == 0 {
            let resting = crates
                .active_members(&bodies)
                .filter(|&h| bodies[h].on_floor() || bodies[h].touching.down)
                .count();
            log::info!(
                "t={:.1}s crate contacts={} tile contacts={} resting={}/{} player={:?}",
                step as f32 * config.step_duration,
                crate_contacts,
                tile_contacts,
                resting,
                crates.len(),
                bodies[player].position,
            );
        }
    }

    log::info!(
        "Done: {} steps, player riding platform: {}",
        STEPS,
        bodies[player].touching.down && world.overlap(&bodies, player, platform)
    );
}
