//! A headless run of a small physics playground: a floor and fences,
//! stacks of boxes, a plank structure with a triangle on top,
//! a rope bridge held together by joints and some round critters.
//!
//! Run with `RUST_LOG=debug` (or `trace` for per-step output)
//! to see what the world is doing.

use rigidframe::{self as rf, Angle, Body, Shape, Vec2, Velocity, World};

const WIDTH: f64 = 1600.0;
const HEIGHT: f64 = 900.0;
const STEPS: usize = 600;
const DT: f64 = 1.0 / 60.0;

fn main() -> Result<(), rf::PhysicsError> {
    env_logger::init();

    let mut world = World::new(-9.8);

    let bird = world.add_body(
        Body::new(Shape::circle(45.0), [100.0, HEIGHT / 2.0 + 220.0], 3.0).with_render_handle(0),
    );

    // walls to keep everything on screen
    let floor_y = HEIGHT / 2.0 + 340.0;
    world.add_body(Body::new(
        Shape::rect(WIDTH - 50.0, 50.0),
        [WIDTH / 2.0, floor_y],
        0.0,
    ));
    for x in [0.0, WIDTH] {
        world.add_body(Body::new(
            Shape::rect(50.0, HEIGHT - 200.0),
            [x, HEIGHT / 2.0 - 35.0],
            0.0,
        ));
    }

    // a tower of progressively lighter boxes
    for i in 1..=4 {
        let mass = 10.0 / i as f64;
        world.add_body(
            Body::new(Shape::rect(50.0, 50.0), [600.0, floor_y - i as f64 * 55.0], mass)
                .with_friction(0.9)
                .with_restitution(0.1),
        );
    }

    // two posts and a plank across them
    let post_y = floor_y - 100.0;
    world.add_body(Body::new(Shape::rect(50.0, 150.0), [WIDTH / 2.0 + 20.0, post_y], 5.0));
    world.add_body(Body::new(Shape::rect(50.0, 150.0), [WIDTH / 2.0 + 180.0, post_y], 5.0));
    let plank_pos = Vec2::new(WIDTH / 2.0 + 100.0, floor_y - 200.0);
    world.add_body(Body::new(Shape::rect(250.0, 25.0), plank_pos, 2.0));

    let triangle = Shape::polygon(vec![
        Vec2::new(30.0, 30.0),
        Vec2::new(-30.0, 30.0),
        Vec2::new(0.0, -30.0),
    ])?;
    world.add_body(Body::new(triangle, [plank_pos.x, plank_pos.y - 50.0], 0.5));

    // pyramid
    for col in 0..5 {
        for row in 0..col {
            let x = plank_pos.x + 200.0 + col as f64 * 50.0 - row as f64 * 25.0;
            let y = floor_y - 50.0 - row as f64 * 52.0;
            let mass = 5.0 / (row as f64 + 1.0);
            world.add_body(
                Body::new(Shape::rect(50.0, 50.0), [x, y], mass)
                    .with_friction(0.9)
                    .with_restitution(0.0),
            );
        }
    }

    // a bridge of small circles hanging between two static anchors
    let start = Vec2::new(200.0, 200.0);
    let mut last = world.add_body(Body::new(Shape::rect(80.0, 20.0), start, 0.0));
    let mut last_pos = start;
    for i in 1..=10 {
        let pos = Vec2::new(start.x + 30.0 + i as f64 * 33.0, start.y + 20.0);
        let mass = if i == 10 { 0.0 } else { 3.0 };
        let step = world.add_body(Body::new(Shape::circle(15.0), pos, mass));
        world.add_joint(last, step, pos)?;
        last = step;
        last_pos = pos;
    }
    world.add_body(Body::new(
        Shape::rect(80.0, 20.0),
        [last_pos.x + 60.0, last_pos.y - 20.0],
        0.0,
    ));

    for (pos, mass) in [
        ([WIDTH / 2.0 + 100.0, floor_y - 50.0], 3.0),
        ([WIDTH / 2.0 + 580.0, floor_y - 50.0], 3.0),
        ([WIDTH / 2.0 + 640.0, floor_y - 50.0], 3.0),
        ([220.0, 130.0], 1.0),
    ] {
        world.add_body(
            Body::new(Shape::circle(30.0), pos, mass).with_rotation(Angle::Deg(45.0)),
        );
    }

    log::info!("Simulating {} bodies for {} steps", world.bodies().count(), STEPS);

    for frame in 0..STEPS {
        // launch the bird after it has settled
        if frame == 60 {
            if let Some(bird) = world.body_mut(bird) {
                bird.velocity = Velocity {
                    linear: Vec2::new(900.0, -600.0),
                    angular: 0.0,
                };
            }
        }

        world.step(DT);

        if frame % 60 == 0 {
            let colliding = world.bodies().filter(|(_, b)| b.is_colliding()).count();
            log::info!(
                "t = {:.1}s: {} contacts, {} bodies touching something",
                frame as f64 * DT,
                world.contacts().len(),
                colliding
            );
        }
    }

    for (key, body) in world.bodies() {
        log::debug!(
            "{:?} {:?} at ({:.1}, {:.1}) rotated {:.2} rad",
            key,
            body.shape().shape_type(),
            body.position().x,
            body.position().y,
            body.rotation()
        );
    }

    Ok(())
}
