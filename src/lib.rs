//! A 2D rigid body physics engine with circles and convex polygons,
//! solved with sequential impulses.

/// Start a profiling span that ends when the returned value is dropped.
///
/// Compiles to nothing unless the `tracy` feature is enabled.
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {
        tracy_client::Client::running()
            .map(|client| client.span(tracy_client::span_location!($name), 0))
    };
}

pub mod math;
pub use math::{uv, Angle, MatMN, Vec2, VecN};

pub mod physics;
pub use physics::{
    body::{Body, Mass, Material},
    collision::{self, Contact, ContactResult},
    constraint::{Constraint, JointConstraint, PenetrationConstraint, SolverParams},
    forcefield::{self, ForceField},
    shape::{Polygon, Shape, ShapeType},
    BodyKey, ConstraintKey, ContactPair, PhysicsError, Velocity, World, WorldParams,
};
