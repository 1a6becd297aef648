use super::{Shape, Velocity};
use crate::math::{self as m, Angle, Vec2};

/// Bodies whose inverse mass is closer to zero than this are considered static.
pub const STATIC_INV_MASS_EPSILON: f64 = 0.005;

/// A rigid body: a shape with mass that moves and rotates.
///
/// Bodies with zero mass are static and never move,
/// which is the intended way to create floors and walls.
#[derive(Clone, Debug)]
pub struct Body {
    position: Vec2,
    rotation: f64,
    pub velocity: Velocity,
    pub linear_acceleration: Vec2,
    pub angular_acceleration: f64,
    sum_forces: Vec2,
    sum_torque: f64,
    pub mass: Mass,
    pub moment_of_inertia: Mass,
    pub material: Material,
    shape: Shape,
    /// Opaque handle for the renderer, e.g. a texture id. Never read by the physics.
    pub render_handle: Option<u64>,
    pub(super) colliding: bool,
}

impl Body {
    /// Create a body with the given shape, position and mass.
    ///
    /// Moment of inertia is derived from the shape. A mass of zero makes the body static.
    pub fn new(shape: Shape, position: impl Into<Vec2>, mass: f64) -> Self {
        let moment_of_inertia = shape.moment_of_inertia_factor() * mass;
        let mut body = Self {
            position: position.into(),
            rotation: 0.0,
            velocity: Velocity::default(),
            linear_acceleration: Vec2::zero(),
            angular_acceleration: 0.0,
            sum_forces: Vec2::zero(),
            sum_torque: 0.0,
            mass: Mass::from(mass),
            moment_of_inertia: Mass::from(moment_of_inertia),
            material: Material::default(),
            shape,
            render_handle: None,
            colliding: false,
        };
        body.refresh_shape();
        body
    }

    /// Set the initial rotation of the body in a builder-like chain.
    pub fn with_rotation(mut self, angle: Angle) -> Self {
        self.set_rotation(angle.rad());
        self
    }

    /// Set the velocity of the body in a builder-like chain.
    pub fn with_velocity(mut self, vel: Velocity) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.material.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f64) -> Self {
        self.material.friction = friction;
        self
    }

    pub fn with_render_handle(mut self, handle: u64) -> Self {
        self.render_handle = Some(handle);
        self
    }

    //
    // accessors
    //

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rotation in radians.
    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Whether this body touched anything during the last step.
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.colliding
    }

    /// Move the body, keeping the shape's world-space vertices in sync.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.refresh_shape();
    }

    /// Rotate the body, keeping the shape's world-space vertices in sync.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.refresh_shape();
    }

    #[inline]
    fn refresh_shape(&mut self) {
        self.shape.update_world_vertices(self.rotation, self.position);
    }

    /// Static bodies have (effectively) infinite mass and are never moved by the simulation.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.mass.inv().abs() < STATIC_INV_MASS_EPSILON
    }

    //
    // forces
    //

    /// Accumulate a force to be applied on the next call to `integrate_forces`.
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.sum_forces += force;
    }

    #[inline]
    pub fn apply_torque(&mut self, torque: f64) {
        self.sum_torque += torque;
    }

    /// Forces accumulated since the last integration.
    #[inline]
    pub fn accumulated_force(&self) -> Vec2 {
        self.sum_forces
    }

    #[inline]
    pub fn accumulated_torque(&self) -> f64 {
        self.sum_torque
    }

    pub fn clear_forces(&mut self) {
        self.sum_forces = Vec2::zero();
        self.sum_torque = 0.0;
    }

    /// Turn accumulated forces into velocity changes with an explicit Euler step,
    /// then clear the accumulators.
    pub fn integrate_forces(&mut self, dt: f64) {
        if self.is_static() {
            self.clear_forces();
            return;
        }

        self.linear_acceleration = self.sum_forces * self.mass.inv();
        self.angular_acceleration = self.sum_torque * self.moment_of_inertia.inv();
        self.velocity += Velocity {
            linear: self.linear_acceleration,
            angular: self.angular_acceleration,
        } * dt;

        self.clear_forces();
    }

    /// Move the body according to its velocity and refresh the shape's vertex cache.
    pub fn integrate_velocities(&mut self, dt: f64) {
        if self.is_static() {
            return;
        }

        self.position += self.velocity.linear * dt;
        self.rotation += self.velocity.angular * dt;
        self.refresh_shape();
    }

    //
    // impulses
    //

    pub fn apply_impulse_linear(&mut self, j: Vec2) {
        if self.is_static() {
            return;
        }
        self.velocity.linear += j * self.mass.inv();
    }

    pub fn apply_impulse_angular(&mut self, j: f64) {
        if self.is_static() {
            return;
        }
        self.velocity.angular += j * self.moment_of_inertia.inv();
    }

    /// Apply an impulse at an offset `r` from the center of mass,
    /// changing both linear and angular velocity.
    pub fn apply_impulse_at_point(&mut self, j: Vec2, r: Vec2) {
        if self.is_static() {
            return;
        }
        self.velocity.linear += j * self.mass.inv();
        self.velocity.angular += m::cross(r, j) * self.moment_of_inertia.inv();
    }

    //
    // coordinate spaces
    //

    /// Transform a point from the body's local space to world space.
    pub fn local_to_world(&self, point: Vec2) -> Vec2 {
        m::rotate(point, self.rotation) + self.position
    }

    /// Transform a point from world space to the body's local space.
    pub fn world_to_local(&self, point: Vec2) -> Vec2 {
        m::rotate(point - self.position, -self.rotation)
    }
}

/// Mass or moment of inertia of a body, which can be infinite.
///
/// This stores both a mass value and its inverse, because calculating inverse mass
/// is expensive and needed a lot in physics calculations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mass {
    Finite { mass: f64, inverse: f64 },
    Infinite,
}

impl From<f64> for Mass {
    /// Zero is the conventional way to ask for infinite mass.
    #[inline]
    fn from(mass: f64) -> Self {
        if mass == 0.0 {
            Mass::Infinite
        } else {
            Mass::Finite {
                mass,
                inverse: 1.0 / mass,
            }
        }
    }
}

impl Mass {
    /// Get the inverse of the mass, which is zero if the mass is infinite.
    #[inline]
    pub fn inv(&self) -> f64 {
        match self {
            Mass::Finite { inverse, .. } => *inverse,
            Mass::Infinite => 0.0,
        }
    }

    /// Get the mass, which is reported as zero if the mass is infinite.
    #[inline]
    pub fn get(&self) -> f64 {
        match self {
            Mass::Finite { mass, .. } => *mass,
            Mass::Infinite => 0.0,
        }
    }
}

/// Surface properties of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Material {
    /// Coefficient of restitution (elasticity), between 0 and 1.
    ///
    /// Only used by [`Contact::resolve_collision`][crate::physics::collision::Contact::resolve_collision];
    /// the constraint solver in `World::step` has no restitution term.
    pub restitution: f64,
    /// Coefficient of friction, non-negative.
    pub friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 1.0,
            friction: 0.7,
        }
    }
}
