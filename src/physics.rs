use crate::math::{self as m, Vec2};

//

pub mod shape;
pub use shape::{Shape, ShapeType};

pub mod body;
pub use body::{Body, Mass, Material};

pub mod body_set;
pub use body_set::{BodyKey, BodySet};

pub mod collision;
use collision::intersection_check;
pub use collision::{Contact, ContactResult};

pub mod constraint;
pub use constraint::{Constraint, JointConstraint, PenetrationConstraint, SolverParams};

pub mod constraint_set;
pub use constraint_set::{ConstraintKey, ConstraintSet};

pub mod forcefield;
pub use forcefield::ForceField;

//

/// Velocity of an object.
///
// Equivalent to a Vec3 but with names for the translational and rotational part.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Velocity {
    /// Linear velocity in pixels per second.
    pub linear: m::Vec2,
    /// Angular velocity in radians per second.
    pub angular: f64,
}

impl Velocity {
    /// Get the linear velocity of a point offset from the center of mass.
    pub fn point_velocity(&self, offset: m::Vec2) -> m::Vec2 {
        let tangent = m::left_normal(offset) * self.angular;
        self.linear + tangent
    }
}

impl std::ops::Add for Velocity {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
            angular: self.angular + other.angular,
        }
    }
}
impl std::ops::AddAssign for Velocity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}
impl std::ops::Mul<f64> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f64) -> Self::Output {
        Velocity {
            linear: self.linear * rhs,
            angular: self.angular * rhs,
        }
    }
}

/// Errors from misusing the physics API.
///
/// Numerical trouble during simulation is never reported as an error;
/// it's absorbed by the solver and logged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("No body exists for key {0:?}")]
    UnknownBody(BodyKey),
    #[error("A constraint needs two different bodies")]
    SameBody,
    #[error("Body is still used by {constraints} constraint(s)")]
    BodyInUse { constraints: usize },
    #[error("A polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),
}

/// Global parameters of a physics world.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WorldParams {
    /// Gravitational acceleration in metres per second squared.
    /// Negative values pull towards positive y, i.e. down on screen.
    pub gravity: f64,
    /// Scale between physical units and the pixel units positions are stored in.
    pub pixels_per_meter: f64,
    pub solver: SolverParams,
}

impl Default for WorldParams {
    fn default() -> Self {
        Self {
            gravity: -9.8,
            pixels_per_meter: 50.0,
            solver: SolverParams::default(),
        }
    }
}

/// A contact detected during the last step, along with the bodies involved.
#[derive(Clone, Copy, Debug)]
pub struct ContactPair {
    pub bodies: [BodyKey; 2],
    pub contact: Contact,
}

/// A 2D physics simulation.
pub struct World {
    pub params: WorldParams,
    bodies: BodySet,
    constraints: ConstraintSet,
    forces: Vec<Vec2>,
    torques: Vec<f64>,
    force_fields: Vec<Box<dyn ForceField>>,
    contacts: Vec<ContactPair>,
}

impl Default for World {
    fn default() -> Self {
        Self::with_params(WorldParams::default())
    }
}

impl World {
    /// Create a world with the given gravity and default parameters otherwise.
    pub fn new(gravity: f64) -> Self {
        Self::with_params(WorldParams {
            gravity,
            ..Default::default()
        })
    }

    pub fn with_params(params: WorldParams) -> Self {
        World {
            params,
            bodies: BodySet::new(),
            constraints: ConstraintSet::new(),
            forces: Vec::new(),
            torques: Vec::new(),
            force_fields: Vec::new(),
            contacts: Vec::new(),
        }
    }

    //
    // bodies
    //

    pub fn add_body(&mut self, body: Body) -> BodyKey {
        let key = self.bodies.insert(body);
        log::debug!("Added body {:?}", key);
        key
    }

    /// Access a body, if it still exists.
    #[inline]
    pub fn body(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    /// Mutably access a body, e.g. to apply impulses from user input.
    #[inline]
    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut Body> {
        self.bodies.get_mut(key)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter()
    }

    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyKey, &mut Body)> {
        self.bodies.iter_mut()
    }

    /// Remove a body from the world.
    ///
    /// Fails if any constraint still refers to the body;
    /// remove those constraints first.
    pub fn remove_body(&mut self, key: BodyKey) -> Result<Body, PhysicsError> {
        let in_use = self.constraints.touching(key).count();
        if in_use > 0 {
            return Err(PhysicsError::BodyInUse {
                constraints: in_use,
            });
        }
        let body = self
            .bodies
            .remove(key)
            .ok_or(PhysicsError::UnknownBody(key))?;
        self.contacts.retain(|c| !c.bodies.contains(&key));
        log::debug!("Removed body {:?}", key);
        Ok(body)
    }

    //
    // constraints
    //

    /// Join two bodies together at a point given in world space.
    pub fn add_joint(
        &mut self,
        a: BodyKey,
        b: BodyKey,
        anchor: Vec2,
    ) -> Result<ConstraintKey, PhysicsError> {
        let joint = {
            let (body_a, body_b) = self.pair(a, b)?;
            JointConstraint::new(a, body_a, b, body_b, anchor)
        };
        Ok(self.insert_constraint(joint.into()))
    }

    /// Add a persistent constraint that is solved every step until removed.
    pub fn add_constraint(
        &mut self,
        constraint: impl Into<Constraint>,
    ) -> Result<ConstraintKey, PhysicsError> {
        let constraint = constraint.into();
        let [a, b] = constraint.bodies();
        self.pair(a, b)?;
        Ok(self.insert_constraint(constraint))
    }

    fn insert_constraint(&mut self, constraint: Constraint) -> ConstraintKey {
        let key = self.constraints.insert(constraint);
        log::debug!("Added constraint {:?}", key);
        key
    }

    /// Validate that two keys refer to different living bodies.
    fn pair(&self, a: BodyKey, b: BodyKey) -> Result<(&Body, &Body), PhysicsError> {
        if a == b {
            return Err(PhysicsError::SameBody);
        }
        let body_a = self.bodies.get(a).ok_or(PhysicsError::UnknownBody(a))?;
        let body_b = self.bodies.get(b).ok_or(PhysicsError::UnknownBody(b))?;
        Ok((body_a, body_b))
    }

    #[inline]
    pub fn constraint(&self, key: ConstraintKey) -> Option<&Constraint> {
        self.constraints.get(key)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintKey, &Constraint)> {
        self.constraints.iter()
    }

    /// Remove a constraint, returning it if it still existed.
    pub fn remove_constraint(&mut self, key: ConstraintKey) -> Option<Constraint> {
        let removed = self.constraints.remove(key);
        if removed.is_some() {
            log::debug!("Removed constraint {:?}", key);
        }
        removed
    }

    //
    // global forces
    //

    /// Add a force applied to every body on every step.
    pub fn add_force(&mut self, force: Vec2) {
        self.forces.push(force);
    }

    /// Add a torque applied to every body on every step.
    pub fn add_torque(&mut self, torque: f64) {
        self.torques.push(torque);
    }

    /// Add a force field evaluated for every body on every step.
    pub fn add_force_field(&mut self, field: impl ForceField + 'static) {
        self.force_fields.push(Box::new(field));
    }

    /// Contacts found during the last step, for debug visualization.
    #[inline]
    pub fn contacts(&self) -> &[ContactPair] {
        &self.contacts
    }

    //
    // simulation
    //

    /// Advance the simulation by `dt` seconds.
    ///
    /// Callers should clamp `dt` to a small value (e.g. 1/60)
    /// since large timesteps make the solver unstable.
    /// Non-positive or non-finite timesteps do nothing.
    pub fn step(&mut self, dt: f64) {
        let _span = tracy_span!("physics step", "step");

        if !(dt > 0.0 && dt.is_finite()) {
            log::warn!("Ignoring physics step with invalid timestep {}", dt);
            return;
        }

        self.apply_forces();

        for (_, body) in self.bodies.iter_mut() {
            body.integrate_forces(dt);
        }

        let mut penetrations = self.detect_collisions();

        self.solve_constraints(&mut penetrations, dt);

        let _span = tracy_span!("integrate velocities", "step");
        for (_, body) in self.bodies.iter_mut() {
            body.integrate_velocities(dt);
        }

        log::trace!(
            "Stepped {} bodies, {} constraints, {} contacts",
            self.bodies.len(),
            self.constraints.len(),
            self.contacts.len()
        );
    }

    /// Weight, global forces and torques, and force fields.
    fn apply_forces(&mut self) {
        let _span = tracy_span!("apply forces", "apply_forces");

        let g = -self.params.gravity * self.params.pixels_per_meter;
        for (_, body) in self.bodies.iter_mut() {
            let weight = Vec2::new(0.0, body.mass.get() * g);
            body.apply_force(weight);

            for &force in &self.forces {
                body.apply_force(force);
            }
            for &torque in &self.torques {
                body.apply_torque(torque);
            }
            for field in &self.force_fields {
                let force = field.force_on(body);
                body.apply_force(force);
            }
        }
    }

    /// Check all pairs of bodies for contact,
    /// recording the contacts and building a penetration constraint for each.
    fn detect_collisions(&mut self) -> Vec<Constraint> {
        let _span = tracy_span!("detect collisions", "detect_collisions");

        self.contacts.clear();
        for (_, body) in self.bodies.iter_mut() {
            body.colliding = false;
        }

        let keys: Vec<BodyKey> = self.bodies.keys().collect();
        let mut penetrations = Vec::new();
        for (i, &ka) in keys.iter().enumerate() {
            for &kb in &keys[i + 1..] {
                let (a, b) = match (self.bodies.get(ka), self.bodies.get(kb)) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };
                if a.is_static() && b.is_static() {
                    continue;
                }

                for contact in intersection_check(a, b).iter() {
                    penetrations.push(PenetrationConstraint::new(ka, a, kb, b, contact).into());
                    self.contacts.push(ContactPair {
                        bodies: [ka, kb],
                        contact: *contact,
                    });
                }
            }
        }

        for pair in &self.contacts {
            for key in pair.bodies {
                if let Some(body) = self.bodies.get_mut(key) {
                    body.colliding = true;
                }
            }
        }

        penetrations
    }

    /// Persistent constraints first, then this step's penetrations, in every phase.
    fn solve_constraints(&mut self, penetrations: &mut [Constraint], dt: f64) {
        let _span = tracy_span!("solve constraints", "solve_constraints");

        let bodies = &mut self.bodies;
        let persistent = &mut self.constraints.constraints;
        let params = &self.params.solver;

        for (_, c) in persistent.iter_mut() {
            with_bodies(bodies, c, |c, a, b| c.pre_solve(a, b, dt, params));
        }
        for c in penetrations.iter_mut() {
            with_bodies(bodies, c, |c, a, b| c.pre_solve(a, b, dt, params));
        }

        for _ in 0..params.iterations {
            for (_, c) in persistent.iter_mut() {
                with_bodies(bodies, c, |c, a, b| c.solve(a, b));
            }
            for c in penetrations.iter_mut() {
                with_bodies(bodies, c, |c, a, b| c.solve(a, b));
            }
        }

        for (_, c) in persistent.iter_mut() {
            c.post_solve();
        }
        for c in penetrations.iter_mut() {
            c.post_solve();
        }
    }
}

/// Run a function on a constraint and the two bodies it acts on.
fn with_bodies(
    bodies: &mut BodySet,
    constraint: &mut Constraint,
    f: impl FnOnce(&mut Constraint, &mut Body, &mut Body),
) {
    let [ka, kb] = constraint.bodies();
    match bodies.get2_mut(ka, kb) {
        Some((a, b)) => f(constraint, a, b),
        None => log::warn!("Skipping constraint between missing bodies {:?}", [ka, kb]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Angle;

    #[test]
    fn gravity_pulls_down_on_screen() {
        let mut world = World::new(-9.8);
        let ball = world.add_body(Body::new(Shape::circle(5.0), [0.0, 0.0], 2.0));
        world.step(0.1);

        let body = world.body(ball).unwrap();
        // weight = 2 * 9.8 * 50 = 980, a = 490
        assert!((body.velocity.linear.y - 49.0).abs() < 1e-9);
        assert!((body.position().y - 4.9).abs() < 1e-9);
        assert_eq!(body.position().x, 0.0);
    }

    #[test]
    fn static_bodies_never_move() {
        let mut world = World::new(-9.8);
        world.add_force(Vec2::new(100.0, 0.0));
        world.add_torque(10.0);
        let wall = world.add_body(
            Body::new(Shape::rect(20.0, 200.0), [100.0, 0.0], 0.0)
                .with_rotation(Angle::Deg(10.0)),
        );
        // a ball thrown into the wall
        world.add_body(
            Body::new(Shape::circle(10.0), [70.0, 0.0], 1.0).with_velocity(Velocity {
                linear: Vec2::new(300.0, 0.0),
                angular: 0.0,
            }),
        );

        for _ in 0..120 {
            world.body_mut(wall).unwrap().apply_impulse_linear(Vec2::new(5.0, 5.0));
            world.step(1.0 / 60.0);
        }

        let wall = world.body(wall).unwrap();
        assert_eq!(wall.position(), Vec2::new(100.0, 0.0));
        assert_eq!(wall.rotation(), Angle::Deg(10.0).rad());
        assert_eq!(wall.velocity, Velocity::default());
    }

    #[test]
    fn contacts_are_recorded_and_flagged() {
        let mut world = World::new(0.0);
        let a = world.add_body(Body::new(Shape::circle(10.0), [0.0, 0.0], 1.0));
        let b = world.add_body(Body::new(Shape::circle(10.0), [15.0, 0.0], 1.0));
        let c = world.add_body(Body::new(Shape::circle(10.0), [100.0, 0.0], 1.0));

        world.step(1.0 / 60.0);

        assert_eq!(world.contacts().len(), 1);
        assert_eq!(world.contacts()[0].bodies, [a, b]);
        assert!(world.body(a).unwrap().is_colliding());
        assert!(world.body(b).unwrap().is_colliding());
        assert!(!world.body(c).unwrap().is_colliding());
        // pushed apart
        assert!(world.body(a).unwrap().velocity.linear.x < 0.0);
        assert!(world.body(b).unwrap().velocity.linear.x > 0.0);
    }

    #[test]
    fn static_bodies_do_not_store_up_forces() {
        let mut world = World::new(0.0);
        world.add_force(Vec2::new(10.0, 0.0));
        let wall = world.add_body(Body::new(Shape::rect(20.0, 200.0), [0.0, 0.0], 0.0));

        for _ in 0..600 {
            world.step(1.0 / 60.0);
        }
        assert_eq!(world.body(wall).unwrap().accumulated_force(), Vec2::zero());
        assert_eq!(world.body(wall).unwrap().accumulated_torque(), 0.0);

        // once it can move, it only feels this step's force
        world.body_mut(wall).unwrap().mass = Mass::from(1.0);
        world.step(1.0 / 60.0);
        let v = world.body(wall).unwrap().velocity.linear;
        assert!((v.x - 10.0 / 60.0).abs() < 1e-9, "velocity {:?}", v);
    }

    #[test]
    fn overlapping_static_bodies_are_ignored() {
        let mut world = World::new(-9.8);
        world.add_body(Body::new(Shape::rect(100.0, 10.0), [0.0, 0.0], 0.0));
        world.add_body(Body::new(Shape::rect(10.0, 100.0), [0.0, 0.0], 0.0));
        world.step(1.0 / 60.0);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn invalid_timesteps_do_nothing() {
        let mut world = World::new(-9.8);
        let ball = world.add_body(Body::new(Shape::circle(5.0), [0.0, 0.0], 1.0));
        world.step(0.0);
        world.step(-1.0);
        world.step(f64::NAN);
        let body = world.body(ball).unwrap();
        assert_eq!(body.position(), Vec2::zero());
        assert_eq!(body.velocity, Velocity::default());
    }

    #[test]
    fn joint_errors() {
        let mut world = World::new(-9.8);
        let a = world.add_body(Body::new(Shape::circle(5.0), [0.0, 0.0], 1.0));
        let b = world.add_body(Body::new(Shape::circle(5.0), [20.0, 0.0], 1.0));

        assert_eq!(
            world.add_joint(a, a, Vec2::zero()),
            Err(PhysicsError::SameBody)
        );

        let joint = world.add_joint(a, b, Vec2::new(10.0, 0.0)).unwrap();
        match world.remove_body(b) {
            Err(PhysicsError::BodyInUse { constraints: 1 }) => {}
            other => panic!("Expected BodyInUse, got {:?}", other.map(|_| ())),
        }

        assert!(world.remove_constraint(joint).is_some());
        assert!(world.remove_constraint(joint).is_none());
        assert!(world.remove_body(b).is_ok());
        match world.remove_body(b) {
            Err(PhysicsError::UnknownBody(key)) => assert_eq!(key, b),
            other => panic!("Expected UnknownBody, got {:?}", other.map(|_| ())),
        }
        assert_eq!(
            world.add_joint(a, b, Vec2::zero()),
            Err(PhysicsError::UnknownBody(b))
        );
    }

    #[test]
    fn global_forces_and_fields_apply_to_every_body() {
        let mut world = World::new(0.0);
        world.add_force(Vec2::new(2.0, 0.0));
        world.add_force_field(forcefield::ConstantForce(Vec2::new(0.0, 3.0)));
        let light = world.add_body(Body::new(Shape::circle(1.0), [0.0, 0.0], 1.0));
        let heavy = world.add_body(Body::new(Shape::circle(1.0), [50.0, 0.0], 2.0));

        world.step(1.0);

        assert_eq!(world.body(light).unwrap().velocity.linear, Vec2::new(2.0, 3.0));
        assert_eq!(world.body(heavy).unwrap().velocity.linear, Vec2::new(1.0, 1.5));
    }

    #[cfg(feature = "serde-types")]
    #[test]
    fn params_from_ron() {
        let params: WorldParams = ron::from_str("(gravity: -3.7, solver: (iterations: 10))")
            .expect("Failed to parse world params");
        assert_eq!(params.gravity, -3.7);
        assert_eq!(params.pixels_per_meter, 50.0);
        assert_eq!(params.solver.iterations, 10);
        assert_eq!(params.solver.baumgarte, 0.2);
    }
}
