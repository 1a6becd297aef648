//! Velocity constraints solved with sequential impulses.
//!
//! Every constraint is a set of Jacobian rows over the six velocity degrees of freedom
//! of two bodies, `[v_a.x, v_a.y, ω_a, v_b.x, v_b.y, ω_b]`.
//! Each solver iteration computes the impulse `λ` that satisfies
//! `J M⁻¹ Jᵀ λ = -J v - bias` and applies `Jᵀ λ` to the bodies.

use super::{collision::Contact, Body, BodyKey};
use crate::math::{self as m, MatMN, Vec2, VecN};

/// Tunable parameters for the constraint solver.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SolverParams {
    /// Number of solver iterations per step.
    /// More iterations make stacks more stable at the cost of CPU time.
    pub iterations: usize,
    /// Baumgarte stabilization factor, the fraction of positional error
    /// fed back into velocity each step.
    pub baumgarte: f64,
    /// Squared distance error tolerated by joints before correction kicks in.
    pub joint_slop: f64,
    /// Penetration depth tolerated by contacts before correction kicks in.
    pub penetration_slop: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            iterations: 5,
            baumgarte: 0.2,
            joint_slop: 0.01,
            penetration_slop: 0.01,
        }
    }
}

/// A constraint between two bodies in a [`World`][super::World].
#[derive(Clone, Debug)]
pub enum Constraint {
    Joint(JointConstraint),
    Penetration(PenetrationConstraint),
}

impl Constraint {
    /// Keys of the two bodies this constraint acts on.
    pub fn bodies(&self) -> [BodyKey; 2] {
        match self {
            Constraint::Joint(c) => c.bodies,
            Constraint::Penetration(c) => c.bodies,
        }
    }

    /// Compute the Jacobian and bias for this step and warm start with the cached impulse.
    pub fn pre_solve(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolverParams) {
        match self {
            Constraint::Joint(c) => c.pre_solve(a, b, dt, params),
            Constraint::Penetration(c) => c.pre_solve(a, b, dt, params),
        }
    }

    /// Run one solver iteration, applying a corrective impulse to both bodies.
    pub fn solve(&mut self, a: &mut Body, b: &mut Body) {
        match self {
            Constraint::Joint(c) => c.solve(a, b),
            Constraint::Penetration(c) => c.solve(a, b),
        }
    }

    /// Hook run once after all iterations of a step.
    pub fn post_solve(&mut self) {}

    /// The impulse accumulated over the current step.
    pub fn cached_impulse(&self) -> &VecN {
        match self {
            Constraint::Joint(c) => &c.cached_lambda,
            Constraint::Penetration(c) => &c.cached_lambda,
        }
    }
}

impl From<JointConstraint> for Constraint {
    fn from(c: JointConstraint) -> Self {
        Constraint::Joint(c)
    }
}

impl From<PenetrationConstraint> for Constraint {
    fn from(c: PenetrationConstraint) -> Self {
        Constraint::Penetration(c)
    }
}

//
// JOINT
//

/// Pins a point on one body to a point on another so they always coincide.
#[derive(Clone, Debug)]
pub struct JointConstraint {
    bodies: [BodyKey; 2],
    /// Anchor points in each body's local space.
    anchors: [Vec2; 2],
    jacobian: MatMN,
    cached_lambda: VecN,
    bias: f64,
}

impl JointConstraint {
    /// Create a joint at the given world-space point.
    pub fn new(key_a: BodyKey, a: &Body, key_b: BodyKey, b: &Body, anchor: Vec2) -> Self {
        Self {
            bodies: [key_a, key_b],
            anchors: [a.world_to_local(anchor), b.world_to_local(anchor)],
            jacobian: MatMN::zeros(1, 6),
            cached_lambda: VecN::zeros(1),
            bias: 0.0,
        }
    }

    #[inline]
    pub fn bodies(&self) -> [BodyKey; 2] {
        self.bodies
    }

    /// Current world-space positions of the anchor on each body.
    pub fn anchor_points(&self, a: &Body, b: &Body) -> [Vec2; 2] {
        [a.local_to_world(self.anchors[0]), b.local_to_world(self.anchors[1])]
    }

    fn pre_solve(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolverParams) {
        let [pa, pb] = self.anchor_points(a, b);
        let ra = pa - a.position();
        let rb = pb - b.position();

        let d = pa - pb;
        let row = self.jacobian.row_mut(0);
        row[0] = 2.0 * d.x;
        row[1] = 2.0 * d.y;
        row[2] = 2.0 * m::cross(ra, d);
        row[3] = -2.0 * d.x;
        row[4] = -2.0 * d.y;
        row[5] = 2.0 * m::cross(rb, -d);

        let warm_start = self.jacobian.transpose().mul_vec(&self.cached_lambda);
        apply_impulses(a, b, &warm_start);

        let error = (d.mag_sq() - params.joint_slop).max(0.0);
        self.bias = params.baumgarte / dt * error;
    }

    fn solve(&mut self, a: &mut Body, b: &mut Body) {
        let lambda = match solve_lambda(&self.jacobian, self.bias, a, b) {
            Some(l) => l,
            None => return,
        };
        self.cached_lambda = &self.cached_lambda + &lambda;

        let impulses = self.jacobian.transpose().mul_vec(&lambda);
        apply_impulses(a, b, &impulses);
    }
}

//
// PENETRATION
//

/// Keeps two bodies from sinking into each other at a contact point,
/// with Coulomb friction along the contact tangent.
#[derive(Clone, Debug)]
pub struct PenetrationConstraint {
    bodies: [BodyKey; 2],
    /// Contact points in each body's local space.
    anchors: [Vec2; 2],
    /// Contact normal in the first body's local frame.
    normal: Vec2,
    friction: f64,
    jacobian: MatMN,
    cached_lambda: VecN,
    bias: f64,
}

impl PenetrationConstraint {
    /// Create a constraint from a contact between `a` and `b`.
    ///
    /// Friction is the larger of the two bodies' friction coefficients.
    /// With zero friction the tangent row is left out entirely.
    pub fn new(key_a: BodyKey, a: &Body, key_b: BodyKey, b: &Body, contact: &Contact) -> Self {
        let friction = a.material.friction.max(b.material.friction);
        let rows = if friction > 0.0 { 2 } else { 1 };
        Self {
            bodies: [key_a, key_b],
            anchors: [a.world_to_local(contact.start), b.world_to_local(contact.end)],
            // direction only, so rotate without translating
            normal: m::rotate(contact.normal, -a.rotation()),
            friction,
            jacobian: MatMN::zeros(rows, 6),
            cached_lambda: VecN::zeros(rows),
            bias: 0.0,
        }
    }

    #[inline]
    pub fn bodies(&self) -> [BodyKey; 2] {
        self.bodies
    }

    #[inline]
    pub fn friction(&self) -> f64 {
        self.friction
    }

    /// The contact normal in world space, given the current pose of the first body.
    pub fn world_normal(&self, a: &Body) -> Vec2 {
        m::rotate(self.normal, a.rotation())
    }

    fn pre_solve(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolverParams) {
        let pa = a.local_to_world(self.anchors[0]);
        let pb = b.local_to_world(self.anchors[1]);
        let n = self.world_normal(a);

        let ra = pa - a.position();
        let rb = pb - b.position();

        let row = self.jacobian.row_mut(0);
        row[0] = -n.x;
        row[1] = -n.y;
        row[2] = -m::cross(ra, n);
        row[3] = n.x;
        row[4] = n.y;
        row[5] = m::cross(rb, n);

        if self.friction > 0.0 {
            let t = m::edge_normal(n);
            let row = self.jacobian.row_mut(1);
            row[0] = -t.x;
            row[1] = -t.y;
            row[2] = -m::cross(ra, t);
            row[3] = t.x;
            row[4] = t.y;
            row[5] = m::cross(rb, t);
        }

        let warm_start = self.jacobian.transpose().mul_vec(&self.cached_lambda);
        apply_impulses(a, b, &warm_start);

        // negative while penetrating
        let error = ((pb - pa).dot(-n) + params.penetration_slop).min(0.0);
        self.bias = params.baumgarte / dt * error;
    }

    fn solve(&mut self, a: &mut Body, b: &mut Body) {
        let lambda = match solve_lambda(&self.jacobian, self.bias, a, b) {
            Some(l) => l,
            None => return,
        };

        // accumulate and clamp: contacts can only push,
        // and friction is bounded by the normal impulse
        let old_lambda = self.cached_lambda.clone();
        self.cached_lambda = &self.cached_lambda + &lambda;
        if self.cached_lambda[0] < 0.0 {
            self.cached_lambda[0] = 0.0;
        }
        if self.friction > 0.0 {
            let max_friction = self.cached_lambda[0] * self.friction;
            self.cached_lambda[1] = m::clamp(self.cached_lambda[1], -max_friction, max_friction);
        }
        let lambda = &self.cached_lambda - &old_lambda;

        let impulses = self.jacobian.transpose().mul_vec(&lambda);
        apply_impulses(a, b, &impulses);
    }
}

//
// shared solver math
//

/// Diagonal inverse mass matrix of the two bodies.
fn inv_mass_matrix(a: &Body, b: &Body) -> MatMN {
    MatMN::from_diagonal(&[
        a.mass.inv(),
        a.mass.inv(),
        a.moment_of_inertia.inv(),
        b.mass.inv(),
        b.mass.inv(),
        b.moment_of_inertia.inv(),
    ])
}

fn velocities(a: &Body, b: &Body) -> VecN {
    VecN::from(vec![
        a.velocity.linear.x,
        a.velocity.linear.y,
        a.velocity.angular,
        b.velocity.linear.x,
        b.velocity.linear.y,
        b.velocity.angular,
    ])
}

/// Solve for the impulse magnitudes of one iteration.
/// Returns `None` if the result is not finite.
fn solve_lambda(jacobian: &MatMN, bias: f64, a: &Body, b: &Body) -> Option<VecN> {
    let jt = jacobian.transpose();
    let lhs = jacobian.mul_mat(&inv_mass_matrix(a, b)).mul_mat(&jt);
    let mut rhs = &jacobian.mul_vec(&velocities(a, b)) * -1.0;
    rhs[0] -= bias;

    let lambda = lhs.solve_gauss_seidel(&rhs);
    if !lambda.is_finite() {
        log::warn!("Discarding non-finite constraint impulse {:?}", lambda.as_slice());
        return None;
    }
    Some(lambda)
}

fn apply_impulses(a: &mut Body, b: &mut Body, impulses: &VecN) {
    a.apply_impulse_linear(Vec2::new(impulses[0], impulses[1]));
    a.apply_impulse_angular(impulses[2]);
    b.apply_impulse_linear(Vec2::new(impulses[3], impulses[4]));
    b.apply_impulse_angular(impulses[5]);
}
