//! Forces that are computed from a body's state and applied every step.
//!
//! The free functions are pure and can be used directly with [`Body::apply_force`];
//! the [`ForceField`] implementors wrap them so a [`World`][super::World]
//! can apply them to every body automatically.

use super::Body;
use crate::math::{self as m, Vec2};

/// A (possibly) state-dependent force that is typically
/// fed to a physics world and applied to all rigid bodies each step.
pub trait ForceField {
    fn force_on(&self, body: &Body) -> Vec2;
}

/// A combination of two different force fields.
pub struct Sum<F1: ForceField, F2: ForceField>(pub F1, pub F2);
impl<F1: ForceField, F2: ForceField> ForceField for Sum<F1, F2> {
    fn force_on(&self, body: &Body) -> Vec2 {
        self.0.force_on(body) + self.1.force_on(body)
    }
}

/// The same force on every body, e.g. wind.
pub struct ConstantForce(pub Vec2);
impl ForceField for ConstantForce {
    fn force_on(&self, _body: &Body) -> Vec2 {
        self.0
    }
}

/// Air resistance proportional to squared speed.
pub struct Drag {
    pub k: f64,
}
impl ForceField for Drag {
    fn force_on(&self, body: &Body) -> Vec2 {
        drag_force(body, self.k)
    }
}

/// Constant-magnitude resistance against the direction of motion.
pub struct Friction {
    pub k: f64,
}
impl ForceField for Friction {
    fn force_on(&self, body: &Body) -> Vec2 {
        friction_force(body, self.k)
    }
}

/// A spring connecting every body to a fixed anchor point.
pub struct Spring {
    pub anchor: Vec2,
    pub rest_length: f64,
    pub k: f64,
}
impl ForceField for Spring {
    fn force_on(&self, body: &Body) -> Vec2 {
        spring_force(body, self.anchor, self.rest_length, self.k)
    }
}

//
// generators
//

/// Drag with magnitude `k * |v|²` opposing the body's velocity.
pub fn drag_force(body: &Body, k: f64) -> Vec2 {
    let v = body.velocity.linear;
    let speed_sq = v.mag_sq();
    if speed_sq > 0.0 {
        -m::normalize(v) * (k * speed_sq)
    } else {
        Vec2::zero()
    }
}

/// Friction with magnitude `k` opposing the body's velocity.
pub fn friction_force(body: &Body, k: f64) -> Vec2 {
    -m::normalize(body.velocity.linear) * k
}

/// Newtonian attraction of `a` towards `b`.
///
/// The squared distance is clamped to `[min_dist_sq, max_dist_sq]`
/// to keep the force from blowing up when bodies get very close.
/// The force on `b` is the negation of the returned value.
pub fn gravitational_force(
    a: &Body,
    b: &Body,
    g: f64,
    min_dist_sq: f64,
    max_dist_sq: f64,
) -> Vec2 {
    let d = b.position() - a.position();
    if d.mag_sq() == 0.0 {
        return Vec2::zero();
    }
    let dist_sq = m::clamp(d.mag_sq(), min_dist_sq, max_dist_sq);
    let magnitude = g * a.mass.get() * b.mass.get() / dist_sq;
    m::normalize(d) * magnitude
}

/// Hooke's law spring between the body and an anchor point.
pub fn spring_force(body: &Body, anchor: Vec2, rest_length: f64, k: f64) -> Vec2 {
    let d = body.position() - anchor;
    let displacement = d.mag() - rest_length;
    m::normalize(d) * (-k * displacement)
}
