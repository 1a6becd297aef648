use super::Body;
use crate::math::{self as m, Vec2};

pub mod narrowphase;
pub use narrowphase::intersection_check;

/// An intersection between two bodies.
///
/// All points are in world space and the normal points from the first body to the second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// The deepest point of the second body inside the first.
    pub start: Vec2,
    /// The deepest point of the first body inside the second.
    pub end: Vec2,
    /// Unit normal, facing away from the first body.
    pub normal: Vec2,
    /// Penetration depth along the normal.
    pub depth: f64,
}

impl Contact {
    /// Swap the roles of the two bodies.
    pub fn flipped(self) -> Self {
        Contact {
            start: self.end,
            end: self.start,
            normal: -self.normal,
            depth: self.depth,
        }
    }

    /// Push the bodies apart along the normal so they no longer overlap,
    /// each moving in proportion to its inverse mass.
    ///
    /// Does nothing if both bodies are static.
    pub fn resolve_penetration(&self, a: &mut Body, b: &mut Body) {
        if a.is_static() && b.is_static() {
            return;
        }

        let inv_sum = a.mass.inv() + b.mass.inv();
        let da = self.depth / inv_sum * a.mass.inv();
        let db = self.depth / inv_sum * b.mass.inv();

        a.set_position(a.position() - self.normal * da);
        b.set_position(b.position() + self.normal * db);
    }

    /// Separate the bodies and apply a single bouncing impulse
    /// including restitution and friction.
    ///
    /// This is the simpler alternative to the constraint solver
    /// and is not used by [`World::step`][super::World::step].
    pub fn resolve_collision(&self, a: &mut Body, b: &mut Body) {
        self.resolve_penetration(a, b);

        let e = a.material.restitution.min(b.material.restitution);
        let f = a.material.friction.min(b.material.friction);

        let ra = self.end - a.position();
        let rb = self.start - b.position();
        let v_rel = a.velocity.point_velocity(ra) - b.velocity.point_velocity(rb);

        let effective_inv_mass = |dir: Vec2| {
            let ra_x = m::cross(ra, dir);
            let rb_x = m::cross(rb, dir);
            a.mass.inv()
                + b.mass.inv()
                + ra_x * ra_x * a.moment_of_inertia.inv()
                + rb_x * rb_x * b.moment_of_inertia.inv()
        };

        let normal = self.normal;
        let j_n = -(1.0 + e) * v_rel.dot(normal) / effective_inv_mass(normal);

        let tangent = m::edge_normal(normal);
        let j_t = f * -(1.0 + e) * v_rel.dot(tangent) / effective_inv_mass(tangent);

        let j = normal * j_n + tangent * j_t;
        if !(j.x.is_finite() && j.y.is_finite()) {
            log::warn!("Discarding non-finite collision impulse {:?}", j);
            return;
        }

        a.apply_impulse_at_point(j, ra);
        b.apply_impulse_at_point(-j, rb);
    }
}

/// 0-2 points of contact can occur between two 2D objects.
#[derive(Clone, Copy, Debug)]
pub enum ContactResult {
    Zero,
    One(Contact),
    Two(Contact, Contact),
}

impl ContactResult {
    pub fn iter(&self) -> ContactIterator<'_> {
        ContactIterator { cr: self, idx: 0 }
    }

    /// Execute a function on every contact in the result.
    pub fn map(self, f: impl Fn(Contact) -> Contact) -> Self {
        match self {
            ContactResult::Zero => ContactResult::Zero,
            ContactResult::One(c) => ContactResult::One(f(c)),
            ContactResult::Two(c1, c2) => ContactResult::Two(f(c1), f(c2)),
        }
    }

    #[inline]
    pub fn is_colliding(&self) -> bool {
        !matches!(self, ContactResult::Zero)
    }

    pub fn len(&self) -> usize {
        match self {
            ContactResult::Zero => 0,
            ContactResult::One(_) => 1,
            ContactResult::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.is_colliding()
    }
}

/// An iterator over the contacts in a ContactResult.
pub struct ContactIterator<'a> {
    cr: &'a ContactResult,
    idx: u8,
}
impl<'a> Iterator for ContactIterator<'a> {
    type Item = &'a Contact;

    fn next(&mut self) -> Option<Self::Item> {
        self.idx += 1;
        use ContactResult::*;
        match (self.cr, self.idx - 1) {
            (Zero, _) => None,
            (One(c), 0) => Some(c),
            (One(_), _) => None,
            (Two(c1, _), 0) => Some(c1),
            (Two(_, c2), 1) => Some(c2),
            (Two(_, _), _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Shape, Velocity};

    fn kinetic_energy(b: &Body) -> f64 {
        0.5 * b.mass.get() * b.velocity.linear.mag_sq()
            + 0.5 * b.moment_of_inertia.get() * b.velocity.angular * b.velocity.angular
    }

    #[test]
    fn penetration_resolution_separates_circles() {
        let mut a = Body::new(Shape::circle(10.0), [0.0, 0.0], 1.0);
        let mut b = Body::new(Shape::circle(10.0), [15.0, 0.0], 1.0);

        let contact = match intersection_check(&a, &b) {
            ContactResult::One(c) => c,
            other => panic!("Expected one contact, got {:?}", other),
        };
        assert!((contact.depth - 5.0).abs() < 1e-9);

        let before = (b.position() - a.position()).mag();
        contact.resolve_penetration(&mut a, &mut b);
        let after = (b.position() - a.position()).mag();

        assert!(after >= before);
        assert!((after - 20.0).abs() < 1e-9);
        // equal masses move equally
        assert!((a.position().x + 2.5).abs() < 1e-9);
        assert!((b.position().x - 17.5).abs() < 1e-9);
    }

    #[test]
    fn penetration_resolution_moves_only_dynamic_body() {
        let mut floor = Body::new(Shape::rect(100.0, 10.0), [0.0, 0.0], 0.0);
        let mut ball = Body::new(Shape::circle(5.0), [0.0, 8.0], 1.0);

        let contact = intersection_check(&floor, &ball)
            .iter()
            .next()
            .copied()
            .expect("ball should overlap the floor");
        contact.resolve_penetration(&mut floor, &mut ball);

        assert_eq!(floor.position(), Vec2::zero());
        assert!((ball.position().y - 10.0).abs() < 1e-9);
        assert!(intersection_check(&floor, &ball)
            .iter()
            .all(|c| c.depth < 1e-9));
    }

    #[test]
    fn elastic_head_on_collision_swaps_velocities() {
        let mut a = Body::new(Shape::circle(10.0), [0.0, 0.0], 1.0)
            .with_restitution(1.0)
            .with_friction(0.0)
            .with_velocity(Velocity {
                linear: Vec2::new(10.0, 0.0),
                angular: 0.0,
            });
        let mut b = Body::new(Shape::circle(10.0), [19.0, 0.0], 1.0)
            .with_restitution(1.0)
            .with_friction(0.0)
            .with_velocity(Velocity {
                linear: Vec2::new(-10.0, 0.0),
                angular: 0.0,
            });
        let energy_before = kinetic_energy(&a) + kinetic_energy(&b);

        let contact = intersection_check(&a, &b)
            .iter()
            .next()
            .copied()
            .expect("circles should overlap");
        contact.resolve_collision(&mut a, &mut b);

        assert!((a.velocity.linear - Vec2::new(-10.0, 0.0)).mag() < 1e-9);
        assert!((b.velocity.linear - Vec2::new(10.0, 0.0)).mag() < 1e-9);
        let energy_after = kinetic_energy(&a) + kinetic_energy(&b);
        assert!((energy_after - energy_before).abs() < 1e-9);
    }

    #[test]
    fn contact_result_iteration() {
        let c = Contact {
            start: Vec2::zero(),
            end: Vec2::unit_x(),
            normal: Vec2::unit_x(),
            depth: 1.0,
        };
        itertools::assert_equal(ContactResult::Zero.iter(), std::iter::empty::<&Contact>());
        assert_eq!(ContactResult::One(c).iter().count(), 1);
        assert_eq!(ContactResult::Two(c, c).len(), 2);

        let flipped = ContactResult::One(c).map(Contact::flipped);
        let fc = flipped.iter().next().copied().unwrap();
        assert_eq!(fc.normal, -Vec2::unit_x());
        assert_eq!(fc.start, Vec2::unit_x());
        assert_eq!(fc.flipped(), c);
    }
}
