use super::{Contact, ContactResult};
use crate::math::{self as m, Vec2};
use crate::physics::{
    shape::{clip_segment_to_line, Polygon},
    Body, Shape,
};

/// Checks two bodies for intersection.
///
/// Contacts are oriented from `a` to `b` regardless of which shape
/// the underlying algorithm was written for.
pub fn intersection_check(a: &Body, b: &Body) -> ContactResult {
    match (a.shape(), b.shape()) {
        (Shape::Circle { r: r1 }, Shape::Circle { r: r2 }) => {
            circle_circle(a.position(), *r1, b.position(), *r2)
        }
        (Shape::Circle { r }, poly_shape) => match poly_shape.as_polygon() {
            Some(poly) => flip_contacts(polygon_circle(poly, a.position(), *r)),
            None => ContactResult::Zero,
        },
        (poly_shape, Shape::Circle { r }) => match poly_shape.as_polygon() {
            Some(poly) => polygon_circle(poly, b.position(), *r),
            None => ContactResult::Zero,
        },
        (s1, s2) => match (s1.as_polygon(), s2.as_polygon()) {
            (Some(p1), Some(p2)) => polygon_polygon(p1, p2),
            _ => ContactResult::Zero,
        },
    }
}

fn flip_contacts(contacts: ContactResult) -> ContactResult {
    contacts.map(Contact::flipped)
}

//
// CIRCLE <-> CIRCLE
//

fn circle_circle(pos1: Vec2, r1: f64, pos2: Vec2, r2: f64) -> ContactResult {
    let dist = pos2 - pos1;
    let dist_sq = dist.mag_sq();
    let r_sum = r1 + r2;

    if dist_sq > r_sum * r_sum {
        return ContactResult::Zero;
    }

    let normal = if dist_sq < 1e-12 {
        // same position, consider penetration to be on x axis
        Vec2::unit_x()
    } else {
        dist / dist_sq.sqrt()
    };

    let start = pos2 - normal * r2;
    let end = pos1 + normal * r1;
    ContactResult::One(Contact {
        start,
        end,
        normal,
        depth: (end - start).mag(),
    })
}

//
// POLYGON <-> POLYGON
//

fn polygon_polygon(a: &Polygon, b: &Polygon) -> ContactResult {
    let ab = a.find_min_separation(b);
    if ab.separation >= 0.0 {
        return ContactResult::Zero;
    }
    let ba = b.find_min_separation(a);
    if ba.separation >= 0.0 {
        return ContactResult::Zero;
    }

    // the axis of least penetration decides which polygon's edge we clip against
    let a_is_reference = ab.separation > ba.separation;
    let (reference, incident, ref_idx) = if a_is_reference {
        (a, b, ab.edge_index)
    } else {
        (b, a, ba.edge_index)
    };

    let ref_normal = reference.edge_normal_at(ref_idx);

    let inc_idx = incident.find_incident_edge(ref_normal);
    let inc_verts = incident.world_vertices();
    let mut points = [inc_verts[inc_idx], inc_verts[(inc_idx + 1) % inc_verts.len()]];

    let ref_verts = reference.world_vertices();
    let mut clipped = None;
    for i in (0..ref_verts.len()).filter(|i| *i != ref_idx) {
        let c0 = ref_verts[i];
        let c1 = ref_verts[(i + 1) % ref_verts.len()];
        let result = clip_segment_to_line(points, c0, c1);
        clipped = Some(result);
        match result.pair() {
            Some(pair) => points = pair,
            None => break,
        }
    }
    let clipped = match clipped {
        Some(c) => c,
        // only possible for a reference polygon with a single edge
        None => return ContactResult::Zero,
    };

    let ref_vertex = ref_verts[ref_idx];
    let mut contacts = clipped.as_slice().iter().filter_map(|&v_clip| {
        let separation = (v_clip - ref_vertex).dot(ref_normal);
        if separation > 0.0 {
            return None;
        }
        let contact = Contact {
            start: v_clip,
            end: v_clip + ref_normal * -separation,
            normal: ref_normal,
            depth: -separation,
        };
        Some(if a_is_reference {
            contact
        } else {
            contact.flipped()
        })
    });

    match (contacts.next(), contacts.next()) {
        (Some(c1), Some(c2)) => ContactResult::Two(c1, c2),
        (Some(c), None) => ContactResult::One(c),
        _ => ContactResult::Zero,
    }
}

//
// POLYGON <-> CIRCLE
//

fn polygon_circle(poly: &Polygon, circle_pos: Vec2, r: f64) -> ContactResult {
    let verts = poly.world_vertices();

    // find the edge nearest to the circle center,
    // stopping at the first one the center lies outside of
    let mut is_outside = false;
    let mut edge_dist = f64::MIN;
    let mut curr = verts[0];
    let mut next = verts[1 % verts.len()];
    for i in 0..verts.len() {
        let normal = poly.edge_normal_at(i);
        let proj = (circle_pos - verts[i]).dot(normal);
        if proj > 0.0 || proj > edge_dist {
            edge_dist = proj;
            curr = verts[i];
            next = verts[(i + 1) % verts.len()];
        }
        if proj > 0.0 {
            is_outside = true;
            break;
        }
    }

    let vertex_contact = |vertex: Vec2| {
        let to_center = circle_pos - vertex;
        let dist = to_center.mag();
        if dist > r {
            return ContactResult::Zero;
        }
        let normal = m::normalize(to_center);
        let depth = r - dist;
        let start = circle_pos - normal * r;
        ContactResult::One(Contact {
            start,
            end: start + normal * depth,
            normal,
            depth,
        })
    };

    let edge_contact = |edge_dist: f64| {
        if edge_dist > r {
            return ContactResult::Zero;
        }
        let normal = m::edge_normal(next - curr);
        let depth = r - edge_dist;
        let start = circle_pos - normal * r;
        ContactResult::One(Contact {
            start,
            end: start + normal * depth,
            normal,
            depth,
        })
    };

    if !is_outside {
        // center inside the polygon, always colliding
        return edge_contact(edge_dist);
    }

    if (circle_pos - curr).dot(next - curr) < 0.0 {
        // nearest feature is the edge's first vertex
        vertex_contact(curr)
    } else if (circle_pos - next).dot(curr - next) < 0.0 {
        // nearest feature is the edge's second vertex
        vertex_contact(next)
    } else {
        edge_contact(edge_dist)
    }
}
