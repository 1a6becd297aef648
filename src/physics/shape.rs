//! Collision geometry attached to bodies.

use super::PhysicsError;
use crate::math::{self as m, Vec2};

use itertools::izip;

/// Discriminant of a [`Shape`][self::Shape], useful for renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Circle,
    Polygon,
    Box,
}

/// The physical shape of a body.
///
/// Polygons and boxes share all their collision logic through [`Polygon`][self::Polygon];
/// a box is just a polygon that remembers the width and height it was built from.
#[derive(Clone, Debug)]
pub enum Shape {
    Circle { r: f64 },
    Polygon(Polygon),
    Box { w: f64, h: f64, poly: Polygon },
}

impl Shape {
    /// Create a circle from a radius.
    pub fn circle(radius: f64) -> Self {
        Shape::Circle { r: radius }
    }

    /// Create a convex polygon from vertices relative to the body's center of mass.
    ///
    /// Vertices must be wound counterclockwise in a y-up frame,
    /// which is clockwise on screen where y grows downwards.
    pub fn polygon(vertices: impl Into<Vec<Vec2>>) -> Result<Self, PhysicsError> {
        let vertices = vertices.into();
        if vertices.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon(vertices.len()));
        }
        Ok(Shape::Polygon(Polygon::new(vertices)))
    }

    /// Create a box centered on the body with the given side lengths.
    pub fn rect(width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Shape::Box {
            w: width,
            h: height,
            poly: Polygon::new(vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ]),
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Shape::Circle { .. } => ShapeType::Circle,
            Shape::Polygon(_) => ShapeType::Polygon,
            Shape::Box { .. } => ShapeType::Box,
        }
    }

    /// Moment of inertia divided by mass.
    pub fn moment_of_inertia_factor(&self) -> f64 {
        // from https://en.wikipedia.org/wiki/List_of_moments_of_inertia
        match self {
            Shape::Circle { r } => 0.5 * r * r,
            Shape::Box { w, h, .. } => (w * w + h * h) / 12.0,
            Shape::Polygon(poly) => poly.moment_of_inertia_factor(),
        }
    }

    /// Recompute the world-space vertex cache for a body at the given pose.
    /// Circles have no vertices so this does nothing for them.
    pub fn update_world_vertices(&mut self, angle: f64, position: Vec2) {
        if let Some(poly) = self.as_polygon_mut() {
            poly.update_world_vertices(angle, position);
        }
    }

    /// Access the polygon data of polygon-like shapes.
    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Shape::Polygon(poly) | Shape::Box { poly, .. } => Some(poly),
            Shape::Circle { .. } => None,
        }
    }

    fn as_polygon_mut(&mut self) -> Option<&mut Polygon> {
        match self {
            Shape::Polygon(poly) | Shape::Box { poly, .. } => Some(poly),
            Shape::Circle { .. } => None,
        }
    }
}

/// A convex polygon with a cache of its vertices in world space.
#[derive(Clone, Debug)]
pub struct Polygon {
    local: Vec<Vec2>,
    world: Vec<Vec2>,
}

impl Polygon {
    fn new(local: Vec<Vec2>) -> Self {
        let world = local.clone();
        Polygon { local, world }
    }

    #[inline]
    pub fn local_vertices(&self) -> &[Vec2] {
        &self.local
    }

    #[inline]
    pub fn world_vertices(&self) -> &[Vec2] {
        &self.world
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.world.len()
    }

    pub fn update_world_vertices(&mut self, angle: f64, position: Vec2) {
        for (world, local) in izip!(&mut self.world, &self.local) {
            // rotate first, then translate
            *world = m::rotate(*local, angle) + position;
        }
    }

    /// The edge from world vertex `i` to world vertex `i + 1`, wrapping around.
    pub fn edge_at(&self, i: usize) -> Vec2 {
        let next = (i + 1) % self.world.len();
        self.world[next] - self.world[i]
    }

    /// Outward unit normal of the edge starting at world vertex `i`.
    #[inline]
    pub fn edge_normal_at(&self, i: usize) -> Vec2 {
        m::edge_normal(self.edge_at(i))
    }

    /// One half of the separating axis test.
    ///
    /// For every edge of `self`, finds the vertex of `other` that is deepest behind it.
    /// Returns the largest of these separations along with the index of the edge it belongs to
    /// and the vertex of `other` that produced it.
    /// A non-negative separation means `self`'s edge is a separating axis.
    pub fn find_min_separation(&self, other: &Polygon) -> Separation {
        let mut best = Separation {
            separation: f64::MIN,
            edge_index: 0,
            support_point: Vec2::zero(),
        };

        for (i, &v) in self.world.iter().enumerate() {
            let normal = self.edge_normal_at(i);

            let mut min_sep = f64::MAX;
            let mut min_vertex = Vec2::zero();
            for &v2 in &other.world {
                let proj = (v2 - v).dot(normal);
                if proj < min_sep {
                    min_sep = proj;
                    min_vertex = v2;
                }
            }

            if min_sep > best.separation {
                best = Separation {
                    separation: min_sep,
                    edge_index: i,
                    support_point: min_vertex,
                };
            }
        }

        best
    }

    /// Index of the edge whose normal points most directly against `normal`.
    pub fn find_incident_edge(&self, normal: Vec2) -> usize {
        let mut incident = 0;
        let mut min_proj = f64::MAX;
        for i in 0..self.world.len() {
            let proj = self.edge_normal_at(i).dot(normal);
            if proj < min_proj {
                min_proj = proj;
                incident = i;
            }
        }
        incident
    }

    /// Moment of inertia per unit mass about the local origin,
    /// treating the polygon as a uniform solid.
    fn moment_of_inertia_factor(&self) -> f64 {
        // sum over the triangles fanning out from the origin
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for i in 0..self.local.len() {
            let a = self.local[i];
            let b = self.local[(i + 1) % self.local.len()];
            let cross = m::cross(a, b);
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross;
        }
        if denominator == 0.0 {
            return 0.0;
        }
        (numerator / (6.0 * denominator)).abs()
    }
}

/// Result of [`Polygon::find_min_separation`][self::Polygon::find_min_separation].
#[derive(Clone, Copy, Debug)]
pub struct Separation {
    pub separation: f64,
    pub edge_index: usize,
    pub support_point: Vec2,
}

/// Clip a two-point segment against the line through `line_start` and `line_end`,
/// keeping only the part on the polygon-interior side (right of the line direction
/// in screen space, left in a y-up frame).
///
/// Returns the retained points: both endpoints if the segment is fully inside,
/// one endpoint plus the crossing point if it straddles the line, or nothing.
pub fn clip_segment_to_line(points: [Vec2; 2], line_start: Vec2, line_end: Vec2) -> ClippedSegment {
    let mut out = ClippedSegment::default();

    let dir = m::normalize(line_end - line_start);
    let dist0 = m::cross(points[0] - line_start, dir);
    let dist1 = m::cross(points[1] - line_start, dir);

    if dist0 <= 0.0 {
        out.push(points[0]);
    }
    if dist1 <= 0.0 {
        out.push(points[1]);
    }

    // endpoints on different sides, add the intersection
    if dist0 * dist1 < 0.0 {
        let t = dist0 / (dist0 - dist1);
        out.push(points[0] + (points[1] - points[0]) * t);
    }

    out
}

/// Up to two points left over after clipping a segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClippedSegment {
    points: [Vec2; 2],
    len: usize,
}

impl ClippedSegment {
    fn push(&mut self, p: Vec2) {
        // a segment can't keep more than two points; the crossing point is only
        // added when exactly one endpoint was kept
        if self.len < 2 {
            self.points[self.len] = p;
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.points[..self.len]
    }

    /// Both points, if the clip retained two.
    pub fn pair(&self) -> Option<[Vec2; 2]> {
        (self.len == 2).then_some(self.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).mag() < 1e-9
    }

    #[test]
    fn box_vertices_and_edges() {
        let mut shape = Shape::rect(4.0, 2.0);
        assert_eq!(shape.shape_type(), ShapeType::Box);
        shape.update_world_vertices(0.0, Vec2::new(10.0, 10.0));
        let poly = shape.as_polygon().unwrap();
        assert_eq!(poly.vertex_count(), 4);
        assert!(approx_eq(poly.world_vertices()[0], Vec2::new(8.0, 9.0)));
        assert!(approx_eq(poly.edge_at(0), Vec2::new(4.0, 0.0)));
        // last edge wraps back to the first vertex
        assert!(approx_eq(poly.edge_at(3), Vec2::new(0.0, -2.0)));
        assert!(approx_eq(poly.edge_normal_at(0), Vec2::new(0.0, -1.0)));
        assert!(approx_eq(poly.edge_normal_at(1), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn world_vertices_follow_rotation() {
        let mut shape = Shape::rect(2.0, 2.0);
        shape.update_world_vertices(std::f64::consts::FRAC_PI_2, Vec2::new(1.0, 0.0));
        let poly = shape.as_polygon().unwrap();
        // (-1, -1) rotated a quarter turn is (1, -1), then translated
        assert!(approx_eq(poly.world_vertices()[0], Vec2::new(2.0, -1.0)));
        // local vertices are untouched
        assert!(approx_eq(poly.local_vertices()[0], Vec2::new(-1.0, -1.0)));
    }

    #[test]
    fn inertia_factors() {
        assert_eq!(Shape::circle(2.0).moment_of_inertia_factor(), 2.0);
        let box_factor = Shape::rect(50.0, 50.0).moment_of_inertia_factor();
        assert!((box_factor - 5000.0 / 12.0).abs() < 1e-9);

        // a polygon with the same vertices as a box has the same inertia
        let square = Shape::polygon(vec![
            Vec2::new(-25.0, -25.0),
            Vec2::new(25.0, -25.0),
            Vec2::new(25.0, 25.0),
            Vec2::new(-25.0, 25.0),
        ])
        .unwrap();
        assert_eq!(square.shape_type(), ShapeType::Polygon);
        assert!((square.moment_of_inertia_factor() - box_factor).abs() < 1e-9);

        // parallel axis theorem for a square away from the origin
        let off_center = Shape::polygon(vec![
            Vec2::new(10.0, 10.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(10.0, 20.0),
        ])
        .unwrap();
        let expected = 200.0 / 12.0 + Vec2::new(15.0, 15.0).mag_sq();
        assert!((off_center.moment_of_inertia_factor() - expected).abs() < 1e-9);

        // winding order doesn't matter
        let clockwise = Shape::polygon(vec![
            Vec2::new(10.0, 20.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(20.0, 10.0),
            Vec2::new(10.0, 10.0),
        ])
        .unwrap();
        assert!((clockwise.moment_of_inertia_factor() - expected).abs() < 1e-9);
    }

    #[test]
    fn too_few_vertices() {
        let res = Shape::polygon(vec![Vec2::zero(), Vec2::unit_x()]);
        assert!(matches!(res, Err(PhysicsError::DegeneratePolygon(2))));
    }

    #[test]
    fn min_separation_of_overlapping_boxes() {
        let mut a = Shape::rect(10.0, 10.0);
        let mut b = Shape::rect(10.0, 10.0);
        a.update_world_vertices(0.0, Vec2::zero());
        b.update_world_vertices(0.0, Vec2::new(8.0, 0.0));
        let (a, b) = (a.as_polygon().unwrap(), b.as_polygon().unwrap());

        let sep = a.find_min_separation(b);
        assert!((sep.separation - (-2.0)).abs() < 1e-9);
        // edge 1 is the right side of the box
        assert_eq!(sep.edge_index, 1);
        assert!((sep.support_point.x - 3.0).abs() < 1e-9);

        // moving b away makes the right side a separating axis
        let mut far = Shape::rect(10.0, 10.0);
        far.update_world_vertices(0.0, Vec2::new(12.0, 0.0));
        let sep = a.find_min_separation(far.as_polygon().unwrap());
        assert!(sep.separation >= 0.0);
    }

    #[test]
    fn incident_edge_faces_against_normal() {
        let mut shape = Shape::rect(2.0, 2.0);
        shape.update_world_vertices(0.0, Vec2::zero());
        let poly = shape.as_polygon().unwrap();
        // edge 3 is the left side with normal -x
        assert_eq!(poly.find_incident_edge(Vec2::new(1.0, 0.0)), 3);
        // edge 2 is the top in y-up terms with normal +y
        assert_eq!(poly.find_incident_edge(Vec2::new(0.0, -1.0)), 2);
    }

    #[test]
    fn clip_segments() {
        // the line runs along +x, so the retained side has y >= 0
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(1.0, 0.0);

        let both = clip_segment_to_line([Vec2::new(0.0, 1.0), Vec2::new(2.0, 3.0)], start, end);
        assert_eq!(both.len(), 2);

        let none = clip_segment_to_line([Vec2::new(0.0, -1.0), Vec2::new(2.0, -3.0)], start, end);
        assert!(none.is_empty());

        let straddle = clip_segment_to_line([Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)], start, end);
        let [kept, crossing] = straddle.pair().unwrap();
        assert!(approx_eq(kept, Vec2::new(0.0, 1.0)));
        assert!(approx_eq(crossing, Vec2::new(0.0, 0.0)));
    }
}
