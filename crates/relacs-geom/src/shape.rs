use crate::transform::Point3;

/// A polymorphic shape, grounded on `original_source/shapes/src/shape.cc`.
///
/// `signed_distance` is negative inside, zero on the surface, positive
/// outside — the common primitive `inside`, `intersections` and bounding
/// boxes are all built from.
pub trait Shape: std::fmt::Debug {
    fn signed_distance(&self, p: Point3) -> f64;

    fn inside(&self, p: Point3) -> bool {
        self.signed_distance(p) <= 0.0
    }

    /// Axis-aligned bounding box as (min, max).
    fn bounding_box(&self) -> (Point3, Point3);

    /// Intersections of the shape's surface with the segment `[a, b]`,
    /// returned as `(t, point)` pairs with `t` the segment parameter
    /// (0 at `a`, 1 at `b`). If an endpoint lies inside the shape, one
    /// intersection point coincides with that endpoint (spec.md §8
    /// invariant 7).
    fn intersections(&self, a: Point3, b: Point3) -> Vec<(f64, Point3)>;
}

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Shape for Sphere {
    fn signed_distance(&self, p: Point3) -> f64 {
        (p - self.center).norm() - self.radius
    }

    fn bounding_box(&self) -> (Point3, Point3) {
        let r = self.radius;
        (
            Point3::new(self.center.x - r, self.center.y - r, self.center.z - r),
            Point3::new(self.center.x + r, self.center.y + r, self.center.z + r),
        )
    }

    fn intersections(&self, a: Point3, b: Point3) -> Vec<(f64, Point3)> {
        line_segment_vs_signed_distance(a, b, |p| self.signed_distance(p))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    pub base: Point3,
    /// Axis direction, assumed aligned with +z in local coordinates.
    pub height: f64,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(base: Point3, height: f64, radius: f64) -> Self {
        Self { base, height, radius }
    }

    fn radial_distance(&self, p: Point3) -> f64 {
        let dx = p.x - self.base.x;
        let dy = p.y - self.base.y;
        (dx * dx + dy * dy).sqrt() - self.radius
    }

    fn axial_distance(&self, p: Point3) -> f64 {
        let z = p.z - self.base.z;
        (-z).max(z - self.height)
    }
}

impl Shape for Cylinder {
    fn signed_distance(&self, p: Point3) -> f64 {
        self.radial_distance(p).max(self.axial_distance(p))
    }

    fn bounding_box(&self) -> (Point3, Point3) {
        let r = self.radius;
        (
            Point3::new(self.base.x - r, self.base.y - r, self.base.z),
            Point3::new(self.base.x + r, self.base.y + r, self.base.z + self.height),
        )
    }

    fn intersections(&self, a: Point3, b: Point3) -> Vec<(f64, Point3)> {
        line_segment_vs_signed_distance(a, b, |p| self.signed_distance(p))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cuboid {
    pub min: Point3,
    pub max: Point3,
}

impl Cuboid {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }
}

impl Shape for Cuboid {
    fn signed_distance(&self, p: Point3) -> f64 {
        let dx = (self.min.x - p.x).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(p.y - self.max.y);
        let dz = (self.min.z - p.z).max(p.z - self.max.z);
        dx.max(dy).max(dz)
    }

    fn bounding_box(&self) -> (Point3, Point3) {
        (self.min, self.max)
    }

    fn intersections(&self, a: Point3, b: Point3) -> Vec<(f64, Point3)> {
        line_segment_vs_signed_distance(a, b, |p| self.signed_distance(p))
    }
}

/// Bisects the segment `[a, b]` for sign changes of `f` (the shape's
/// signed distance), returning up to two crossing points. If an endpoint
/// is already inside (`f <= 0`), that endpoint itself is reported as one
/// of the two intersection points, matching spec.md §8 invariant 7.
fn line_segment_vs_signed_distance(
    a: Point3,
    b: Point3,
    f: impl Fn(Point3) -> f64,
) -> Vec<(f64, Point3)> {
    const STEPS: usize = 256;
    const BISECT_ITERS: usize = 40;

    let a_inside = f(a) <= 0.0;
    let b_inside = f(b) <= 0.0;

    let mut crossings = Vec::new();
    let mut prev_t = 0.0;
    let mut prev_val = f(a);
    for i in 1..=STEPS {
        let t = i as f64 / STEPS as f64;
        let p = a.lerp(b, t);
        let val = f(p);
        if prev_val.signum() != val.signum() && prev_val != 0.0 {
            let mut lo = prev_t;
            let mut hi = t;
            for _ in 0..BISECT_ITERS {
                let mid = (lo + hi) / 2.0;
                let mid_val = f(a.lerp(b, mid));
                if mid_val.signum() == prev_val.signum() {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let t_hit = (lo + hi) / 2.0;
            crossings.push((t_hit, a.lerp(b, t_hit)));
        }
        prev_t = t;
        prev_val = val;
    }

    if a_inside != b_inside {
        // One endpoint inside: exactly one of the two reported
        // intersections should be that endpoint itself.
        if a_inside && crossings.is_empty() {
            crossings.push((0.0, a));
        } else if b_inside && crossings.len() < 2 {
            crossings.push((1.0, b));
        }
    } else if a_inside && b_inside {
        // Both endpoints inside a convex region that nonetheless clips a
        // non-convex shape's surface: report the endpoints themselves so
        // callers always get a bounded pair.
        crossings.push((0.0, a));
        crossings.push((1.0, b));
    }

    crossings.truncate(2);
    crossings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_signed_distance_sign() {
        let cuboid = Cuboid::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert!(cuboid.inside(Point3::zero()));
        assert!(!cuboid.inside(Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn cylinder_bounding_box() {
        let cyl = Cylinder::new(Point3::zero(), 2.0, 1.0);
        let (min, max) = cyl.bounding_box();
        assert_eq!(min, Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Point3::new(1.0, 1.0, 2.0));
    }
}
