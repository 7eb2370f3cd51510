//! Affine transforms and the `Shape`/`Zone` hierarchy used by geometric
//! RePros (maze and sphere arenas, spec.md §3).
//!
//! `Zone` owns its `Shape` children (`Box<dyn Shape>`); a shape never owns
//! a pointer back to its zone — only a non-owning [`ZoneHandle`] index, per
//! the "avoid cyclic ownership" design note in spec.md §9.

mod shape;
mod transform;
mod zone;

pub use shape::{Cuboid, Cylinder, Shape, Sphere};
pub use transform::{Point3, Transform};
pub use zone::{Zone, ZoneHandle, ZoneOp};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_round_trips_translate_rotate_scale() {
        let t = Transform::identity()
            .translated(Point3::new(1.0, 2.0, 3.0))
            .rotated_z(0.7)
            .scaled(2.0, 0.5, 3.0);
        let p = Point3::new(4.0, -1.0, 2.5);
        let q = t.apply(p);
        let back = t.apply_inverse(q);
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
        assert!((back.z - p.z).abs() < 1e-9);
    }

    #[test]
    fn sphere_intersection_on_surface() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 0.0), 1.0);
        let a = Point3::new(-2.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let hits = sphere.intersections(a, b);
        assert_eq!(hits.len(), 2);
        for (t, p) in &hits {
            assert!(*t >= 0.0 && *t <= 1.0);
            assert!((sphere.signed_distance(*p)).abs() < 1e-9);
        }
    }

    #[test]
    fn sphere_intersection_one_endpoint_inside() {
        let sphere = Sphere::new(Point3::new(0.0, 0.0, 0.0), 1.0);
        let a = Point3::new(0.0, 0.0, 0.0); // inside
        let b = Point3::new(2.0, 0.0, 0.0); // outside
        let hits = sphere.intersections(a, b);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|(_, p)| (*p - a).norm() < 1e-9));
    }
}
