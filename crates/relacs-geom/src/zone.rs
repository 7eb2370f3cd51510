use crate::shape::Shape;
use crate::transform::Point3;

/// Non-owning reference to a `Zone`, used only for the "parent zone"
/// back-pointer spec.md §9 requires to not be an owning pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneHandle(pub usize);

/// How a child shape combines with the rest of the zone (CSG operation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneOp {
    Add,
    Subtract,
}

struct Member {
    shape: Box<dyn Shape>,
    op: ZoneOp,
}

/// A zone is a CSG tree: a union of `Add` shapes with `Subtract` shapes
/// carved out, evaluated in insertion order. `Zone` owns its shape
/// children; it never holds an owning pointer back to a containing zone,
/// only the caller-assigned [`ZoneHandle`].
#[derive(Default)]
pub struct Zone {
    members: Vec<Member>,
    parent: Option<ZoneHandle>,
}

impl std::fmt::Debug for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zone")
            .field("members", &self.members.len())
            .field("parent", &self.parent)
            .finish()
    }
}

impl Zone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parent(&mut self, parent: Option<ZoneHandle>) {
        self.parent = parent;
    }

    pub fn parent(&self) -> Option<ZoneHandle> {
        self.parent
    }

    pub fn add(&mut self, shape: Box<dyn Shape>) {
        self.members.push(Member {
            shape,
            op: ZoneOp::Add,
        });
    }

    pub fn subtract(&mut self, shape: Box<dyn Shape>) {
        self.members.push(Member {
            shape,
            op: ZoneOp::Subtract,
        });
    }

    pub fn inside(&self, p: Point3) -> bool {
        let mut inside = false;
        for member in &self.members {
            match member.op {
                ZoneOp::Add => inside = inside || member.shape.inside(p),
                ZoneOp::Subtract => {
                    if member.shape.inside(p) {
                        inside = false;
                    }
                }
            }
        }
        inside
    }

    pub fn bounding_box(&self) -> (Point3, Point3) {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for member in self.members.iter().filter(|m| m.op == ZoneOp::Add) {
            let (mn, mx) = member.shape.bounding_box();
            min = Point3::new(min.x.min(mn.x), min.y.min(mn.y), min.z.min(mn.z));
            max = Point3::new(max.x.max(mx.x), max.y.max(mx.y), max.z.max(mx.z));
        }
        (min, max)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Cuboid, Sphere};

    #[test]
    fn subtract_carves_a_hole() {
        let mut zone = Zone::new();
        zone.add(Box::new(Cuboid::new(
            Point3::new(-2.0, -2.0, -2.0),
            Point3::new(2.0, 2.0, 2.0),
        )));
        zone.subtract(Box::new(Sphere::new(Point3::zero(), 1.0)));
        assert!(zone.inside(Point3::new(1.5, 0.0, 0.0)));
        assert!(!zone.inside(Point3::zero()));
    }

    #[test]
    fn non_owning_parent_handle() {
        let mut zone = Zone::new();
        zone.set_parent(Some(ZoneHandle(3)));
        assert_eq!(zone.parent(), Some(ZoneHandle(3)));
    }
}
