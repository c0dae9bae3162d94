//! Point primitives.

use super::{point_dist2, Primitive, PrimitiveId, PrimitiveKind};
use crate::error::Result;
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::points::PointHandle;
use kurbo::Point;

/// A free point wrapping one store handle.
#[derive(Debug, Clone, PartialEq)]
pub struct FreePoint {
    pub point: PointHandle,
}

impl FreePoint {
    /// Place a new point and register it with the manager.
    pub fn create(om: &mut ObjectManager, x: f64, y: f64) -> Result<PrimitiveId> {
        let point = om.alloc_point(x, y);
        om.add_primitive(
            Primitive::new(PrimitiveKind::Point(FreePoint { point })),
            AddOptions::default(),
        )
    }

    /// Allocate a hidden child point for a composite primitive.
    pub(crate) fn create_child(om: &mut ObjectManager, x: f64, y: f64) -> PrimitiveId {
        let point = om.alloc_point(x, y);
        om.insert_unchecked(
            Primitive::new(PrimitiveKind::Point(FreePoint { point })),
            AddOptions::hidden_child(),
        )
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (x, y) = om.points().coords(self.point);
        Some(point_dist2(cursor, Point::new(x, y)))
    }
}

/// The footprint origin: a point fixed at (0, 0), permanently non-deletable
/// and inert to drags.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterPoint {
    pub point: PointHandle,
}

impl CenterPoint {
    /// Create the origin point. A board has exactly one; `can_create`
    /// guards the UI path.
    pub fn create(om: &mut ObjectManager) -> Result<PrimitiveId> {
        let point = om.alloc_point(0.0, 0.0);
        om.add_primitive(
            Primitive::new(PrimitiveKind::CenterPoint(CenterPoint { point })),
            AddOptions::default(),
        )
    }

    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        selection.is_empty() && !om.has_center_point()
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        vec![
            Constraint::new(vec![(self.point, 1.0, 0.0)], 0.0),
            Constraint::new(vec![(self.point, 0.0, 1.0)], 0.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{Unit, UnitNumber};

    fn manager() -> ObjectManager {
        ObjectManager::new(
            "test",
            UnitNumber::new(10.0, Unit::Mil),
            UnitNumber::new(10.0, Unit::Mil),
        )
    }

    #[test]
    fn test_free_point_roundtrip() {
        let mut om = manager();
        let id = FreePoint::create(&mut om, 3.0, 4.0).unwrap();
        let h = om.point_handle(id);
        assert_eq!(om.points().coords(h), (3.0, 4.0));
    }

    #[test]
    fn test_center_point_fixed_at_origin() {
        let mut om = manager();
        let id = CenterPoint::create(&mut om).unwrap();
        let h = om.point_handle(id);
        // Drag elsewhere, resolve: pin rows snap it back.
        om.set_point_coords(h, 50.0, 50.0);
        om.update_points(None).unwrap();
        assert_eq!(om.points().coords(h), (0.0, 0.0));
        assert_eq!(om.degrees_of_freedom(), 0);
    }

    #[test]
    fn test_center_point_not_deletable() {
        let mut om = manager();
        let id = CenterPoint::create(&mut om).unwrap();
        assert!(om.delete_primitive(id).is_err());
        assert!(om.primitive(id).is_some());
    }

    #[test]
    fn test_center_point_unique() {
        let mut om = manager();
        assert!(CenterPoint::can_create(&om, &[]));
        CenterPoint::create(&mut om).unwrap();
        assert!(!CenterPoint::can_create(&om, &[]));
    }
}
