//! Circular pads: BGA balls and plated through-hole pins.
//!
//! Both are built from compass patterns (top, left, center, right,
//! bottom) whose rows keep the four extremes equidistant from the
//! center. A pin stacks two compass patterns over one shared center,
//! which keeps the annular ring and drill hole concentric by
//! construction.

use super::templates;
use super::{point_dist2, FreePoint, Primitive, PrimitiveId, PrimitiveKind, INTERIOR_DIST};
use crate::error::{Error, Result};
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::points::PointHandle;
use crate::units::UnitNumber;
use kurbo::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct BallParams {
    pub r: UnitNumber,
}

impl BallParams {
    pub fn new(r: UnitNumber) -> Result<Self> {
        if r.to_iu() <= 0.0 {
            return Err(Error::InvalidParameter("ball radius must be positive".into()));
        }
        Ok(BallParams { r })
    }
}

/// A circular pad: five child points in compass order
/// (top, left, center, right, bottom).
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub points: [PrimitiveId; 5],
}

fn compass_children(
    om: &mut ObjectManager,
    x: f64,
    y: f64,
    r: f64,
    center: Option<PrimitiveId>,
) -> [PrimitiveId; 5] {
    let c = center.unwrap_or_else(|| FreePoint::create_child(om, x, y));
    [
        FreePoint::create_child(om, x, y - r),
        FreePoint::create_child(om, x - r, y),
        c,
        FreePoint::create_child(om, x + r, y),
        FreePoint::create_child(om, x, y + r),
    ]
}

fn compass_handles(om: &ObjectManager, ids: &[PrimitiveId; 5]) -> [PointHandle; 5] {
    let mut g = [PointHandle(0); 5];
    for (slot, &id) in g.iter_mut().zip(ids.iter()) {
        *slot = om.point_handle(id);
    }
    g
}

impl Ball {
    pub fn create(om: &mut ObjectManager, x: f64, y: f64, params: &BallParams) -> Result<PrimitiveId> {
        Self::create_with(om, x, y, params, AddOptions::default())
    }

    pub(crate) fn create_with(
        om: &mut ObjectManager,
        x: f64,
        y: f64,
        params: &BallParams,
        opts: AddOptions,
    ) -> Result<PrimitiveId> {
        let points = compass_children(om, x, y, params.r.to_iu(), None);
        let prim = Primitive::new(PrimitiveKind::Ball(Ball { points }));
        om.add_composite(prim, &points, opts)
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        templates::compass(&compass_handles(om, &self.points))
    }

    pub fn center(&self) -> PrimitiveId {
        self.points[2]
    }

    pub fn center_coords(&self, om: &ObjectManager) -> (f64, f64) {
        om.points().coords(om.point_handle(self.center()))
    }

    pub fn radius(&self, om: &ObjectManager) -> f64 {
        let (cx, _) = self.center_coords(om);
        let (rx, _) = om.points().coords(om.point_handle(self.points[3]));
        rx - cx
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (cx, cy) = self.center_coords(om);
        let r = self.radius(om);
        if point_dist2(cursor, Point::new(cx, cy)) <= r * r {
            Some(INTERIOR_DIST)
        } else {
            None
        }
    }

    pub fn dimensions(&self, om: &ObjectManager, m: f64) -> Vec<Vec<(PointHandle, f64, f64)>> {
        let g = compass_handles(om, &self.points);
        vec![vec![(g[3], m, 0.0), (g[2], -m, 0.0)]]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinParams {
    pub ring_r: UnitNumber,
    pub hole_r: UnitNumber,
}

impl PinParams {
    pub fn new(ring_r: UnitNumber, hole_r: UnitNumber) -> Result<Self> {
        if hole_r.to_iu() <= 0.0 {
            return Err(Error::InvalidParameter("hole radius must be positive".into()));
        }
        if ring_r.to_iu() <= hole_r.to_iu() {
            return Err(Error::InvalidParameter(
                "ring radius must exceed hole radius".into(),
            ));
        }
        Ok(PinParams { ring_r, hole_r })
    }
}

/// A through-hole pin: an outer ring compass and an inner hole compass
/// sharing the center point.
#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    /// Outer ring in compass order.
    pub ring: [PrimitiveId; 5],
    /// Inner hole in compass order; `hole[2] == ring[2]`.
    pub hole: [PrimitiveId; 5],
}

impl Pin {
    pub fn create(om: &mut ObjectManager, x: f64, y: f64, params: &PinParams) -> Result<PrimitiveId> {
        Self::create_with(om, x, y, params, AddOptions::default())
    }

    pub(crate) fn create_with(
        om: &mut ObjectManager,
        x: f64,
        y: f64,
        params: &PinParams,
        opts: AddOptions,
    ) -> Result<PrimitiveId> {
        let ring = compass_children(om, x, y, params.ring_r.to_iu(), None);
        let hole = compass_children(om, x, y, params.hole_r.to_iu(), Some(ring[2]));
        let children: Vec<PrimitiveId> = ring
            .iter()
            .chain(hole.iter().filter(|&&id| id != ring[2]))
            .copied()
            .collect();
        let prim = Primitive::new(PrimitiveKind::Pin(Pin { ring, hole }));
        om.add_composite(prim, &children, opts)
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let mut rows = templates::compass(&compass_handles(om, &self.ring));
        rows.extend(templates::compass(&compass_handles(om, &self.hole)));
        rows
    }

    pub fn center(&self) -> PrimitiveId {
        self.ring[2]
    }

    pub fn center_coords(&self, om: &ObjectManager) -> (f64, f64) {
        om.points().coords(om.point_handle(self.center()))
    }

    pub fn ring_radius(&self, om: &ObjectManager) -> f64 {
        let (cx, _) = self.center_coords(om);
        let (rx, _) = om.points().coords(om.point_handle(self.ring[3]));
        rx - cx
    }

    pub fn hole_radius(&self, om: &ObjectManager) -> f64 {
        let (cx, _) = self.center_coords(om);
        let (rx, _) = om.points().coords(om.point_handle(self.hole[3]));
        rx - cx
    }

    /// Children, center listed once.
    pub fn children(&self) -> Vec<PrimitiveId> {
        self.ring
            .iter()
            .chain(self.hole.iter().filter(|&&id| id != self.ring[2]))
            .copied()
            .collect()
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (cx, cy) = self.center_coords(om);
        let r = self.ring_radius(om);
        if point_dist2(cursor, Point::new(cx, cy)) <= r * r {
            Some(INTERIOR_DIST)
        } else {
            None
        }
    }

    pub fn dimensions(&self, om: &ObjectManager, m: f64) -> Vec<Vec<(PointHandle, f64, f64)>> {
        let rg = compass_handles(om, &self.ring);
        let hg = compass_handles(om, &self.hole);
        vec![
            vec![(rg[3], m, 0.0), (rg[2], -m, 0.0)],
            vec![(hg[3], m, 0.0), (hg[2], -m, 0.0)],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Unit;

    fn manager() -> ObjectManager {
        ObjectManager::new(
            "test",
            UnitNumber::new(10.0, Unit::Mil),
            UnitNumber::new(10.0, Unit::Mil),
        )
    }

    fn iu(v: f64) -> UnitNumber {
        UnitNumber::new(v, Unit::Iu)
    }

    fn ball_of(om: &ObjectManager, id: PrimitiveId) -> &Ball {
        match om.primitive(id).map(|p| &p.kind) {
            Some(PrimitiveKind::Ball(b)) => b,
            _ => panic!("expected ball"),
        }
    }

    #[test]
    fn test_ball_radius_after_resolve() {
        let mut om = manager();
        let params = BallParams::new(iu(25.0)).unwrap();
        let id = Ball::create(&mut om, 100.0, 50.0, &params).unwrap();
        om.update_points(None).unwrap();
        let ball = ball_of(&om, id);
        assert!((ball.radius(&om) - 25.0).abs() < 1e-9);
        assert_eq!(ball.center_coords(&om), (100.0, 50.0));
    }

    #[test]
    fn test_ball_radius_symmetry_under_drag() {
        let mut om = manager();
        let params = BallParams::new(iu(25.0)).unwrap();
        let id = Ball::create(&mut om, 0.0, 0.0, &params).unwrap();
        // Pull the right compass point outward and resolve while
        // dragging it: every extreme must follow to radius 40.
        let ball_points = ball_of(&om, id).points;
        let right = om.point_handle(ball_points[3]);
        om.set_point_coords(right, 40.0, 0.0);
        om.update_points(Some(ball_points[3])).unwrap();
        let ball = ball_of(&om, id);
        assert!((ball.radius(&om) - 40.0).abs() < 1e-6);
        let (tx, ty) = om.points().coords(om.point_handle(ball.points[0]));
        assert!((tx - 0.0).abs() < 1e-6);
        assert!((ty + 40.0).abs() < 1e-6);
        let (bx, by) = om.points().coords(om.point_handle(ball.points[4]));
        assert!((bx - 0.0).abs() < 1e-6);
        assert!((by - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_pin_params_validation() {
        assert!(PinParams::new(iu(10.0), iu(20.0)).is_err());
        assert!(PinParams::new(iu(20.0), iu(0.0)).is_err());
        assert!(PinParams::new(iu(20.0), iu(10.0)).is_ok());
    }

    #[test]
    fn test_pin_shares_center() {
        let mut om = manager();
        let params = PinParams::new(iu(30.0), iu(12.0)).unwrap();
        let id = Pin::create(&mut om, 0.0, 0.0, &params).unwrap();
        let Some(PrimitiveKind::Pin(pin)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected pin");
        };
        assert_eq!(pin.ring[2], pin.hole[2]);
        assert_eq!(pin.children().len(), 9);
        assert_eq!(om.points().len(), 9);
        om.update_points(None).unwrap();
        let Some(PrimitiveKind::Pin(pin)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected pin");
        };
        assert!((pin.ring_radius(&om) - 30.0).abs() < 1e-9);
        assert!((pin.hole_radius(&om) - 12.0).abs() < 1e-9);
    }
}
