//! Line primitives: drawn silkscreen segments and construction lines.

use super::templates;
use super::{segment_dist2, FreePoint, Primitive, PrimitiveId, PrimitiveKind, INTERIOR_DIST};
use crate::error::{Error, Result};
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::points::PointHandle;
use crate::units::UnitNumber;
use kurbo::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct LineParams {
    pub thickness: UnitNumber,
}

impl LineParams {
    pub fn new(thickness: UnitNumber) -> Result<Self> {
        if thickness.to_iu() <= 0.0 {
            return Err(Error::InvalidParameter(
                "line thickness must be positive".into(),
            ));
        }
        Ok(LineParams { thickness })
    }
}

/// A stroked segment with round caps. Each cap is a compass pattern;
/// an extra row ties the two cap radii together so the stroke keeps a
/// uniform thickness.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnLine {
    /// First cap in compass order (top, left, center, right, bottom).
    pub cap_a: [PrimitiveId; 5],
    /// Second cap in compass order.
    pub cap_b: [PrimitiveId; 5],
}

fn cap_children(om: &mut ObjectManager, x: f64, y: f64, r: f64) -> [PrimitiveId; 5] {
    [
        FreePoint::create_child(om, x, y - r),
        FreePoint::create_child(om, x - r, y),
        FreePoint::create_child(om, x, y),
        FreePoint::create_child(om, x + r, y),
        FreePoint::create_child(om, x, y + r),
    ]
}

fn cap_handles(om: &ObjectManager, ids: &[PrimitiveId; 5]) -> [PointHandle; 5] {
    let mut g = [PointHandle(0); 5];
    for (slot, &id) in g.iter_mut().zip(ids.iter()) {
        *slot = om.point_handle(id);
    }
    g
}

impl DrawnLine {
    pub fn create(
        om: &mut ObjectManager,
        a: (f64, f64),
        b: (f64, f64),
        params: &LineParams,
    ) -> Result<PrimitiveId> {
        let r = params.thickness.to_iu() / 2.0;
        let cap_a = cap_children(om, a.0, a.1, r);
        let cap_b = cap_children(om, b.0, b.1, r);
        let children: Vec<PrimitiveId> = cap_a.iter().chain(cap_b.iter()).copied().collect();
        let prim = Primitive::new(PrimitiveKind::DrawnLine(DrawnLine { cap_a, cap_b }));
        om.add_composite(prim, &children, AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let ga = cap_handles(om, &self.cap_a);
        let gb = cap_handles(om, &self.cap_b);
        let mut rows = templates::compass(&ga);
        rows.extend(templates::compass(&gb));
        // Both caps share one radius.
        rows.push(Constraint::new(
            vec![
                (ga[3], 1.0, 0.0),
                (ga[2], -1.0, 0.0),
                (gb[3], -1.0, 0.0),
                (gb[2], 1.0, 0.0),
            ],
            0.0,
        ));
        rows
    }

    pub fn endpoints(&self, om: &ObjectManager) -> (Point, Point) {
        let (ax, ay) = om.points().coords(om.point_handle(self.cap_a[2]));
        let (bx, by) = om.points().coords(om.point_handle(self.cap_b[2]));
        (Point::new(ax, ay), Point::new(bx, by))
    }

    pub fn thickness(&self, om: &ObjectManager) -> f64 {
        let ga = cap_handles(om, &self.cap_a);
        let (cx, _) = om.points().coords(ga[2]);
        let (rx, _) = om.points().coords(ga[3]);
        2.0 * (rx - cx)
    }

    pub fn children(&self) -> Vec<PrimitiveId> {
        self.cap_a.iter().chain(self.cap_b.iter()).copied().collect()
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (a, b) = self.endpoints(om);
        let r = self.thickness(om) / 2.0;
        let d2 = segment_dist2(cursor, a, b);
        if d2 <= r * r {
            Some(INTERIOR_DIST)
        } else {
            None
        }
    }
}

/// A construction line between two endpoints, with a marker point held
/// at a fixed fraction along the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedLine {
    pub a: PrimitiveId,
    pub b: PrimitiveId,
    pub mark: PrimitiveId,
    pub fraction: f64,
}

impl MarkedLine {
    pub fn create(
        om: &mut ObjectManager,
        a: (f64, f64),
        b: (f64, f64),
        fraction: f64,
    ) -> Result<PrimitiveId> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidParameter(
                "mark fraction must lie in [0, 1]".into(),
            ));
        }
        let pa = FreePoint::create_child(om, a.0, a.1);
        let pb = FreePoint::create_child(om, b.0, b.1);
        let mx = a.0 + fraction * (b.0 - a.0);
        let my = a.1 + fraction * (b.1 - a.1);
        let mark = FreePoint::create_child(om, mx, my);
        let prim = Primitive::new(PrimitiveKind::MarkedLine(MarkedLine {
            a: pa,
            b: pb,
            mark,
            fraction,
        }));
        om.add_composite(prim, &[pa, pb, mark], AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let a = om.point_handle(self.a);
        let b = om.point_handle(self.b);
        let m = om.point_handle(self.mark);
        let f = self.fraction;
        // mark = (1 - f) * a + f * b, per axis
        vec![
            Constraint::new(
                vec![(m, 1.0, 0.0), (a, f - 1.0, 0.0), (b, -f, 0.0)],
                0.0,
            ),
            Constraint::new(
                vec![(m, 0.0, 1.0), (a, 0.0, f - 1.0), (b, 0.0, -f)],
                0.0,
            ),
        ]
    }

    pub fn endpoints(&self, om: &ObjectManager) -> (Point, Point) {
        let (ax, ay) = om.points().coords(om.point_handle(self.a));
        let (bx, by) = om.points().coords(om.point_handle(self.b));
        (Point::new(ax, ay), Point::new(bx, by))
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (a, b) = self.endpoints(om);
        Some(INTERIOR_DIST + segment_dist2(cursor, a, b))
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

    #[test]
    fn test_drawn_line_thickness() {
        let mut om = manager();
        let params = LineParams::new(UnitNumber::new(8.0, Unit::Iu)).unwrap();
        let id = DrawnLine::create(&mut om, (0.0, 0.0), (50.0, 0.0), &params).unwrap();
        om.update_points(None).unwrap();
        let Some(PrimitiveKind::DrawnLine(line)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected line");
        };
        assert!((line.thickness(&om) - 8.0).abs() < 1e-9);
        let (a, b) = line.endpoints(&om);
        assert_eq!((a.x, a.y), (0.0, 0.0));
        assert_eq!((b.x, b.y), (50.0, 0.0));
    }

    #[test]
    fn test_marked_line_mark_follows_fraction() {
        let mut om = manager();
        let id = MarkedLine::create(&mut om, (0.0, 0.0), (100.0, 40.0), 0.25).unwrap();
        om.update_points(None).unwrap();
        let Some(PrimitiveKind::MarkedLine(line)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected marked line");
        };
        let (mx, my) = om.points().coords(om.point_handle(line.mark));
        assert!((mx - 25.0).abs() < 1e-9);
        assert!((my - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_marked_line_rejects_bad_fraction() {
        let mut om = manager();
        assert!(MarkedLine::create(&mut om, (0.0, 0.0), (10.0, 0.0), 1.5).is_err());
        assert_eq!(om.points().len(), 0);
    }
}
