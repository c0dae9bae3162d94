//! Two-point relations: alignments, coincidence, set and measured
//! distances, and equal-distance groups.
//!
//! Relations own no points. They reference point primitives created
//! elsewhere and contribute rows against those points' coordinates, so
//! deleting a referenced point cascades into the relation.

use super::{point_dist2, Primitive, PrimitiveId, PrimitiveKind, INTERIOR_DIST};
use crate::error::{Error, Result};
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::points::PointHandle;
use crate::units::UnitNumber;
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

fn point_pair(om: &ObjectManager, selection: &[PrimitiveId]) -> Option<(PrimitiveId, PrimitiveId)> {
    if let [a, b] = selection {
        om.primitive(*a)?.as_point()?;
        om.primitive(*b)?.as_point()?;
        return Some((*a, *b));
    }
    None
}

fn require_point(om: &ObjectManager, id: PrimitiveId) -> Result<PointHandle> {
    om.primitive(id)
        .and_then(Primitive::as_point)
        .ok_or(Error::UnknownPrimitive(id.0))
}

/// Two points share a coordinate: the y coordinate for a horizontal
/// alignment, the x coordinate for a vertical one.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub axis: Axis,
    pub a: PrimitiveId,
    pub b: PrimitiveId,
}

impl Alignment {
    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        point_pair(om, selection).is_some()
    }

    pub fn create(
        om: &mut ObjectManager,
        axis: Axis,
        a: PrimitiveId,
        b: PrimitiveId,
    ) -> Result<PrimitiveId> {
        require_point(om, a)?;
        require_point(om, b)?;
        let prim = Primitive::new(PrimitiveKind::Alignment(Alignment { axis, a, b }));
        om.add_primitive(prim, AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let a = om.point_handle(self.a);
        let b = om.point_handle(self.b);
        let row = match self.axis {
            Axis::Horizontal => vec![(a, 0.0, 1.0), (b, 0.0, -1.0)],
            Axis::Vertical => vec![(a, 1.0, 0.0), (b, -1.0, 0.0)],
        };
        vec![Constraint::new(row, 0.0)]
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        vec![self.a, self.b]
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (ax, ay) = om.points().coords(om.point_handle(self.a));
        let (bx, by) = om.points().coords(om.point_handle(self.b));
        let d2 = match self.axis {
            Axis::Horizontal => {
                let (lo, hi) = (ax.min(bx), ax.max(bx));
                if cursor.x < lo {
                    point_dist2(cursor, Point::new(lo, ay))
                } else if cursor.x > hi {
                    point_dist2(cursor, Point::new(hi, ay))
                } else {
                    (cursor.y - ay) * (cursor.y - ay)
                }
            }
            Axis::Vertical => {
                let (lo, hi) = (ay.min(by), ay.max(by));
                if cursor.y < lo {
                    point_dist2(cursor, Point::new(ax, lo))
                } else if cursor.y > hi {
                    point_dist2(cursor, Point::new(ax, hi))
                } else {
                    (cursor.x - ax) * (cursor.x - ax)
                }
            }
        };
        Some(INTERIOR_DIST + d2)
    }
}

/// Two points pinned to the same location.
#[derive(Debug, Clone, PartialEq)]
pub struct Coincidence {
    pub a: PrimitiveId,
    pub b: PrimitiveId,
}

impl Coincidence {
    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        point_pair(om, selection).is_some()
    }

    pub fn create(om: &mut ObjectManager, a: PrimitiveId, b: PrimitiveId) -> Result<PrimitiveId> {
        require_point(om, a)?;
        require_point(om, b)?;
        let prim = Primitive::new(PrimitiveKind::Coincidence(Coincidence { a, b }));
        om.add_primitive(prim, AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let a = om.point_handle(self.a);
        let b = om.point_handle(self.b);
        vec![
            Constraint::new(vec![(a, 1.0, 0.0), (b, -1.0, 0.0)], 0.0),
            Constraint::new(vec![(a, 0.0, 1.0), (b, 0.0, -1.0)], 0.0),
        ]
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        vec![self.a, self.b]
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        let (ax, ay) = om.points().coords(om.point_handle(self.a));
        Some(INTERIOR_DIST + point_dist2(cursor, Point::new(ax, ay)))
    }
}

/// A dimensioned constraint: the coordinate difference between two
/// points along one axis equals a user-given value. Rendered with a
/// draggable label offset perpendicular to the measured axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SetDistance {
    pub axis: Axis,
    /// Lesser point along the axis at creation time.
    pub a: PrimitiveId,
    pub b: PrimitiveId,
    pub distance: UnitNumber,
    pub label_offset: f64,
}

impl SetDistance {
    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        point_pair(om, selection).is_some()
    }

    pub fn create(
        om: &mut ObjectManager,
        axis: Axis,
        a: PrimitiveId,
        b: PrimitiveId,
        distance: UnitNumber,
    ) -> Result<PrimitiveId> {
        if distance.to_iu() < 0.0 {
            return Err(Error::InvalidParameter(
                "distance must not be negative".into(),
            ));
        }
        let ha = require_point(om, a)?;
        let hb = require_point(om, b)?;
        let (ca, cb) = (om.points().coords(ha), om.points().coords(hb));
        // Order the pair so the constrained difference is positive.
        let swap = match axis {
            Axis::Horizontal => cb.0 < ca.0,
            Axis::Vertical => cb.1 < ca.1,
        };
        let (a, b) = if swap { (b, a) } else { (a, b) };
        let prim = Primitive::new(PrimitiveKind::SetDistance(SetDistance {
            axis,
            a,
            b,
            distance,
            label_offset: 20.0,
        }));
        om.add_primitive(prim, AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let a = om.point_handle(self.a);
        let b = om.point_handle(self.b);
        let row = match self.axis {
            Axis::Horizontal => vec![(b, 1.0, 0.0), (a, -1.0, 0.0)],
            Axis::Vertical => vec![(b, 0.0, 1.0), (a, 0.0, -1.0)],
        };
        vec![Constraint::new(row, self.distance.to_iu())]
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        vec![self.a, self.b]
    }

    pub fn label_anchor(&self, om: &ObjectManager) -> Point {
        label_anchor(om, self.axis, self.a, self.b, self.label_offset)
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        Some(INTERIOR_DIST + point_dist2(cursor, self.label_anchor(om)))
    }
}

fn label_anchor(
    om: &ObjectManager,
    axis: Axis,
    a: PrimitiveId,
    b: PrimitiveId,
    offset: f64,
) -> Point {
    let (ax, ay) = om.points().coords(om.point_handle(a));
    let (bx, by) = om.points().coords(om.point_handle(b));
    match axis {
        Axis::Horizontal => Point::new((ax + bx) / 2.0, ay + offset),
        Axis::Vertical => Point::new(ax + offset, (ay + by) / 2.0),
    }
}

/// A read-only dimension annotation. Contributes no rows of its own;
/// equal-distance groups borrow its span.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub axis: Axis,
    pub a: PrimitiveId,
    pub b: PrimitiveId,
    pub label_offset: f64,
}

impl Measurement {
    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        point_pair(om, selection).is_some()
    }

    pub fn create(
        om: &mut ObjectManager,
        axis: Axis,
        a: PrimitiveId,
        b: PrimitiveId,
    ) -> Result<PrimitiveId> {
        let ha = require_point(om, a)?;
        let hb = require_point(om, b)?;
        let (ca, cb) = (om.points().coords(ha), om.points().coords(hb));
        let swap = match axis {
            Axis::Horizontal => cb.0 < ca.0,
            Axis::Vertical => cb.1 < ca.1,
        };
        let (a, b) = if swap { (b, a) } else { (a, b) };
        let prim = Primitive::new(PrimitiveKind::Measurement(Measurement {
            axis,
            a,
            b,
            label_offset: 20.0,
        }));
        om.add_primitive(prim, AddOptions::default())
    }

    /// Current measured value in internal units.
    pub fn value(&self, om: &ObjectManager) -> f64 {
        let (ax, ay) = om.points().coords(om.point_handle(self.a));
        let (bx, by) = om.points().coords(om.point_handle(self.b));
        match self.axis {
            Axis::Horizontal => bx - ax,
            Axis::Vertical => by - ay,
        }
    }

    /// Weighted terms whose row value equals the measured span.
    pub fn span_terms(&self, om: &ObjectManager, m: f64) -> Vec<(PointHandle, f64, f64)> {
        let a = om.point_handle(self.a);
        let b = om.point_handle(self.b);
        match self.axis {
            Axis::Horizontal => vec![(b, m, 0.0), (a, -m, 0.0)],
            Axis::Vertical => vec![(b, 0.0, m), (a, 0.0, -m)],
        }
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        vec![self.a, self.b]
    }

    pub fn label_anchor(&self, om: &ObjectManager) -> Point {
        label_anchor(om, self.axis, self.a, self.b, self.label_offset)
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        Some(INTERIOR_DIST + point_dist2(cursor, self.label_anchor(om)))
    }
}

/// Forces every member measurement to the same value. Groups whose
/// member sets touch are merged into one equivalence class by the
/// manager; the lowest-numbered group in a class emits the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SameDistance {
    pub members: Vec<PrimitiveId>,
}

impl SameDistance {
    pub fn can_create(om: &ObjectManager, selection: &[PrimitiveId]) -> bool {
        selection.len() >= 2
            && selection.iter().all(|&id| {
                matches!(
                    om.primitive(id).map(|p| &p.kind),
                    Some(PrimitiveKind::Measurement(_))
                )
            })
    }

    pub fn create(om: &mut ObjectManager, members: Vec<PrimitiveId>) -> Result<PrimitiveId> {
        if members.len() < 2 || !Self::can_create(om, &members) {
            return Err(Error::InvalidParameter(
                "equal-distance groups need at least two measurements".into(),
            ));
        }
        let prim = Primitive::new(PrimitiveKind::SameDistance(SameDistance { members }));
        om.add_primitive(prim, AddOptions::default())
    }

    pub fn constraints(&self, om: &ObjectManager, id: PrimitiveId) -> Vec<Constraint> {
        om.same_distance_rows(id, &self.members)
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        self.members.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::FreePoint;
    use crate::units::Unit;

    fn manager() -> ObjectManager {
        ObjectManager::new(
            "test",
            UnitNumber::new(10.0, Unit::Mil),
            UnitNumber::new(10.0, Unit::Mil),
        )
    }

    #[test]
    fn test_alignment_levels_points() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 50.0, 30.0).unwrap();
        Alignment::create(&mut om, Axis::Horizontal, a, b).unwrap();
        om.update_points(None).unwrap();
        let (_, ya) = om.points().coords(om.point_handle(a));
        let (_, yb) = om.points().coords(om.point_handle(b));
        assert_eq!(ya, yb);
    }

    #[test]
    fn test_set_distance_orders_pair() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 80.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let d = SetDistance::create(
            &mut om,
            Axis::Horizontal,
            a,
            b,
            UnitNumber::new(200.0, Unit::Iu),
        )
        .unwrap();
        om.update_points(None).unwrap();
        let (xa, _) = om.points().coords(om.point_handle(a));
        let (xb, _) = om.points().coords(om.point_handle(b));
        assert!((xa - xb - 200.0).abs() < 1e-9);
        let Some(PrimitiveKind::SetDistance(sd)) = om.primitive(d).map(|p| &p.kind) else {
            panic!("expected set distance");
        };
        assert_eq!((sd.a, sd.b), (b, a));
    }

    #[test]
    fn test_set_distance_zero_ok_negative_rejected() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 10.0, 0.0).unwrap();
        let r = SetDistance::create(
            &mut om,
            Axis::Horizontal,
            a,
            b,
            UnitNumber::new(-5.0, Unit::Iu),
        );
        assert!(r.is_err());
        // A zero distance makes the pair coincident along the axis.
        SetDistance::create(&mut om, Axis::Horizontal, a, b, UnitNumber::new(0.0, Unit::Iu))
            .unwrap();
        let (xa, _) = om.points().coords(om.point_handle(a));
        let (xb, _) = om.points().coords(om.point_handle(b));
        assert_eq!(xa, xb);
    }

    #[test]
    fn test_measurement_tracks_value() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 0.0, 75.0).unwrap();
        let m = Measurement::create(&mut om, Axis::Vertical, a, b).unwrap();
        let Some(PrimitiveKind::Measurement(meas)) = om.primitive(m).map(|p| &p.kind) else {
            panic!("expected measurement");
        };
        assert_eq!(meas.value(&om), 75.0);
        assert_eq!(om.degrees_of_freedom(), 4);
    }

    #[test]
    fn test_same_distance_requires_measurements() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 10.0, 0.0).unwrap();
        assert!(SameDistance::create(&mut om, vec![a, b]).is_err());
    }

    #[test]
    fn test_same_distance_equalizes_spans() {
        let mut om = manager();
        let a = FreePoint::create(&mut om, 0.0, 0.0).unwrap();
        let b = FreePoint::create(&mut om, 100.0, 0.0).unwrap();
        let c = FreePoint::create(&mut om, 0.0, 50.0).unwrap();
        let d = FreePoint::create(&mut om, 60.0, 50.0).unwrap();
        let m1 = Measurement::create(&mut om, Axis::Horizontal, a, b).unwrap();
        let m2 = Measurement::create(&mut om, Axis::Horizontal, c, d).unwrap();
        SetDistance::create(&mut om, Axis::Horizontal, a, b, UnitNumber::new(100.0, Unit::Iu))
            .unwrap();
        SameDistance::create(&mut om, vec![m1, m2]).unwrap();
        om.update_points(None).unwrap();
        let (xc, _) = om.points().coords(om.point_handle(c));
        let (xd, _) = om.points().coords(om.point_handle(d));
        assert!((xd - xc - 100.0).abs() < 1e-6);
    }
}
