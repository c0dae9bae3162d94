//! Rectangular pads.
//!
//! A pad owns a 3x3 grid of child points: four corners, four edge
//! midpoints and the center. The grid shape is maintained entirely by
//! linear rows, so dragging any handle point reshapes or moves the pad
//! while the row/column structure holds.

use super::templates;
use super::{FreePoint, Primitive, PrimitiveId, PrimitiveKind, INTERIOR_DIST};
use crate::error::{Error, Result};
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::points::PointHandle;
use crate::units::UnitNumber;
use kurbo::{Point, Rect};

/// Validated pad dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct PadParams {
    pub w: UnitNumber,
    pub h: UnitNumber,
}

impl PadParams {
    pub fn new(w: UnitNumber, h: UnitNumber) -> Result<Self> {
        if w.to_iu() <= 0.0 || h.to_iu() <= 0.0 {
            return Err(Error::InvalidParameter(
                "pad dimensions must be positive".into(),
            ));
        }
        Ok(PadParams { w, h })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    /// Child point primitives, row-major: index `ix + 3 * iy`.
    pub points: [PrimitiveId; 9],
}

impl Pad {
    pub fn create(om: &mut ObjectManager, x: f64, y: f64, params: &PadParams) -> Result<PrimitiveId> {
        Self::create_with(om, x, y, params, AddOptions::default())
    }

    pub(crate) fn create_with(
        om: &mut ObjectManager,
        x: f64,
        y: f64,
        params: &PadParams,
        opts: AddOptions,
    ) -> Result<PrimitiveId> {
        let w = params.w.to_iu();
        let h = params.h.to_iu();
        let mut points = [PrimitiveId(0); 9];
        for iy in 0..3 {
            for ix in 0..3 {
                let px = x + (ix as f64 - 1.0) * w / 2.0;
                let py = y + (iy as f64 - 1.0) * h / 2.0;
                points[ix + 3 * iy] = FreePoint::create_child(om, px, py);
            }
        }
        let prim = Primitive::new(PrimitiveKind::Pad(Pad { points }));
        om.add_composite(prim, &points, opts)
    }

    fn grid(&self, om: &ObjectManager) -> [PointHandle; 9] {
        let mut g = [PointHandle(0); 9];
        for (slot, &id) in g.iter_mut().zip(self.points.iter()) {
            *slot = om.point_handle(id);
        }
        g
    }

    fn p(g: &[PointHandle; 9], ix: usize, iy: usize) -> PointHandle {
        g[ix + 3 * iy]
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let g = self.grid(om);
        let mut rows = Vec::new();
        for iy in 0..3 {
            let row = [Self::p(&g, 0, iy), Self::p(&g, 1, iy), Self::p(&g, 2, iy)];
            rows.extend(templates::collinear_horiz(&row));
        }
        for ix in 0..3 {
            let col = [Self::p(&g, ix, 0), Self::p(&g, ix, 1), Self::p(&g, ix, 2)];
            rows.extend(templates::collinear_vert(&col));
        }
        rows.extend(templates::equal_space_horiz(&[
            Self::p(&g, 0, 0),
            Self::p(&g, 1, 0),
            Self::p(&g, 2, 0),
        ]));
        rows.extend(templates::equal_space_vert(&[
            Self::p(&g, 0, 0),
            Self::p(&g, 0, 1),
            Self::p(&g, 0, 2),
        ]));
        rows
    }

    /// Center point primitive, used by arrays for alignment rows.
    pub fn center(&self) -> PrimitiveId {
        self.points[4]
    }

    pub fn bounds(&self, om: &ObjectManager) -> Rect {
        let g = self.grid(om);
        let (x0, y0) = om.points().coords(Self::p(&g, 0, 0));
        let (x1, y1) = om.points().coords(Self::p(&g, 2, 2));
        Rect::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        if self.bounds(om).contains(cursor) {
            Some(INTERIOR_DIST)
        } else {
            None
        }
    }

    /// Weighted spans constraining this pad's size, one per axis.
    /// `m` scales every weight so spans from two pads can be summed
    /// into a single equal-size row.
    pub fn dimensions(&self, om: &ObjectManager, m: f64) -> Vec<Vec<(PointHandle, f64, f64)>> {
        let g = self.grid(om);
        vec![
            vec![(Self::p(&g, 2, 0), m, 0.0), (Self::p(&g, 0, 0), -m, 0.0)],
            vec![(Self::p(&g, 0, 2), 0.0, m), (Self::p(&g, 0, 0), 0.0, -m)],
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

    fn iu(v: f64) -> UnitNumber {
        UnitNumber::new(v, Unit::Iu)
    }

    #[test]
    fn test_params_reject_nonpositive() {
        assert!(PadParams::new(iu(0.0), iu(100.0)).is_err());
        assert!(PadParams::new(iu(100.0), iu(-5.0)).is_err());
        assert!(PadParams::new(iu(100.0), iu(50.0)).is_ok());
    }

    #[test]
    fn test_pad_initial_geometry() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(60.0)).unwrap();
        let id = Pad::create(&mut om, 10.0, 20.0, &params).unwrap();
        let Some(PrimitiveKind::Pad(pad)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        let b = pad.bounds(&om);
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (-40.0, -10.0, 60.0, 50.0));
    }

    #[test]
    fn test_pad_survives_resolve() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let id = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        om.update_points(None).unwrap();
        let Some(PrimitiveKind::Pad(pad)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        let b = pad.bounds(&om);
        assert!((b.width() - 100.0).abs() < 1e-9);
        assert!((b.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_pad_hit_test() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let id = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        let Some(PrimitiveKind::Pad(pad)) = om.primitive(id).map(|p| &p.kind) else {
            panic!("expected pad");
        };
        assert_eq!(pad.distance_to(&om, Point::new(10.0, 10.0)), Some(10.0));
        assert_eq!(pad.distance_to(&om, Point::new(200.0, 0.0)), None);
    }

    #[test]
    fn test_pad_deletion_frees_children() {
        let mut om = manager();
        let params = PadParams::new(iu(100.0), iu(100.0)).unwrap();
        let id = Pad::create(&mut om, 0.0, 0.0, &params).unwrap();
        assert_eq!(om.points().len(), 9);
        om.delete_primitive(id).unwrap();
        assert_eq!(om.points().len(), 0);
        assert!(om.primitive(id).is_none());
    }
}
