//! Regular element arrays.
//!
//! An array instantiates a grid of identical pads, balls or pins and
//! keeps it regular through rows: element centers stay collinear along
//! grid rows and columns, spacing stays uniform along each axis, and
//! every element stays the same size as the first. The grid pitch and
//! position remain free, so dragging any element reflows the whole
//! array.

use super::templates;
use super::{Ball, BallParams, FreePoint, Pad, PadParams, Pin, PinParams};
use super::{Primitive, PrimitiveId, PrimitiveKind};
use crate::error::{Error, Result};
use crate::manager::{AddOptions, ObjectManager};
use crate::matrix::Constraint;
use crate::numbering::Numbering;
use crate::points::PointHandle;

/// Initial center-to-center pitch for freshly placed elements. Purely
/// a starting layout; the solver owns the pitch afterwards.
const INITIAL_PITCH: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ElementParams {
    Pad(PadParams),
    Ball(BallParams),
    Pin(PinParams),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayParams {
    pub nx: usize,
    pub ny: usize,
    pub element: ElementParams,
    pub numbering: Numbering,
    /// Add a synthetic point held at the array's geometric center.
    pub with_center: bool,
}

impl ArrayParams {
    pub fn validate(&self) -> Result<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(Error::InvalidParameter(
                "array dimensions must be at least 1x1".into(),
            ));
        }
        if !self.numbering.applies(self.nx, self.ny) {
            return Err(Error::InvalidParameter(
                "numbering scheme does not fit the array dimensions".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    /// Element primitives, column-major: index `iy + ny * ix`.
    pub elements: Vec<PrimitiveId>,
    pub nx: usize,
    pub ny: usize,
    /// Synthetic center point, if requested at creation.
    pub center: Option<PrimitiveId>,
    pub numbering: Numbering,
}

impl Array {
    pub fn create(om: &mut ObjectManager, x: f64, y: f64, params: &ArrayParams) -> Result<PrimitiveId> {
        params.validate()?;
        let (nx, ny) = (params.nx, params.ny);
        let mut elements = Vec::with_capacity(nx * ny);
        let x0 = x - (nx as f64 - 1.0) / 2.0 * INITIAL_PITCH;
        let y0 = y - (ny as f64 - 1.0) / 2.0 * INITIAL_PITCH;
        for ix in 0..nx {
            for iy in 0..ny {
                let ex = x0 + ix as f64 * INITIAL_PITCH;
                let ey = y0 + iy as f64 * INITIAL_PITCH;
                let el = match &params.element {
                    ElementParams::Pad(p) => Pad::create_with(om, ex, ey, p, AddOptions::element())?,
                    ElementParams::Ball(p) => Ball::create_with(om, ex, ey, p, AddOptions::element())?,
                    ElementParams::Pin(p) => Pin::create_with(om, ex, ey, p, AddOptions::element())?,
                };
                elements.push(el);
            }
        }
        let center = params
            .with_center
            .then(|| FreePoint::create_child(om, x, y));
        let all_children: Vec<PrimitiveId> =
            elements.iter().copied().chain(center).collect();
        let prim = Primitive::new(PrimitiveKind::Array(Array {
            elements,
            nx,
            ny,
            center,
            numbering: params.numbering.clone(),
        }));
        om.add_composite(prim, &all_children, AddOptions::default())
    }

    pub fn element(&self, ix: usize, iy: usize) -> PrimitiveId {
        self.elements[iy + self.ny * ix]
    }

    /// Grid cell of a direct member, if it is one.
    pub fn cell_of(&self, member: PrimitiveId) -> Option<(usize, usize)> {
        let idx = self.elements.iter().position(|&e| e == member)?;
        Some((idx / self.ny, idx % self.ny))
    }

    fn element_center(&self, om: &ObjectManager, ix: usize, iy: usize) -> PointHandle {
        let id = self.element(ix, iy);
        let center = match om.primitive(id).map(|p| &p.kind) {
            Some(PrimitiveKind::Pad(p)) => p.center(),
            Some(PrimitiveKind::Ball(b)) => b.center(),
            Some(PrimitiveKind::Pin(p)) => p.center(),
            _ => id,
        };
        om.point_handle(center)
    }

    fn element_dimensions(
        &self,
        om: &ObjectManager,
        id: PrimitiveId,
        m: f64,
    ) -> Vec<Vec<(PointHandle, f64, f64)>> {
        match om.primitive(id).map(|p| &p.kind) {
            Some(PrimitiveKind::Pad(p)) => p.dimensions(om, m),
            Some(PrimitiveKind::Ball(b)) => b.dimensions(om, m),
            Some(PrimitiveKind::Pin(p)) => p.dimensions(om, m),
            _ => Vec::new(),
        }
    }

    pub fn constraints(&self, om: &ObjectManager) -> Vec<Constraint> {
        let mut rows = Vec::new();
        // Elements are non-constraining members; their shape rows are
        // emitted here so removing the array releases them all at once.
        for &el in &self.elements {
            if let Some(p) = om.primitive(el) {
                rows.extend(p.constraints(om, el));
            }
        }

        let col = |ix: usize| -> Vec<PointHandle> {
            (0..self.ny).map(|iy| self.element_center(om, ix, iy)).collect()
        };
        let row_centers = |iy: usize| -> Vec<PointHandle> {
            (0..self.nx).map(|ix| self.element_center(om, ix, iy)).collect()
        };

        // Two instrumented columns/rows are enough to keep the whole
        // grid rectangular; the rest follows transitively.
        for ix in 0..self.nx.min(2) {
            rows.extend(templates::collinear_vert(&col(ix)));
        }
        for iy in 0..self.ny.min(2) {
            rows.extend(templates::collinear_horiz(&row_centers(iy)));
        }
        for ix in 0..self.nx {
            rows.extend(templates::equal_space_vert(&col(ix)));
        }
        for iy in 0..self.ny {
            rows.extend(templates::equal_space_horiz(&row_centers(iy)));
        }

        // Equal element sizes, first element as the reference.
        if let Some((&first, rest)) = self.elements.split_first() {
            let reference = self.element_dimensions(om, first, 1.0);
            for &other in rest {
                for (r, o) in reference.iter().zip(self.element_dimensions(om, other, 1.0)) {
                    rows.push(templates::same_span(r, &o));
                }
            }
        }

        // Synthetic center: midpoint of the two extreme element centers.
        if let Some(center) = self.center {
            let c = om.point_handle(center);
            let first = self.element_center(om, 0, 0);
            let last = self.element_center(om, self.nx - 1, self.ny - 1);
            rows.push(Constraint::new(
                vec![(first, 1.0, 0.0), (c, -2.0, 0.0), (last, 1.0, 0.0)],
                0.0,
            ));
            rows.push(Constraint::new(
                vec![(first, 0.0, 1.0), (c, 0.0, -2.0), (last, 0.0, 1.0)],
                0.0,
            ));
        }
        rows
    }

    pub fn children(&self) -> Vec<PrimitiveId> {
        self.elements.iter().copied().chain(self.center).collect()
    }

    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        self.elements.clone()
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

    fn ball_array(nx: usize, ny: usize, numbering: Numbering) -> ArrayParams {
        ArrayParams {
            nx,
            ny,
            element: ElementParams::Ball(BallParams::new(iu(10.0)).unwrap()),
            numbering,
            with_center: false,
        }
    }

    fn array_of(om: &ObjectManager, id: PrimitiveId) -> &Array {
        match om.primitive(id).map(|p| &p.kind) {
            Some(PrimitiveKind::Array(a)) => a,
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn test_rejects_empty_grid() {
        let mut om = manager();
        let params = ball_array(0, 3, Numbering::None);
        assert!(Array::create(&mut om, 0.0, 0.0, &params).is_err());
        assert_eq!(om.points().len(), 0);
    }

    #[test]
    fn test_rejects_unfit_numbering() {
        // 1D numbering cannot cover a 2x2 grid.
        let numbering = Numbering::range_1d(4, 1, 1, false);
        let params = ball_array(2, 2, numbering);
        let mut om = manager();
        assert!(Array::create(&mut om, 0.0, 0.0, &params).is_err());
    }

    #[test]
    fn test_grid_stays_regular() {
        let mut om = manager();
        let params = ball_array(3, 2, Numbering::None);
        let id = Array::create(&mut om, 0.0, 0.0, &params).unwrap();
        om.update_points(None).unwrap();
        let arr = array_of(&om, id);
        let c00 = om.points().coords(arr.element_center(&om, 0, 0));
        let c10 = om.points().coords(arr.element_center(&om, 1, 0));
        let c20 = om.points().coords(arr.element_center(&om, 2, 0));
        let c01 = om.points().coords(arr.element_center(&om, 0, 1));
        // Uniform pitch along the row, aligned rows and columns.
        assert!((c10.0 - c00.0 - (c20.0 - c10.0)).abs() < 1e-6);
        assert!((c00.1 - c10.1).abs() < 1e-6);
        assert!((c00.0 - c01.0).abs() < 1e-6);
    }

    #[test]
    fn test_cell_lookup() {
        let mut om = manager();
        let params = ball_array(2, 3, Numbering::None);
        let id = Array::create(&mut om, 0.0, 0.0, &params).unwrap();
        let arr = array_of(&om, id);
        assert_eq!(arr.cell_of(arr.element(1, 2)), Some((1, 2)));
        assert_eq!(arr.cell_of(id), None);
    }

    #[test]
    fn test_delete_array_cascades() {
        let mut om = manager();
        let params = ball_array(2, 2, Numbering::None);
        let id = Array::create(&mut om, 0.0, 0.0, &params).unwrap();
        assert_eq!(om.points().len(), 20);
        om.delete_primitive(id).unwrap();
        assert_eq!(om.points().len(), 0);
    }

    #[test]
    fn test_deleting_element_takes_array() {
        let mut om = manager();
        let params = ball_array(2, 2, Numbering::None);
        let id = Array::create(&mut om, 0.0, 0.0, &params).unwrap();
        let el = array_of(&om, id).element(0, 0);
        om.delete_primitive(el).unwrap();
        assert!(om.primitive(id).is_none());
        assert_eq!(om.points().len(), 0);
    }

    #[test]
    fn test_center_point_tracks_grid() {
        let mut om = manager();
        let mut params = ball_array(2, 2, Numbering::None);
        params.with_center = true;
        let id = Array::create(&mut om, 10.0, 20.0, &params).unwrap();
        om.update_points(None).unwrap();
        let arr = array_of(&om, id);
        let center = arr.center.unwrap();
        let (cx, cy) = om.points().coords(om.point_handle(center));
        let f = om.points().coords(arr.element_center(&om, 0, 0));
        let l = om.points().coords(arr.element_center(&om, 1, 1));
        assert!((cx - (f.0 + l.0) / 2.0).abs() < 1e-6);
        assert!((cy - (f.1 + l.1) / 2.0).abs() < 1e-6);
    }
}
