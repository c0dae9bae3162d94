//! The primitive graph.
//!
//! Every object on a footprint is a [`Primitive`]: points, pads, balls,
//! pins, lines, arrays and the relations between points. Primitives are
//! identified by [`PrimitiveId`] handles into the manager's arena and
//! reference each other through forward edges only (children they own,
//! dependencies they constrain); reverse edges are derived by the
//! manager when it needs them.

mod array;
mod ball;
mod line;
mod pad;
mod point;
mod relation;
pub(crate) mod templates;

pub use array::{Array, ArrayParams, ElementParams};
pub use ball::{Ball, BallParams, Pin, PinParams};
pub use line::{DrawnLine, LineParams, MarkedLine};
pub use pad::{Pad, PadParams};
pub use point::{CenterPoint, FreePoint};
pub use relation::{
    Alignment, Axis, Coincidence, Measurement, SameDistance, SetDistance,
};

use crate::manager::ObjectManager;
use crate::matrix::Constraint;
use crate::points::PointHandle;
use crate::units::UnitNumber;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Hit-test bias added for primitives whose interior the cursor is in,
/// so a point sitting on a pad still wins the pick.
pub(crate) const INTERIOR_DIST: f64 = 10.0;

/// Arena handle for a primitive. Never reused within a board's lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PrimitiveId(pub u32);

pub(crate) fn point_dist2(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `a`-`b`.
pub(crate) fn segment_dist2(p: Point, a: Point, b: Point) -> f64 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len2 = vx * vx + vy * vy;
    if len2 == 0.0 {
        return point_dist2(p, a);
    }
    let t = ((p.x - a.x) * vx + (p.y - a.y) * vy) / len2;
    let t = t.clamp(0.0, 1.0);
    point_dist2(p, Point::new(a.x + t * vx, a.y + t * vy))
}

/// Attributes every primitive carries. Unset fields inherit through
/// the parent chain, ending at the board defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance: Option<UnitNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<UnitNumber>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveKind {
    Point(FreePoint),
    CenterPoint(CenterPoint),
    Pad(Pad),
    Ball(Ball),
    Pin(Pin),
    DrawnLine(DrawnLine),
    MarkedLine(MarkedLine),
    Alignment(Alignment),
    Coincidence(Coincidence),
    SetDistance(SetDistance),
    Measurement(Measurement),
    SameDistance(SameDistance),
    Array(Array),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub meta: Meta,
    pub kind: PrimitiveKind,
}

impl Primitive {
    pub fn new(kind: PrimitiveKind) -> Self {
        Primitive {
            meta: Meta::default(),
            kind,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            PrimitiveKind::Point(_) => "point",
            PrimitiveKind::CenterPoint(_) => "center_point",
            PrimitiveKind::Pad(_) => "pad",
            PrimitiveKind::Ball(_) => "ball",
            PrimitiveKind::Pin(_) => "pin",
            PrimitiveKind::DrawnLine(_) => "drawn_line",
            PrimitiveKind::MarkedLine(_) => "marked_line",
            PrimitiveKind::Alignment(_) => "alignment",
            PrimitiveKind::Coincidence(_) => "coincidence",
            PrimitiveKind::SetDistance(_) => "set_distance",
            PrimitiveKind::Measurement(_) => "measurement",
            PrimitiveKind::SameDistance(_) => "same_distance",
            PrimitiveKind::Array(_) => "array",
        }
    }

    /// The wrapped point handle, for the two point variants.
    pub fn as_point(&self) -> Option<PointHandle> {
        match &self.kind {
            PrimitiveKind::Point(p) => Some(p.point),
            PrimitiveKind::CenterPoint(p) => Some(p.point),
            _ => None,
        }
    }

    /// Rows this primitive contributes to the linear system.
    pub fn constraints(&self, om: &ObjectManager, id: PrimitiveId) -> Vec<Constraint> {
        match &self.kind {
            PrimitiveKind::Point(_) => Vec::new(),
            PrimitiveKind::CenterPoint(p) => p.constraints(),
            PrimitiveKind::Pad(p) => p.constraints(om),
            PrimitiveKind::Ball(b) => b.constraints(om),
            PrimitiveKind::Pin(p) => p.constraints(om),
            PrimitiveKind::DrawnLine(l) => l.constraints(om),
            PrimitiveKind::MarkedLine(l) => l.constraints(om),
            PrimitiveKind::Alignment(a) => a.constraints(om),
            PrimitiveKind::Coincidence(c) => c.constraints(om),
            PrimitiveKind::SetDistance(d) => d.constraints(om),
            PrimitiveKind::Measurement(_) => Vec::new(),
            PrimitiveKind::SameDistance(s) => s.constraints(om, id),
            PrimitiveKind::Array(a) => a.constraints(om),
        }
    }

    /// Primitives this one owns. Deleting the owner deletes them.
    pub fn children(&self) -> Vec<PrimitiveId> {
        match &self.kind {
            PrimitiveKind::Point(_)
            | PrimitiveKind::CenterPoint(_)
            | PrimitiveKind::Alignment(_)
            | PrimitiveKind::Coincidence(_)
            | PrimitiveKind::SetDistance(_)
            | PrimitiveKind::Measurement(_)
            | PrimitiveKind::SameDistance(_) => Vec::new(),
            PrimitiveKind::Pad(p) => p.points.to_vec(),
            PrimitiveKind::Ball(b) => b.points.to_vec(),
            PrimitiveKind::Pin(p) => p.children(),
            PrimitiveKind::DrawnLine(l) => l.children(),
            PrimitiveKind::MarkedLine(l) => vec![l.a, l.b, l.mark],
            PrimitiveKind::Array(a) => a.children(),
        }
    }

    /// Primitives this one references without owning. Deleting a
    /// dependency deletes this primitive too.
    pub fn dependencies(&self) -> Vec<PrimitiveId> {
        match &self.kind {
            PrimitiveKind::Alignment(a) => a.dependencies(),
            PrimitiveKind::Coincidence(c) => c.dependencies(),
            PrimitiveKind::SetDistance(d) => d.dependencies(),
            PrimitiveKind::Measurement(m) => m.dependencies(),
            PrimitiveKind::SameDistance(s) => s.dependencies(),
            PrimitiveKind::Array(a) => a.dependencies(),
            _ => Vec::new(),
        }
    }

    /// Squared pick distance from the cursor, or `None` when this
    /// primitive cannot be picked at that position.
    pub fn distance_to(&self, om: &ObjectManager, cursor: Point) -> Option<f64> {
        match &self.kind {
            PrimitiveKind::Point(p) => p.distance_to(om, cursor),
            PrimitiveKind::CenterPoint(p) => {
                FreePoint { point: p.point }.distance_to(om, cursor)
            }
            PrimitiveKind::Pad(p) => p.distance_to(om, cursor),
            PrimitiveKind::Ball(b) => b.distance_to(om, cursor),
            PrimitiveKind::Pin(p) => p.distance_to(om, cursor),
            PrimitiveKind::DrawnLine(l) => l.distance_to(om, cursor),
            PrimitiveKind::MarkedLine(l) => l.distance_to(om, cursor),
            PrimitiveKind::Alignment(a) => a.distance_to(om, cursor),
            PrimitiveKind::Coincidence(c) => c.distance_to(om, cursor),
            PrimitiveKind::SetDistance(d) => d.distance_to(om, cursor),
            PrimitiveKind::Measurement(m) => m.distance_to(om, cursor),
            PrimitiveKind::SameDistance(_) => None,
            PrimitiveKind::Array(_) => None,
        }
    }

    pub fn can_delete(&self) -> bool {
        !matches!(self.kind, PrimitiveKind::CenterPoint(_))
    }

    /// Point handles whose coordinates this primitive ultimately owns,
    /// outermost first. Used to prioritize pinning while dragging.
    pub fn owned_points(&self, om: &ObjectManager) -> Vec<PointHandle> {
        if let Some(h) = self.as_point() {
            return vec![h];
        }
        let mut out = Vec::new();
        for child in self.children() {
            if let Some(p) = om.primitive(child) {
                out.extend(p.owned_points(om));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_dist2() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(segment_dist2(Point::new(5.0, 3.0), a, b), 9.0);
        assert_eq!(segment_dist2(Point::new(-4.0, 3.0), a, b), 25.0);
        assert_eq!(segment_dist2(Point::new(13.0, 4.0), a, b), 25.0);
        // Degenerate segment falls back to point distance.
        assert_eq!(segment_dist2(Point::new(3.0, 4.0), a, a), 25.0);
    }
}
