//! The serialized footprint format.
//!
//! A [`FootprintDocument`] is the JSON shape of a board: the point store
//! (coordinates in recency order plus the allocation cursor), every
//! primitive as a tagged record whose references are list indices, and
//! the draw/constraining/suppressed index lists. Emitting primitives in
//! insertion order makes the list topologically sorted, but loading only
//! assumes indices resolve eventually, not that they come pre-sorted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::numbering::Numbering;
use crate::points::{PointHandle, PointStore};
use crate::primitives::{
    Alignment, Array, Axis, Ball, CenterPoint, Coincidence, DrawnLine, FreePoint, MarkedLine,
    Measurement, Meta, Pad, Pin, Primitive, PrimitiveId, PrimitiveKind, SameDistance, SetDistance,
};
use crate::units::UnitNumber;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    pub index: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimitiveEntry {
    pub index: usize,
    #[serde(flatten)]
    pub meta: Meta,
    #[serde(flatten)]
    pub record: PrimitiveRecord,
}

/// One primitive, kind-tagged, with references as primitive list indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "primitive_type", content = "primitive_dict", rename_all = "snake_case")]
pub enum PrimitiveRecord {
    Point {
        point: u32,
    },
    CenterPoint {
        point: u32,
    },
    Pad {
        points: Vec<usize>,
    },
    Ball {
        points: Vec<usize>,
    },
    Pin {
        ring: Vec<usize>,
        hole: Vec<usize>,
    },
    DrawnLine {
        cap_a: Vec<usize>,
        cap_b: Vec<usize>,
    },
    MarkedLine {
        a: usize,
        b: usize,
        mark: usize,
        fraction: f64,
    },
    Alignment {
        axis: Axis,
        a: usize,
        b: usize,
    },
    Coincidence {
        a: usize,
        b: usize,
    },
    SetDistance {
        axis: Axis,
        a: usize,
        b: usize,
        distance: UnitNumber,
        label_offset: f64,
    },
    Measurement {
        axis: Axis,
        a: usize,
        b: usize,
        label_offset: f64,
    },
    SameDistance {
        members: Vec<usize>,
    },
    Array {
        elements: Vec<usize>,
        nx: usize,
        ny: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<usize>,
        numbering: Numbering,
    },
}

fn indices(ids: &[PrimitiveId], index_of: &HashMap<PrimitiveId, usize>) -> Vec<usize> {
    ids.iter().map(|id| index_of[id]).collect()
}

impl PrimitiveRecord {
    pub(crate) fn from_primitive(
        prim: &Primitive,
        index_of: &HashMap<PrimitiveId, usize>,
    ) -> PrimitiveRecord {
        match &prim.kind {
            PrimitiveKind::Point(p) => PrimitiveRecord::Point { point: p.point.0 },
            PrimitiveKind::CenterPoint(p) => PrimitiveRecord::CenterPoint { point: p.point.0 },
            PrimitiveKind::Pad(p) => PrimitiveRecord::Pad {
                points: indices(&p.points, index_of),
            },
            PrimitiveKind::Ball(b) => PrimitiveRecord::Ball {
                points: indices(&b.points, index_of),
            },
            PrimitiveKind::Pin(p) => PrimitiveRecord::Pin {
                ring: indices(&p.ring, index_of),
                hole: indices(&p.hole, index_of),
            },
            PrimitiveKind::DrawnLine(l) => PrimitiveRecord::DrawnLine {
                cap_a: indices(&l.cap_a, index_of),
                cap_b: indices(&l.cap_b, index_of),
            },
            PrimitiveKind::MarkedLine(l) => PrimitiveRecord::MarkedLine {
                a: index_of[&l.a],
                b: index_of[&l.b],
                mark: index_of[&l.mark],
                fraction: l.fraction,
            },
            PrimitiveKind::Alignment(a) => PrimitiveRecord::Alignment {
                axis: a.axis,
                a: index_of[&a.a],
                b: index_of[&a.b],
            },
            PrimitiveKind::Coincidence(c) => PrimitiveRecord::Coincidence {
                a: index_of[&c.a],
                b: index_of[&c.b],
            },
            PrimitiveKind::SetDistance(d) => PrimitiveRecord::SetDistance {
                axis: d.axis,
                a: index_of[&d.a],
                b: index_of[&d.b],
                distance: d.distance,
                label_offset: d.label_offset,
            },
            PrimitiveKind::Measurement(m) => PrimitiveRecord::Measurement {
                axis: m.axis,
                a: index_of[&m.a],
                b: index_of[&m.b],
                label_offset: m.label_offset,
            },
            PrimitiveKind::SameDistance(s) => PrimitiveRecord::SameDistance {
                members: indices(&s.members, index_of),
            },
            PrimitiveKind::Array(arr) => PrimitiveRecord::Array {
                elements: indices(&arr.elements, index_of),
                nx: arr.nx,
                ny: arr.ny,
                center: arr.center.map(|c| index_of[&c]),
                numbering: arr.numbering.clone(),
            },
        }
    }

    /// Primitive list indices this record references.
    pub(crate) fn deps(&self) -> Vec<usize> {
        match self {
            PrimitiveRecord::Point { .. } | PrimitiveRecord::CenterPoint { .. } => Vec::new(),
            PrimitiveRecord::Pad { points } | PrimitiveRecord::Ball { points } => points.clone(),
            PrimitiveRecord::Pin { ring, hole } => {
                ring.iter().chain(hole).copied().collect()
            }
            PrimitiveRecord::DrawnLine { cap_a, cap_b } => {
                cap_a.iter().chain(cap_b).copied().collect()
            }
            PrimitiveRecord::MarkedLine { a, b, mark, .. } => vec![*a, *b, *mark],
            PrimitiveRecord::Alignment { a, b, .. }
            | PrimitiveRecord::Coincidence { a, b }
            | PrimitiveRecord::SetDistance { a, b, .. }
            | PrimitiveRecord::Measurement { a, b, .. } => vec![*a, *b],
            PrimitiveRecord::SameDistance { members } => members.clone(),
            PrimitiveRecord::Array {
                elements, center, ..
            } => elements.iter().copied().chain(*center).collect(),
        }
    }

    /// Rebuild the in-memory kind, resolving indices through `built`.
    pub(crate) fn instantiate(
        &self,
        built: &[Option<PrimitiveId>],
        store: &PointStore,
    ) -> Result<PrimitiveKind> {
        let id = |index: usize| -> Result<PrimitiveId> {
            built
                .get(index)
                .copied()
                .flatten()
                .ok_or_else(|| Error::Serialization(format!("bad primitive index {index}")))
        };
        let ids = |indexes: &[usize]| -> Result<Vec<PrimitiveId>> {
            indexes.iter().map(|&i| id(i)).collect()
        };
        let handle = |index: u32| -> Result<PointHandle> {
            let h = PointHandle(index);
            if store.contains(h) {
                Ok(h)
            } else {
                Err(Error::Serialization(format!("bad point index {index}")))
            }
        };
        let fixed = |v: Vec<PrimitiveId>, len: usize| -> Result<Vec<PrimitiveId>> {
            if v.len() == len {
                Ok(v)
            } else {
                Err(Error::Serialization(format!(
                    "expected {len} member primitives, got {}",
                    v.len()
                )))
            }
        };

        Ok(match self {
            PrimitiveRecord::Point { point } => PrimitiveKind::Point(FreePoint {
                point: handle(*point)?,
            }),
            PrimitiveRecord::CenterPoint { point } => PrimitiveKind::CenterPoint(CenterPoint {
                point: handle(*point)?,
            }),
            PrimitiveRecord::Pad { points } => {
                let v = fixed(ids(points)?, 9)?;
                let mut arr = [PrimitiveId(0); 9];
                arr.copy_from_slice(&v);
                PrimitiveKind::Pad(Pad { points: arr })
            }
            PrimitiveRecord::Ball { points } => {
                let v = fixed(ids(points)?, 5)?;
                let mut arr = [PrimitiveId(0); 5];
                arr.copy_from_slice(&v);
                PrimitiveKind::Ball(Ball { points: arr })
            }
            PrimitiveRecord::Pin { ring, hole } => {
                let r = fixed(ids(ring)?, 5)?;
                let h = fixed(ids(hole)?, 5)?;
                let mut ring = [PrimitiveId(0); 5];
                let mut hole = [PrimitiveId(0); 5];
                ring.copy_from_slice(&r);
                hole.copy_from_slice(&h);
                if ring[2] != hole[2] {
                    return Err(Error::Serialization(
                        "pin ring and hole must share their center".into(),
                    ));
                }
                PrimitiveKind::Pin(Pin { ring, hole })
            }
            PrimitiveRecord::DrawnLine { cap_a, cap_b } => {
                let a = fixed(ids(cap_a)?, 5)?;
                let b = fixed(ids(cap_b)?, 5)?;
                let mut cap_a = [PrimitiveId(0); 5];
                let mut cap_b = [PrimitiveId(0); 5];
                cap_a.copy_from_slice(&a);
                cap_b.copy_from_slice(&b);
                PrimitiveKind::DrawnLine(DrawnLine { cap_a, cap_b })
            }
            PrimitiveRecord::MarkedLine { a, b, mark, fraction } => {
                if !(0.0..=1.0).contains(fraction) {
                    return Err(Error::Serialization("mark fraction out of range".into()));
                }
                PrimitiveKind::MarkedLine(MarkedLine {
                    a: id(*a)?,
                    b: id(*b)?,
                    mark: id(*mark)?,
                    fraction: *fraction,
                })
            }
            PrimitiveRecord::Alignment { axis, a, b } => PrimitiveKind::Alignment(Alignment {
                axis: *axis,
                a: id(*a)?,
                b: id(*b)?,
            }),
            PrimitiveRecord::Coincidence { a, b } => PrimitiveKind::Coincidence(Coincidence {
                a: id(*a)?,
                b: id(*b)?,
            }),
            PrimitiveRecord::SetDistance {
                axis,
                a,
                b,
                distance,
                label_offset,
            } => PrimitiveKind::SetDistance(SetDistance {
                axis: *axis,
                a: id(*a)?,
                b: id(*b)?,
                distance: *distance,
                label_offset: *label_offset,
            }),
            PrimitiveRecord::Measurement {
                axis,
                a,
                b,
                label_offset,
            } => PrimitiveKind::Measurement(Measurement {
                axis: *axis,
                a: id(*a)?,
                b: id(*b)?,
                label_offset: *label_offset,
            }),
            PrimitiveRecord::SameDistance { members } => {
                PrimitiveKind::SameDistance(SameDistance {
                    members: ids(members)?,
                })
            }
            PrimitiveRecord::Array {
                elements,
                nx,
                ny,
                center,
                numbering,
            } => {
                if *nx * *ny != elements.len() {
                    return Err(Error::Serialization(
                        "array dimensions do not match its element count".into(),
                    ));
                }
                PrimitiveKind::Array(Array {
                    elements: ids(elements)?,
                    nx: *nx,
                    ny: *ny,
                    center: center.as_ref().map(|&i| id(i)).transpose()?,
                    numbering: numbering.clone(),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FootprintDocument {
    pub fp_name: String,
    pub default_clearance: UnitNumber,
    pub default_mask: UnitNumber,
    /// Point allocation cursor, persisted so handles stay unique across
    /// save/load cycles.
    pub next_point_index: u32,
    /// Live points in recency order, most recently touched first.
    pub points: Vec<PointRecord>,
    pub primitives: Vec<PrimitiveEntry>,
    pub draw: Vec<usize>,
    pub constraining: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<usize>,
}

impl FootprintDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<FootprintDocument> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tagging() {
        let record = PrimitiveRecord::Alignment {
            axis: Axis::Horizontal,
            a: 0,
            b: 1,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["primitive_type"], "alignment");
        assert_eq!(json["primitive_dict"]["axis"], "horizontal");
        assert_eq!(json["primitive_dict"]["a"], 0);
    }

    #[test]
    fn test_entry_meta_flattens() {
        let entry = PrimitiveEntry {
            index: 2,
            meta: Meta {
                number: Some("A1".into()),
                ..Meta::default()
            },
            record: PrimitiveRecord::Point { point: 4 },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["index"], 2);
        assert_eq!(json["number"], "A1");
        assert!(json.get("clearance").is_none());
        let back: PrimitiveEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.meta.number.as_deref(), Some("A1"));
    }

    #[test]
    fn test_instantiate_rejects_bad_indices() {
        let record = PrimitiveRecord::Coincidence { a: 0, b: 7 };
        let built = vec![Some(PrimitiveId(0))];
        let store = PointStore::new();
        assert!(record.instantiate(&built, &store).is_err());
    }

    #[test]
    fn test_instantiate_rejects_short_pad() {
        let record = PrimitiveRecord::Pad {
            points: vec![0, 1, 2],
        };
        let built: Vec<Option<PrimitiveId>> = (0..3).map(|i| Some(PrimitiveId(i))).collect();
        let store = PointStore::new();
        assert!(record.instantiate(&built, &store).is_err());
    }
}
