//! Constraint core for interactive PCB footprint design.
//!
//! A footprint is modeled as a set of points whose coordinates are the
//! unknowns of a sparse linear system. Primitives (pads, balls, pins,
//! lines, arrays and point relations) contribute rows to that system;
//! underconstrained coordinates are pinned at their current values in
//! least-recently-touched order, so a resolve always has exactly one
//! solution and dragging feels local instead of global.
//!
//! The crate is UI-agnostic: it owns the geometry, the solver and the
//! persistence format, and exposes picking and dragging entry points a
//! frontend can wire to a canvas.

pub mod document;
pub mod error;
pub mod manager;
pub mod matrix;
pub mod numbering;
pub mod points;
pub mod primitives;
pub mod storage;
pub mod units;

pub use document::FootprintDocument;
pub use error::{Error, Result};
pub use manager::{AddOptions, ObjectManager};
pub use numbering::Numbering;
pub use points::{PointHandle, PointStore};
pub use primitives::{Primitive, PrimitiveId, PrimitiveKind};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use units::{Unit, UnitNumber};
