//! Constraint matrix engine.
//!
//! Sparse Gaussian elimination over the point coordinate unknowns, with
//! simultaneous inverse tracking. Every accepted row keeps, next to its
//! forward coefficients, an "inverse row": the affine expression of the
//! pivot unknown over *slots*. A slot is either the constant contributed by
//! explicit constraint targets (`None`), or a pinned coordinate (`Some(u)`)
//! whose value is the point's last known coordinate. Once every unknown has
//! a pivot row, the inverse rows form a pseudo-inverse that evaluates all
//! coordinates directly, without re-solving a dense system.

use crate::points::PointHandle;
use std::collections::BTreeMap;

/// Coefficient tolerance, applied uniformly at redundancy detection and
/// coefficient cleanup. Rows whose every coefficient falls below this after
/// elimination are redundant with the existing basis.
pub const EPSILON: f64 = 1e-4;

/// A slot in an inverse row: `None` holds the accumulated explicit-target
/// constant, `Some(u)` refers to unknown `u` pinned at its last known value.
pub type Slot = Option<usize>;

/// Sparse forward row: unknown index to coefficient.
pub type Row = BTreeMap<usize, f64>;

/// Sparse inverse row: slot to coefficient.
pub type InvRow = BTreeMap<Slot, f64>;

/// A linear equality over point coordinates:
/// `sum(xw * x(p) + yw * y(p)) = target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// `(point, x_weight, y_weight)` triples.
    pub terms: Vec<(PointHandle, f64, f64)>,
    pub target: f64,
}

impl Constraint {
    pub fn new(terms: Vec<(PointHandle, f64, f64)>, target: f64) -> Self {
        Self { terms, target }
    }

    /// Lower the constraint onto matrix unknowns. Weights for a point that
    /// appears more than once accumulate.
    pub fn row(&self) -> Row {
        let mut row = Row::new();
        for &(p, xw, yw) in &self.terms {
            if xw != 0.0 {
                *row.entry(p.x_unknown()).or_insert(0.0) += xw;
            }
            if yw != 0.0 {
                *row.entry(p.y_unknown()).or_insert(0.0) += yw;
            }
        }
        row.retain(|_, v| *v != 0.0);
        row
    }
}

/// Row-echelon basis built one row at a time.
#[derive(Debug, Clone, Default)]
pub struct LinearSystem {
    rows: Vec<Row>,
    inv: Vec<InvRow>,
    // Pivot column -> index of the row owning it. Every accepted row is
    // normalized to coefficient 1 at its pivot, and existing rows are fully
    // back-substituted, so no row references another row's pivot column.
    pivots: BTreeMap<usize, usize>,
}

impl LinearSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of independent rows accepted so far.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the given unknown already has a pivot row.
    pub fn is_fixed(&self, unknown: usize) -> bool {
        self.pivots.contains_key(&unknown)
    }

    /// Add an explicit constraint row. Returns `false` if the row is
    /// redundant with the existing basis (the caller decides whether that
    /// is an over-constraint or an ignorable soft row).
    pub fn add_constraint(&mut self, constraint: &Constraint) -> bool {
        self.add_row(constraint.row(), None, constraint.target)
    }

    /// Pin both coordinates of a point to their last known values. Already
    /// fixed coordinates are skipped; redundancy here is expected, not an
    /// error.
    pub fn pin_point(&mut self, p: PointHandle) {
        for unknown in [p.x_unknown(), p.y_unknown()] {
            let mut row = Row::new();
            row.insert(unknown, 1.0);
            self.add_row(row, Some(unknown), 1.0);
        }
    }

    /// Fold one row into the basis.
    ///
    /// The inverse row is seeded with `{slot: target}`; every elimination
    /// step applied to the forward row is mirrored into it, so it ends up as
    /// the pivot unknown's affine expression over slots.
    pub fn add_row(&mut self, mut row: Row, slot: Slot, target: f64) -> bool {
        let mut inv_row = InvRow::new();
        inv_row.insert(slot, target);

        // Eliminate every unknown that already has a pivot. Basis rows only
        // contain their own pivot column (coefficient 1) plus free columns,
        // so each step strictly removes one pivot reference.
        loop {
            let hit = row
                .iter()
                .find_map(|(&u, &c)| self.pivots.get(&u).map(|&i| (c, i)));
            let Some((factor, i)) = hit else { break };
            let basis = self.rows[i].clone();
            let basis_inv = self.inv[i].clone();
            for (&u, &v) in &basis {
                *row.entry(u).or_insert(0.0) -= v * factor;
            }
            for (&s, &v) in &basis_inv {
                *inv_row.entry(s).or_insert(0.0) -= v * factor;
            }
            row.retain(|_, v| v.abs() >= EPSILON);
        }

        // All coefficients eliminated: redundant with the basis.
        let Some((&pivot, &pivot_coeff)) = row.iter().next() else {
            return false;
        };
        debug_assert!(!self.pivots.contains_key(&pivot));

        for v in row.values_mut() {
            *v /= pivot_coeff;
        }
        for v in inv_row.values_mut() {
            *v /= pivot_coeff;
        }
        inv_row.retain(|_, v| *v != 0.0);

        // Back-substitute the new pivot out of every existing row.
        for idx in 0..self.rows.len() {
            let Some(&factor) = self.rows[idx].get(&pivot) else {
                continue;
            };
            for (&u, &v) in &row {
                *self.rows[idx].entry(u).or_insert(0.0) -= v * factor;
            }
            for (&s, &v) in &inv_row {
                *self.inv[idx].entry(s).or_insert(0.0) -= v * factor;
            }
            self.rows[idx].retain(|_, v| v.abs() >= EPSILON);
            self.inv[idx].retain(|_, v| *v != 0.0);
        }

        self.pivots.insert(pivot, self.rows.len());
        self.rows.push(row);
        self.inv.push(inv_row);
        true
    }

    /// The pseudo-inverse: for each fixed unknown, its affine expression
    /// over slots.
    pub fn solution(&self) -> Solution {
        Solution {
            exprs: self
                .pivots
                .iter()
                .map(|(&u, &i)| (u, self.inv[i].clone()))
                .collect(),
        }
    }
}

/// Solved affine expressions, one per fixed unknown.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    exprs: BTreeMap<usize, InvRow>,
}

impl Solution {
    /// Evaluate an unknown. `coord` supplies the last known value of a
    /// pinned coordinate slot. Returns `None` for unknowns the system never
    /// fixed (cannot happen once every point has been offered for pinning).
    pub fn eval<F>(&self, unknown: usize, coord: F) -> Option<f64>
    where
        F: Fn(usize) -> f64,
    {
        let expr = self.exprs.get(&unknown)?;
        let mut value = 0.0;
        for (&slot, &c) in expr {
            match slot {
                Some(u) => value += c * coord(u),
                None => value += c,
            }
        }
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}
