//! Pin/pad/ball numbering schemes.
//!
//! Each scheme is a pure function from a grid cell `(i, j)` to an optional
//! label, stateless apart from its construction parameters.

use serde::{Deserialize, Serialize};

/// A numbering scheme for array cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum Numbering {
    /// Do not assign numbers.
    None,
    /// 1-D numeric range along the long axis of a 1xN / Nx1 grid.
    Range1d { start: i64, step: i64 },
    /// 1-D letter range rendered as code-point offsets from 'A'.
    Letters1d { start: i64, step: i64 },
    /// 2-D numbering with independent x/y increments and per-axis zig-zag.
    Grid2d {
        start: i64,
        x_step: i64,
        y_step: i64,
        x_zigzag: bool,
        y_zigzag: bool,
        width: usize,
        height: usize,
    },
}

impl Numbering {
    /// Build a 1-D range; `reversed` is folded into (start, step) so the
    /// scheme itself stays a plain affine map.
    pub fn range_1d(len: usize, start: i64, step: i64, reversed: bool) -> Self {
        let (start, step) = fold_reversed(len, start, step, reversed);
        Numbering::Range1d { start, step }
    }

    /// Build a 1-D letter range with the same parameters.
    pub fn letters_1d(len: usize, start: i64, step: i64, reversed: bool) -> Self {
        let (start, step) = fold_reversed(len, start, step, reversed);
        Numbering::Letters1d { start, step }
    }

    /// Build a 2-D scheme; reversal folds into the increments per axis.
    #[allow(clippy::too_many_arguments)]
    pub fn grid_2d(
        width: usize,
        height: usize,
        start: i64,
        x_step: i64,
        y_step: i64,
        x_reversed: bool,
        y_reversed: bool,
        x_zigzag: bool,
        y_zigzag: bool,
    ) -> Self {
        let (start, x_step) = fold_reversed(width, start, x_step, x_reversed);
        let (start, y_step) = fold_reversed(height, start, y_step, y_reversed);
        Numbering::Grid2d {
            start,
            x_step,
            y_step,
            x_zigzag,
            y_zigzag,
            width,
            height,
        }
    }

    /// Whether the scheme makes sense for a w x h grid.
    pub fn applies(&self, w: usize, h: usize) -> bool {
        match self {
            Numbering::None => true,
            Numbering::Range1d { .. } | Numbering::Letters1d { .. } => w == 1 || h == 1,
            Numbering::Grid2d { .. } => w > 0 && h > 0,
        }
    }

    /// Label for cell `(i, j)`.
    pub fn label(&self, i: usize, j: usize) -> Option<String> {
        match *self {
            Numbering::None => None,
            Numbering::Range1d { start, step } => {
                let idx = i.max(j) as i64;
                Some((start + step * idx).to_string())
            }
            Numbering::Letters1d { start, step } => {
                let idx = start + step * i.max(j) as i64;
                let code = u32::from('A') + u32::try_from(idx).ok()?;
                Some(char::from_u32(code)?.to_string())
            }
            Numbering::Grid2d {
                start,
                x_step,
                y_step,
                x_zigzag,
                y_zigzag,
                width,
                height,
            } => {
                let mut i = i;
                let mut j = j;
                // Alternate traversal direction every other row/column.
                if x_zigzag && j % 2 > 0 {
                    i = width - 1 - i;
                }
                if y_zigzag && i % 2 > 0 {
                    j = height - 1 - j;
                }
                Some((start + x_step * i as i64 + y_step * j as i64).to_string())
            }
        }
    }
}

impl Default for Numbering {
    fn default() -> Self {
        Numbering::None
    }
}

fn fold_reversed(len: usize, start: i64, step: i64, reversed: bool) -> (i64, i64) {
    if reversed && len > 0 {
        (start + (len as i64 - 1) * step, -step)
    } else {
        (start, step)
    }
}
