//! Reusable constraint generators.
//!
//! Composite primitives assemble their linear systems from a small set of
//! patterns: collinearity along an axis, equal spacing along an axis, and
//! the five-point compass pattern used by balls, pins and line caps.

use crate::matrix::Constraint;
use crate::points::PointHandle;

/// All points share their y coordinate (horizontally aligned).
pub fn collinear_horiz(points: &[PointHandle]) -> Vec<Constraint> {
    collinear(points, 0.0, 1.0)
}

/// All points share their x coordinate (vertically aligned).
pub fn collinear_vert(points: &[PointHandle]) -> Vec<Constraint> {
    collinear(points, 1.0, 0.0)
}

fn collinear(points: &[PointHandle], xw: f64, yw: f64) -> Vec<Constraint> {
    let Some((&p0, rest)) = points.split_first() else {
        return Vec::new();
    };
    rest.iter()
        .map(|&p| Constraint::new(vec![(p0, xw, yw), (p, -xw, -yw)], 0.0))
        .collect()
}

/// Consecutive gaps along x are equal: for each triple,
/// `x(a) - 2 x(b) + x(c) = 0`.
pub fn equal_space_horiz(points: &[PointHandle]) -> Vec<Constraint> {
    equal_space(points, 1.0, 0.0)
}

/// Consecutive gaps along y are equal.
pub fn equal_space_vert(points: &[PointHandle]) -> Vec<Constraint> {
    equal_space(points, 0.0, 1.0)
}

fn equal_space(points: &[PointHandle], xw: f64, yw: f64) -> Vec<Constraint> {
    points
        .windows(3)
        .map(|w| {
            Constraint::new(
                vec![
                    (w[0], xw, yw),
                    (w[1], -2.0 * xw, -2.0 * yw),
                    (w[2], xw, yw),
                ],
                0.0,
            )
        })
        .collect()
}

/// Constraints for a five-point compass pattern
/// `(top, left, center, right, bottom)`: the horizontal trio collinear, the
/// vertical trio collinear, equal spacing on both axes, and one 3-term row
/// making the radius identical in all four directions.
pub fn compass(points: &[PointHandle; 5]) -> Vec<Constraint> {
    let [top, left, center, right, bottom] = *points;
    let mut constraints = Vec::new();
    constraints.extend(collinear_horiz(&[left, center, right]));
    constraints.extend(collinear_vert(&[top, center, bottom]));
    constraints.extend(equal_space_horiz(&[left, center, right]));
    constraints.extend(equal_space_vert(&[top, center, bottom]));
    // Radius east equals radius south; the collinearity and spacing rows
    // propagate it to the remaining directions.
    constraints.push(Constraint::new(
        vec![(center, -1.0, 1.0), (right, 1.0, 0.0), (bottom, 0.0, -1.0)],
        0.0,
    ));
    constraints
}

/// Equate two dimension spans (each a weighted point combination), as used
/// by arrays to force every element to the first element's size.
pub fn same_span(
    reference: &[(PointHandle, f64, f64)],
    other: &[(PointHandle, f64, f64)],
) -> Constraint {
    let mut terms = reference.to_vec();
    terms.extend(other.iter().map(|&(p, xw, yw)| (p, -xw, -yw)));
    Constraint::new(terms, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles(n: u32) -> Vec<PointHandle> {
        (0..n).map(PointHandle).collect()
    }

    #[test]
    fn test_collinear_counts() {
        let pts = handles(4);
        assert_eq!(collinear_horiz(&pts).len(), 3);
        assert_eq!(collinear_vert(&pts).len(), 3);
        assert!(collinear_horiz(&[]).is_empty());
    }

    #[test]
    fn test_collinear_weights() {
        let pts = handles(2);
        let c = &collinear_horiz(&pts)[0];
        assert_eq!(c.terms, vec![(pts[0], 0.0, 1.0), (pts[1], 0.0, -1.0)]);
        assert_eq!(c.target, 0.0);
    }

    #[test]
    fn test_equal_space_triples() {
        let pts = handles(5);
        assert_eq!(equal_space_horiz(&pts).len(), 3);
        assert_eq!(equal_space_horiz(&pts[..2]).len(), 0);
    }

    #[test]
    fn test_compass_row_count() {
        let pts = handles(5);
        let arr = [pts[0], pts[1], pts[2], pts[3], pts[4]];
        // 2 + 2 collinear, 1 + 1 spacing, 1 radius identity.
        assert_eq!(compass(&arr).len(), 7);
    }

    #[test]
    fn test_same_span_negates_other() {
        let pts = handles(4);
        let c = same_span(
            &[(pts[0], 1.0, 0.0), (pts[1], -1.0, 0.0)],
            &[(pts[2], 1.0, 0.0), (pts[3], -1.0, 0.0)],
        );
        assert_eq!(
            c.terms,
            vec![
                (pts[0], 1.0, 0.0),
                (pts[1], -1.0, 0.0),
                (pts[2], -1.0, 0.0),
                (pts[3], 1.0, 0.0),
            ]
        );
    }
}
