//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Matrix2, Vector2};
use num_traits::Float;

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: PartialOrd + Copy
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Fit a first-degree polynomial `y = c[0]*x + c[1]` through the given points
/// using linear least squares.
///
/// Returns `None` if there are fewer than two points or if all points share
/// the same x value (the slope is undefined).
pub fn polyfit_1(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    // Accumulate the normal equations A^T A c = A^T y, where each row of A is
    // [x, 1].
    let mut ata = Matrix2::<f64>::zeros();
    let mut aty = Vector2::<f64>::zeros();

    for &(x, y) in points {
        ata[(0, 0)] += x * x;
        ata[(0, 1)] += x;
        ata[(1, 0)] += x;
        ata[(1, 1)] += 1.0;
        aty[0] += x * y;
        aty[1] += y;
    }

    // A vertical set of points gives a singular system
    let det = ata.determinant();
    if det.abs() <= std::f64::EPSILON {
        return None;
    }

    // Solve by Cramer's rule, which is exact for integer pixel coordinates
    let slope_num = Matrix2::new(aty[0], ata[(0, 1)], aty[1], ata[(1, 1)]).determinant();
    let icpt_num = Matrix2::new(ata[(0, 0)], aty[0], ata[(1, 0)], aty[1]).determinant();

    Some((slope_num / det, icpt_num / det))
}

/// Element-wise mean of a set of pairs, or `None` if the set is empty.
pub fn mean_pairs<T>(pairs: &[(T, T)]) -> Option<(T, T)>
where
    T: Float
{
    if pairs.is_empty() {
        return None;
    }

    let n = T::from(pairs.len())?;
    let (sum_a, sum_b) = pairs
        .iter()
        .fold((T::zero(), T::zero()), |(sa, sb), &(a, b)| (sa + a, sb + b));

    Some((sum_a / n, sum_b / n))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&150, &60, &135), 135);
        assert_eq!(clamp(&10, &60, &135), 60);
        assert_eq!(clamp(&90, &60, &135), 90);
        assert_eq!(clamp(&-0.5f64, &0.0, &1.0), 0.0);
    }

    #[test]
    fn test_polyfit_1() {
        let (m, c) = polyfit_1(&[(100f64, 480f64), (300f64, 380f64)]).unwrap();
        assert!((m + 0.5).abs() < 1e-9);
        assert!((c - 530.0).abs() < 1e-9);

        // Horizontal line has a zero slope
        let (m, c) = polyfit_1(&[(0f64, 10f64), (50f64, 10f64)]).unwrap();
        assert_eq!(m, 0.0);
        assert!((c - 10.0).abs() < 1e-9);

        // Least squares over more than two points
        let (m, c) = polyfit_1(&[(0f64, 1f64), (1f64, 3f64), (2f64, 5f64)]).unwrap();
        assert!((m - 2.0).abs() < 1e-9);
        assert!((c - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_polyfit_1_degenerate() {
        assert!(polyfit_1(&[]).is_none());
        assert!(polyfit_1(&[(1f64, 1f64)]).is_none());
        assert!(polyfit_1(&[(5f64, 1f64), (5f64, 9f64)]).is_none());
    }

    #[test]
    fn test_mean_pairs() {
        assert!(mean_pairs::<f64>(&[]).is_none());
        assert_eq!(
            mean_pairs(&[(-0.5f64, 500f64), (-1.5f64, 700f64)]),
            Some((-1.0, 600.0))
        );
    }
}
