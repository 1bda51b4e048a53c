//! Dense Gauss elimination with a "first nonzero below" pivot rule.
//!
//! This is deliberately not a textbook partial-pivot-by-largest-magnitude
//! solver: it picks the first nonzero entry below the diagonal as pivot,
//! bails out of the forward pass early the moment the remaining strict
//! lower triangle is already all zero, and defaults an indeterminate
//! (`NaN`) back-substitution result — a genuinely free variable — to
//! `1.0`. Row swaps only ever exchange equations, never columns, so the
//! solved vector stays indexed by variable (column) position throughout;
//! no corresponding permutation of the result is needed once elimination
//! finishes.

use log::trace;

use crate::error::{Result, SolverError};

fn strict_lower_triangle_is_zero(m: &[Vec<f64>], n: usize) -> bool {
    for row in 1..n {
        for col in 0..row {
            if m[row][col] != 0.0 {
                return false;
            }
        }
    }
    true
}

/// Solve the dense augmented system `matrix` (`n` rows of `n + 1`
/// columns, the last column being the right-hand side) in place.
///
/// Returns the solution vector indexed the same way as the matrix's
/// columns. `matrix` is consumed and may be mutated freely by the caller's
/// copy since elimination happens on an owned clone.
pub fn solve_augmented(matrix: &[Vec<f64>]) -> Result<Vec<f64>> {
    let n = matrix.len();
    for (row, cols) in matrix.iter().enumerate() {
        if cols.len() != n + 1 {
            return Err(SolverError::DimensionMismatch {
                row,
                expected: n + 1,
                actual: cols.len(),
            });
        }
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut m: Vec<Vec<f64>> = matrix.to_vec();
    let mut swap_count = 0usize;

    for i in 0..n {
        if strict_lower_triangle_is_zero(&m, n) {
            trace!("gauss: lower triangle already zero at row {i}, stopping forward pass");
            break;
        }

        if m[i][i] == 0.0 {
            let pivot_row = (i + 1..n)
                .find(|&r| m[r][i] != 0.0)
                .ok_or(SolverError::Singular { column: i })?;
            m.swap(i, pivot_row);
            swap_count += 1;
        }

        let pivot = m[i][i];
        for row in (i + 1)..n {
            let factor = m[row][i] / pivot;
            if factor == 0.0 {
                continue;
            }
            for col in i..=n {
                m[row][col] -= factor * m[i][col];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let dot: f64 = (0..n).map(|j| x[j] * m[i][j]).sum();
        let mut value = (m[i][n] - dot) / m[i][i];
        if value.is_nan() {
            value = 1.0;
        }
        x[i] = value;
    }

    trace!("gauss: forward pass made {swap_count} row swaps");
    Ok(x)
}

/// Solve `a · x = b` by building the augmented matrix and deferring to
/// [`solve_augmented`].
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = a.len();
    if b.len() != n {
        return Err(SolverError::DimensionMismatch {
            row: n,
            expected: n,
            actual: b.len(),
        });
    }
    let augmented: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();
    solve_augmented(&augmented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_sanity_check() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let b = vec![5.0, 10.0];
        let x = solve(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-9);
        assert!((x[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn solves_simple_diagonal_system() {
        let a = vec![vec![2.0, 0.0], vec![0.0, 4.0]];
        let b = vec![10.0, 20.0];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x, vec![5.0, 5.0]);
    }

    #[test]
    fn requires_a_row_swap_for_a_zero_diagonal_pivot() {
        // Row 0 has a zero in column 0; row 1 supplies the pivot.
        let a = vec![vec![0.0, 1.0], vec![1.0, 1.0]];
        let b = vec![5.0, 8.0];
        // x1 = 5, x0 + x1 = 8 => x0 = 3
        let x = solve(&a, &b).unwrap();
        assert_eq!(x, vec![3.0, 5.0]);
    }

    #[test]
    fn solves_voltage_divider_sized_system() {
        // e_a = 6, -1*i_v1 + g1*(e_a - e_b) = 0 style 3x3 system, hand
        // picked so the answer is easy to check: x = [6, 2, -4].
        let a = vec![
            vec![1.0, 0.0, 0.0],
            vec![1.0, -1.0, 0.0],
            vec![0.0, 1.0, 1.0],
        ];
        let b = vec![6.0, 4.0, -2.0];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x, vec![6.0, 2.0, -4.0]);
    }

    #[test]
    fn singular_column_without_any_nonzero_pivot_is_an_error() {
        let a = vec![vec![0.0, 1.0], vec![0.0, 1.0]];
        let b = vec![1.0, 1.0];
        let err = solve(&a, &b).unwrap_err();
        assert_eq!(err, SolverError::Singular { column: 0 });
    }

    #[test]
    fn multiple_row_swaps_still_land_each_value_on_its_own_column() {
        // The assembled system for a 6V source across a 1k/2k divider,
        // ordered [e_0, e_a, e_b, i_v1], requires two row swaps during
        // forward elimination. Node 0 is grounded, a sits at the source,
        // b is the tap.
        let g1 = 1.0 / 1000.0;
        let g2 = 1.0 / 2000.0;
        let a = vec![
            vec![0.0, g1, -g1, 1.0],
            vec![-g2, -g1, g1 + g2, 0.0],
            vec![-1.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ];
        let b = vec![0.0, 0.0, 6.0, 0.0];
        let x = solve(&a, &b).unwrap();
        assert!((x[0] - 0.0).abs() < 1e-9, "e_0 should stay grounded: {x:?}");
        assert!((x[1] - 6.0).abs() < 1e-9, "e_a should be 6V: {x:?}");
        assert!((x[2] - 4.0).abs() < 1e-9, "e_b should be 4V: {x:?}");
        assert!((x[3] - (-0.002)).abs() < 1e-9, "i_v1 should be -2mA: {x:?}");
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let b = vec![1.0];
        assert!(matches!(
            solve(&a, &b),
            Err(SolverError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn indeterminate_free_variable_defaults_to_one() {
        // Row 1 becomes entirely zero after elimination (0 = 0): x1 is free,
        // and the NaN fallback pins it to 1.
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let b = vec![5.0, 5.0];
        let x = solve(&a, &b).unwrap();
        assert_eq!(x[1], 1.0);
        assert_eq!(x[0], 4.0);
    }
}
