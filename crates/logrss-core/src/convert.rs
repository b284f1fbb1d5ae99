// =============================================================================
// Bridging ndarray and nalgebra
// =============================================================================
//
// Arrays live in ndarray (data columns, design matrices, log-RSS vectors).
// Factorizations live in nalgebra. These helpers are the only place the two
// meet, so the solvers never loop element-by-element themselves.
//
// =============================================================================

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};

/// Design matrix (or any Array2) as a DMatrix.
#[inline]
pub fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Working response (or any Array1) as a DVector.
#[inline]
pub fn to_dvector(v: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(v.len(), v.iter().copied())
}

/// Back from DMatrix, e.g. for the covariance.
#[inline]
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn(m.shape(), |(i, j)| m[(i, j)])
}

/// Back from DVector, e.g. for the coefficients.
#[inline]
pub fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    v.iter().copied().collect()
}

/// Solve the normal equations Ax = b, returning x together with A⁻¹.
///
/// The WLS step needs both: the solution gives the coefficients, the inverse
/// gives the unscaled covariance (X'WX)⁻¹. Returns None if A is singular.
pub fn solve_and_invert(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<(Array1<f64>, Array2<f64>)> {
    let p = a.nrows();
    let (beta, inverse) = match a.clone().cholesky() {
        Some(chol) => (chol.solve(b), chol.solve(&DMatrix::identity(p, p))),
        // X'WX not positive definite: LU
        None => {
            let lu = a.clone().lu();
            (lu.solve(b)?, lu.try_inverse()?)
        }
    };
    Some((to_array1(&beta), to_array2(&inverse)))
}

/// Quadratic form dᵀ A d.
///
/// Used for the variance of a linear combination of coefficients.
pub fn quadratic_form(a: &Array2<f64>, d: ArrayView1<'_, f64>) -> f64 {
    d.dot(&a.dot(&d))
}
