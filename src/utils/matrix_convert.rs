//! Matrix conversion utilities.
//!
//! Arrays flow through the crate as `ndarray` values; dense solves (least
//! squares, Cholesky, SVD) are done with `nalgebra`. These helpers copy between
//! the two representations.

use crate::error::Result;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Convert an ndarray Array2 to a nalgebra DMatrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> Result<DMatrix<f64>> {
    let (rows, cols) = arr.dim();
    // ndarray is row-major by default, nalgebra is column-major
    Ok(DMatrix::from_fn(rows, cols, |i, j| arr[[i, j]]))
}

/// Convert an ndarray Array1 to a nalgebra DVector.
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> Result<DVector<f64>> {
    Ok(DVector::from_iterator(arr.len(), arr.iter().copied()))
}

/// Convert a nalgebra DVector to an ndarray Array1.
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Result<Array1<f64>> {
    Ok(Array1::from_iter(vec.iter().copied()))
}
