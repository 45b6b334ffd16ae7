use std::cmp::Reverse;

use itertools::Itertools;
use nalgebra::{DMatrix, SymmetricEigen};
use ordered_float::OrderedFloat;

use crate::FactorError;

/// eigen decomposition of a symmetric matrix with eigenvalues in descending
/// order. column `j` of the returned matrix is the eigenvector of eigenvalue
/// `j`, with its largest-magnitude component positive.
pub fn sorted_eigen(m: &DMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let eigen = SymmetricEigen::new(m.clone());
    let order = (0..eigen.eigenvalues.len())
        .sorted_by_key(|i| Reverse(OrderedFloat(eigen.eigenvalues[*i])))
        .collect_vec();
    let values = order.iter().map(|i| eigen.eigenvalues[*i]).collect_vec();
    let mut vectors = eigen.eigenvectors.select_columns(order.iter());
    for mut col in vectors.column_iter_mut() {
        let pivot = col
            .iter()
            .copied()
            .max_by_key(|v| OrderedFloat(v.abs()))
            .unwrap_or_default();
        if pivot < 0.0 {
            col.neg_mut();
        }
    }
    (values, vectors)
}

pub fn inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>, FactorError> {
    m.clone().try_inverse().ok_or_else(|| {
        FactorError::SingularMatrix(String::from(
            "matrix is not invertible, features may be linearly dependent",
        ))
    })
}

/// squared multiple correlation of each variable with all others,
/// `1 - 1/diag(R⁻¹)`.
pub fn squared_multiple_correlations(r_inv: &DMatrix<f64>) -> Vec<f64> {
    r_inv
        .diagonal()
        .iter()
        .map(|d| (1.0 - 1.0 / d).clamp(0.0, 1.0))
        .collect_vec()
}
