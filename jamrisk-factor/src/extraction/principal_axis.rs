use itertools::Itertools;
use nalgebra::{DMatrix, DVector};

use super::{cap_communalities, scaled_eigenvectors, Extraction};
use crate::{eigen_ops, FactorError};

/// iterated principal axis factoring.
///
/// communalities start at the squared multiple correlations. each iteration
/// replaces the diagonal of `r` with the current communalities, takes the
/// leading `n_factors` eigenpairs of this reduced matrix as loadings and
/// recomputes communalities from them, until the largest change falls below
/// `tolerance`.
pub fn principal_axis(
    r: &DMatrix<f64>,
    n_factors: usize,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Extraction, FactorError> {
    let r_inv = eigen_ops::inverse(r)?;
    let mut communalities = eigen_ops::squared_multiple_correlations(&r_inv);
    let mut reduced = r.clone();
    let mut loadings = DMatrix::zeros(r.nrows(), n_factors);
    let mut heywood = vec![];
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        reduced.set_diagonal(&DVector::from_vec(communalities.clone()));
        let (values, vectors) = eigen_ops::sorted_eigen(&reduced);
        loadings = scaled_eigenvectors(&values, &vectors, n_factors);
        heywood = cap_communalities(&mut loadings);
        let updated = loadings
            .row_iter()
            .map(|row| row.norm_squared())
            .collect_vec();
        let delta = updated
            .iter()
            .zip(communalities.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        log::debug!("principal axis iteration {iterations}: max communality change {delta:.3e}");
        communalities = updated;
        if delta < tolerance {
            converged = true;
            break;
        }
    }

    Ok(Extraction {
        loadings,
        iterations,
        converged,
        heywood,
    })
}
