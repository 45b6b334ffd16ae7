use itertools::Itertools;
use nalgebra::DMatrix;

use super::{cap_communalities, scaled_eigenvectors, Extraction};
use crate::{eigen_ops, FactorError};

/// lower bound on uniquenesses during the fixed-point iteration
const MIN_UNIQUENESS: f64 = 0.005;

/// maximum likelihood factor extraction by fixed-point iteration on the
/// uniquenesses Ψ.
///
/// each iteration takes the leading eigenpairs (λ, V) of `Ψ^-1/2 R Ψ^-1/2`,
/// sets `Λ = Ψ^1/2 V diag(sqrt(max(λ - 1, 0)))` and `Ψ = diag(R - ΛΛᵀ)`,
/// until the largest change in Ψ falls below `tolerance`. uniquenesses start
/// at `1 - SMC` and are kept within [0.005, 1]. features whose uniqueness
/// ends on the lower bound are reported as Heywood cases.
pub fn maximum_likelihood(
    r: &DMatrix<f64>,
    n_factors: usize,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Extraction, FactorError> {
    let p = r.nrows();
    let r_inv = eigen_ops::inverse(r)?;
    let mut psi = eigen_ops::squared_multiple_correlations(&r_inv)
        .iter()
        .map(|smc| (1.0 - smc).clamp(MIN_UNIQUENESS, 1.0))
        .collect_vec();
    let mut loadings = DMatrix::zeros(p, n_factors);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iterations {
        iterations += 1;
        loadings = ml_loadings(r, &psi, n_factors);
        let updated = loadings
            .row_iter()
            .map(|row| (1.0 - row.norm_squared()).clamp(MIN_UNIQUENESS, 1.0))
            .collect_vec();
        let delta = updated
            .iter()
            .zip(psi.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        log::debug!("maximum likelihood iteration {iterations}: max uniqueness change {delta:.3e}");
        psi = updated;
        if delta < tolerance {
            converged = true;
            break;
        }
    }
    if converged {
        loadings = ml_loadings(r, &psi, n_factors);
    }
    let heywood = cap_communalities(&mut loadings)
        .into_iter()
        .chain(
            psi.iter()
                .positions(|uniqueness| *uniqueness <= MIN_UNIQUENESS),
        )
        .sorted()
        .dedup()
        .collect_vec();

    Ok(Extraction {
        loadings,
        iterations,
        converged,
        heywood,
    })
}

fn ml_loadings(r: &DMatrix<f64>, psi: &[f64], n_factors: usize) -> DMatrix<f64> {
    let sqrt_psi = psi.iter().map(|v| v.sqrt()).collect_vec();
    let scaled = DMatrix::from_fn(r.nrows(), r.ncols(), |i, j| {
        r[(i, j)] / (sqrt_psi[i] * sqrt_psi[j])
    });
    let (values, vectors) = eigen_ops::sorted_eigen(&scaled);
    let excess = values.iter().map(|v| v - 1.0).collect_vec();
    let mut loadings = scaled_eigenvectors(&excess, &vectors, n_factors);
    for (i, mut row) in loadings.row_iter_mut().enumerate() {
        row *= sqrt_psi[i];
    }
    loadings
}
