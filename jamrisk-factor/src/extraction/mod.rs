mod maximum_likelihood;
mod principal_axis;

use jamrisk_core::config::{ExtractionMethod, FactorParameters};
use nalgebra::DMatrix;

pub use maximum_likelihood::maximum_likelihood;
pub use principal_axis::principal_axis;

use crate::FactorError;

/// unrotated loadings produced by a factor extraction method.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// features × factors
    pub loadings: DMatrix<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// feature indices whose communality was capped at 1 or whose uniqueness
    /// reached its lower bound
    pub heywood: Vec<usize>,
}

/// extracts `n_factors` factors from the correlation matrix `r` with the
/// configured method.
pub fn extract(
    r: &DMatrix<f64>,
    n_factors: usize,
    params: &FactorParameters,
) -> Result<Extraction, FactorError> {
    if n_factors == 0 || n_factors > r.nrows() {
        return Err(FactorError::InvalidConfiguration(format!(
            "cannot extract {n_factors} factors from {} features",
            r.nrows()
        )));
    }
    match params.extraction_method {
        ExtractionMethod::PrincipalAxis => {
            principal_axis(r, n_factors, params.max_iterations, params.tolerance)
        }
        ExtractionMethod::Ml => {
            maximum_likelihood(r, n_factors, params.max_iterations, params.tolerance)
        }
    }
}

/// loadings `V_k · diag(sqrt(max(λ_k, 0)))` from the leading eigenpairs.
fn scaled_eigenvectors(values: &[f64], vectors: &DMatrix<f64>, n_factors: usize) -> DMatrix<f64> {
    let mut loadings = vectors.columns(0, n_factors).into_owned();
    for (j, mut col) in loadings.column_iter_mut().enumerate() {
        col *= values[j].max(0.0).sqrt();
    }
    loadings
}

/// caps each row's communality at 1 by rescaling the row. returns the rows
/// that were capped.
fn cap_communalities(loadings: &mut DMatrix<f64>) -> Vec<usize> {
    let mut capped = vec![];
    for (i, mut row) in loadings.row_iter_mut().enumerate() {
        let h = row.norm_squared();
        if h > 1.0 {
            row /= h.sqrt();
            capped.push(i);
        }
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_communalities() {
        let mut loadings = DMatrix::from_row_slice(2, 2, &[0.9, 0.8, 0.6, 0.3]);
        let capped = cap_communalities(&mut loadings);
        assert_eq!(capped, vec![0]);
        assert!((loadings.row(0).norm_squared() - 1.0).abs() < 1e-12);
        assert_eq!(loadings[(1, 0)], 0.6);
    }

    #[test]
    fn test_factor_count_bounds() {
        let r = DMatrix::identity(3, 3);
        let params = FactorParameters::default();
        assert!(matches!(
            extract(&r, 0, &params),
            Err(FactorError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            extract(&r, 4, &params),
            Err(FactorError::InvalidConfiguration(_))
        ));
    }
}
