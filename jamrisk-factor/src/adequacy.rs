use itertools::Itertools;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{eigen_ops, FactorError};

/// sampling adequacy and sphericity diagnostics of a correlation matrix.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdequacyDiagnostics {
    /// overall Kaiser-Meyer-Olkin measure
    pub kmo: f64,
    /// per-variable measure of sampling adequacy
    pub msa: Vec<f64>,
    pub bartlett_chi_square: f64,
    pub bartlett_df: usize,
    pub bartlett_p_value: f64,
    pub n_observations: usize,
    /// minimum acceptable KMO used to judge adequacy
    pub min_kmo: f64,
    /// significance level used to judge the Bartlett test
    pub bartlett_alpha: f64,
}

impl AdequacyDiagnostics {
    /// computes both the KMO measure and Bartlett's test for the correlation
    /// matrix `r` of `n` observations.
    pub fn new(
        r: &DMatrix<f64>,
        n: usize,
        min_kmo: f64,
        bartlett_alpha: f64,
    ) -> Result<AdequacyDiagnostics, FactorError> {
        let (kmo, msa) = kaiser_meyer_olkin(r)?;
        let (chi_square, df, p_value) = bartlett_sphericity(r, n)?;
        Ok(AdequacyDiagnostics {
            kmo,
            msa,
            bartlett_chi_square: chi_square,
            bartlett_df: df,
            bartlett_p_value: p_value,
            n_observations: n,
            min_kmo,
            bartlett_alpha,
        })
    }

    /// true when KMO reaches `min_kmo` and Bartlett's test is significant.
    pub fn is_adequate(&self) -> bool {
        self.kmo >= self.min_kmo && self.bartlett_p_value < self.bartlett_alpha
    }
}

/// Kaiser-Meyer-Olkin measure of sampling adequacy.
///
/// with `a_ij = -R⁻¹_ij / sqrt(R⁻¹_ii R⁻¹_jj)` the anti-image (partial)
/// correlations, summing over off-diagonal entries:
///
///   KMO   = Σ r² / (Σ r² + Σ a²)
///   MSA_j = Σ_i r_ij² / (Σ_i r_ij² + Σ_i a_ij²)
pub fn kaiser_meyer_olkin(r: &DMatrix<f64>) -> Result<(f64, Vec<f64>), FactorError> {
    let inv = eigen_ops::inverse(r)?;
    let p = r.nrows();
    let mut r2_by_var = vec![0.0; p];
    let mut a2_by_var = vec![0.0; p];
    for (i, j) in (0..p).tuple_combinations() {
        let r2 = r[(i, j)].powi(2);
        let a = -inv[(i, j)] / (inv[(i, i)] * inv[(j, j)]).sqrt();
        let a2 = a.powi(2);
        r2_by_var[i] += r2;
        r2_by_var[j] += r2;
        a2_by_var[i] += a2;
        a2_by_var[j] += a2;
    }
    let ratio = |r2: f64, a2: f64| if r2 + a2 > 0.0 { r2 / (r2 + a2) } else { 0.0 };
    let msa = r2_by_var
        .iter()
        .zip(a2_by_var.iter())
        .map(|(r2, a2)| ratio(*r2, *a2))
        .collect_vec();
    let kmo = ratio(r2_by_var.iter().sum(), a2_by_var.iter().sum());
    Ok((kmo, msa))
}

/// Bartlett's test of sphericity of a `p × p` correlation matrix of `n`
/// observations. returns the statistic, degrees of freedom and p-value:
///
///   χ² = -(n - 1 - (2p + 5) / 6) · ln|R|,   df = p(p - 1) / 2
pub fn bartlett_sphericity(r: &DMatrix<f64>, n: usize) -> Result<(f64, usize, f64), FactorError> {
    let p = r.nrows();
    let cholesky = r.clone().cholesky().ok_or_else(|| {
        FactorError::SingularMatrix(String::from(
            "correlation matrix is not positive definite, features may be linearly dependent",
        ))
    })?;
    let ln_det = 2.0 * cholesky.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
    let chi_square = (-(n as f64 - 1.0 - (2.0 * p as f64 + 5.0) / 6.0) * ln_det).max(0.0);
    let df = p * (p - 1) / 2;
    let dist = ChiSquared::new(df as f64).map_err(|e| {
        FactorError::InvalidConfiguration(format!(
            "cannot build chi-squared distribution with {df} degrees of freedom: {e}"
        ))
    })?;
    let p_value = dist.sf(chi_square);
    Ok((chi_square, df, p_value))
}
