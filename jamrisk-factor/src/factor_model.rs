use std::cmp::Reverse;

use itertools::Itertools;
use jamrisk_core::config::{ExtractionMethod, RotationMethod};
use nalgebra::DMatrix;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{adequacy::AdequacyDiagnostics, FactorWarning};

/// a fitted factor model. immutable once produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FactorModel {
    pub features: Vec<String>,
    pub n_factors: usize,
    /// rotated loadings, one row per feature, one entry per factor
    pub loadings: Vec<Vec<f64>>,
    pub communalities: Vec<f64>,
    pub uniquenesses: Vec<f64>,
    /// sum of squared loadings per factor
    pub ss_loadings: Vec<f64>,
    /// share of total variance explained by each factor
    pub proportion_variance: Vec<f64>,
    pub cumulative_variance: Vec<f64>,
    /// eigenvalues of the correlation matrix in descending order
    pub eigenvalues: Vec<f64>,
    pub adequacy: AdequacyDiagnostics,
    pub extraction_method: ExtractionMethod,
    pub rotation_method: RotationMethod,
    pub extraction_iterations: usize,
    pub rotation_iterations: usize,
    /// rows used after dropping incomplete observations
    pub n_observations: usize,
    pub dropped_rows: usize,
    pub warnings: Vec<FactorWarning>,
}

/// one row of the published loadings table.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LoadingRow<'a> {
    pub feature: &'a str,
    pub loadings: &'a [f64],
    pub communality: f64,
    pub uniqueness: f64,
}

/// one row of the scree table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScreeRow {
    /// 1-based component number
    pub component: usize,
    pub eigenvalue: f64,
    pub proportion: f64,
    pub cumulative: f64,
}

/// loadings after sign alignment and factor ordering, with the per-factor
/// and per-feature summaries derived from them.
pub(crate) struct AlignedLoadings {
    pub loadings: Vec<Vec<f64>>,
    pub communalities: Vec<f64>,
    pub ss_loadings: Vec<f64>,
}

/// makes the column sum of every factor non-negative, orders factors by sum
/// of squared loadings (descending) and clips loadings to [-1, 1].
pub(crate) fn align_loadings(loadings: &DMatrix<f64>) -> AlignedLoadings {
    let (p, k) = loadings.shape();
    let mut aligned = loadings.clone();
    for mut col in aligned.column_iter_mut() {
        if col.sum() < 0.0 {
            col.neg_mut();
        }
        col.apply(|v| *v = v.clamp(-1.0, 1.0));
    }
    let order = (0..k)
        .sorted_by_key(|j| Reverse(OrderedFloat(aligned.column(*j).norm_squared())))
        .collect_vec();
    let rows = (0..p)
        .map(|i| order.iter().map(|j| aligned[(i, *j)]).collect_vec())
        .collect_vec();
    let communalities = rows
        .iter()
        .map(|row| row.iter().map(|l| l * l).sum::<f64>().min(1.0))
        .collect_vec();
    let ss_loadings = (0..k)
        .map(|j| rows.iter().map(|row| row[j] * row[j]).sum::<f64>())
        .collect_vec();
    AlignedLoadings {
        loadings: rows,
        communalities,
        ss_loadings,
    }
}

impl FactorModel {
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// loading of a feature on a 0-based factor.
    pub fn loading(&self, feature: &str, factor: usize) -> Option<f64> {
        let row = self.features.iter().position(|f| f == feature)?;
        self.loadings.get(row)?.get(factor).copied()
    }

    /// column names of the loadings table factors, `Factor_1..Factor_k`.
    pub fn factor_names(&self) -> Vec<String> {
        (1..=self.n_factors).map(|j| format!("Factor_{j}")).collect_vec()
    }

    pub fn loading_rows(&self) -> Vec<LoadingRow<'_>> {
        self.features
            .iter()
            .zip(self.loadings.iter())
            .zip(self.communalities.iter().zip(self.uniquenesses.iter()))
            .map(|((feature, loadings), (communality, uniqueness))| LoadingRow {
                feature,
                loadings,
                communality: *communality,
                uniqueness: *uniqueness,
            })
            .collect_vec()
    }

    /// eigenvalue sequence with explained variance shares for a scree plot.
    pub fn scree_rows(&self) -> Vec<ScreeRow> {
        let total = self.eigenvalues.len() as f64;
        self.eigenvalues
            .iter()
            .enumerate()
            .scan(0.0, |cumulative, (i, eigenvalue)| {
                let proportion = eigenvalue / total;
                *cumulative += proportion;
                Some(ScreeRow {
                    component: i + 1,
                    eigenvalue: *eigenvalue,
                    proportion,
                    cumulative: *cumulative,
                })
            })
            .collect_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_orders_and_flips() {
        let loadings = DMatrix::from_row_slice(3, 2, &[0.1, -0.9, 0.2, -0.8, 0.7, -0.1]);
        let aligned = align_loadings(&loadings);
        // second factor is larger and negative, it becomes the positive first
        assert_eq!(aligned.loadings[0], vec![0.9, 0.1]);
        assert_eq!(aligned.loadings[1], vec![0.8, 0.2]);
        assert_eq!(aligned.loadings[2], vec![0.1, 0.7]);
        assert!(aligned.ss_loadings[0] >= aligned.ss_loadings[1]);
        assert!((aligned.communalities[0] - 0.82).abs() < 1e-12);
    }

    #[test]
    fn test_loadings_clipped() {
        let loadings = DMatrix::from_row_slice(3, 1, &[1.0000001, 0.5, 0.4]);
        let aligned = align_loadings(&loadings);
        assert_eq!(aligned.loadings[0][0], 1.0);
        assert_eq!(aligned.communalities[0], 1.0);
    }
}
