use itertools::Itertools;
use jamrisk_core::{config::FactorParameters, model::FeatureMatrix, table::DataTable};

use crate::{
    adequacy::AdequacyDiagnostics,
    correlation, eigen_ops, extraction,
    factor_model::{align_loadings, FactorModel},
    rotation, FactorError, FactorWarning,
};

/// selects the configured features from the table and fits a factor model.
pub fn fit_table(table: &DataTable, params: &FactorParameters) -> Result<FactorModel, FactorError> {
    let matrix = FeatureMatrix::from_table(table, params.features.as_deref())?;
    fit(&matrix, params)
}

/// fits an exploratory factor model to the feature matrix.
///
/// the features are standardized and their correlation matrix checked for
/// sampling adequacy (KMO, Bartlett). the factor count follows the Kaiser
/// criterion, factors are extracted with the configured method and rotated,
/// then sign-aligned and ordered by explained variance. the result depends
/// only on the matrix and the parameters.
pub fn fit(matrix: &FeatureMatrix, params: &FactorParameters) -> Result<FactorModel, FactorError> {
    let z = correlation::standardize(matrix)?;
    let r = correlation::correlation_matrix(&z);
    let n = matrix.n_rows();
    let p = matrix.n_features();
    log::info!("fitting factor model on {n} observations of {p} features");

    let mut warnings = vec![];
    let adequacy = AdequacyDiagnostics::new(&r, n, params.min_kmo, params.bartlett_alpha)?;
    log::info!(
        "sampling adequacy: KMO={:.4}, Bartlett chi2={:.2} (df={}, p={:.4e})",
        adequacy.kmo,
        adequacy.bartlett_chi_square,
        adequacy.bartlett_df,
        adequacy.bartlett_p_value
    );
    if !adequacy.is_adequate() {
        if !params.proceed_on_inadequate {
            return Err(FactorError::InadequateData {
                kmo: adequacy.kmo,
                bartlett_p_value: adequacy.bartlett_p_value,
            });
        }
        let warning = FactorWarning::InadequateData {
            kmo: adequacy.kmo,
            bartlett_p_value: adequacy.bartlett_p_value,
        };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    let (eigenvalues, _) = eigen_ops::sorted_eigen(&r);
    let (n_factors, degenerate) = retained_factor_count(&eigenvalues, params);
    if let Some(warning) = degenerate {
        log::warn!("{warning}");
        warnings.push(warning);
    }
    log::info!(
        "retaining {n_factors} factors, eigenvalues: [{}]",
        eigenvalues.iter().map(|v| format!("{v:.3}")).join(", ")
    );

    let extracted = extraction::extract(&r, n_factors, params)?;
    if !extracted.converged {
        warnings.push(not_converged(
            format!("{:?} extraction", params.extraction_method),
            extracted.iterations,
        ));
    }
    if !extracted.heywood.is_empty() {
        let features = extracted
            .heywood
            .iter()
            .map(|i| matrix.names()[*i].clone())
            .collect_vec();
        let warning = FactorWarning::HeywoodCase { features };
        log::warn!("{warning}");
        warnings.push(warning);
    }

    let rotated = rotation::rotate(
        &extracted.loadings,
        params.rotation_method,
        params.max_iterations,
        params.tolerance,
    )?;
    if !rotated.converged {
        warnings.push(not_converged(
            format!("{:?} rotation", params.rotation_method),
            rotated.iterations,
        ));
    }

    let aligned = align_loadings(&rotated.loadings);
    let uniquenesses = aligned.communalities.iter().map(|h| 1.0 - h).collect_vec();
    let proportion_variance = aligned
        .ss_loadings
        .iter()
        .map(|ss| ss / p as f64)
        .collect_vec();
    let cumulative_variance = proportion_variance
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect_vec();

    Ok(FactorModel {
        features: matrix.names().to_vec(),
        n_factors,
        loadings: aligned.loadings,
        communalities: aligned.communalities,
        uniquenesses,
        ss_loadings: aligned.ss_loadings,
        proportion_variance,
        cumulative_variance,
        eigenvalues,
        adequacy,
        extraction_method: params.extraction_method,
        rotation_method: params.rotation_method,
        extraction_iterations: extracted.iterations,
        rotation_iterations: rotated.iterations,
        n_observations: n,
        dropped_rows: matrix.dropped_rows(),
        warnings,
    })
}

/// number of eigenvalues above the Kaiser threshold, capped by
/// `max_factors`. when none qualifies one factor is retained with a warning.
pub fn retained_factor_count(
    eigenvalues: &[f64],
    params: &FactorParameters,
) -> (usize, Option<FactorWarning>) {
    let above = eigenvalues
        .iter()
        .filter(|v| **v > params.kaiser_threshold)
        .count();
    let capped = match params.max_factors {
        Some(max) => above.min(max),
        None => above,
    };
    if capped == 0 {
        let warning = FactorWarning::DegenerateFactorCount {
            kaiser_threshold: params.kaiser_threshold,
            largest_eigenvalue: eigenvalues.first().copied().unwrap_or_default(),
        };
        (1, Some(warning))
    } else {
        (capped, None)
    }
}

fn not_converged(stage: String, iterations: usize) -> FactorWarning {
    let warning = FactorWarning::NotConverged { stage, iterations };
    log::warn!("{warning}");
    warning
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use jamrisk_core::config::{ExtractionMethod, RotationMethod};

    fn two_factor_matrix() -> FeatureMatrix {
        let features = [
            (0, 0.85),
            (0, 0.8),
            (0, 0.75),
            (0, 0.8),
            (1, 0.85),
            (1, 0.8),
            (1, 0.75),
            (1, 0.8),
        ];
        test_utils::latent_matrix(1000, 2, &features, 11)
    }

    fn assert_valid_model(model: &FactorModel) {
        for row in model.loadings.iter() {
            assert_eq!(row.len(), model.n_factors);
            assert!(row.iter().all(|l| (-1.0..=1.0).contains(l)));
        }
        assert!(model.ss_loadings.iter().all(|ss| *ss >= 0.0));
        assert!(model
            .communalities
            .iter()
            .all(|h| (0.0..=1.0).contains(h)));
        assert!(model
            .eigenvalues
            .iter()
            .tuple_windows()
            .all(|(a, b)| a >= b));
        assert_eq!(model.eigenvalues.len(), model.n_features());
    }

    #[test]
    fn test_correlated_columns_pass_adequacy() {
        let matrix = test_utils::single_factor_matrix(1000, &[0.975, 0.975, 0.8, 0.8, 0.7], 42);
        let model = fit(&matrix, &FactorParameters::default()).expect("data is adequate");
        assert!(model.adequacy.kmo > 0.6);
        assert!(model.adequacy.bartlett_p_value < 0.05);
        assert!(model.n_factors >= 1);
        assert!(
            !model.warnings.iter().any(|w| matches!(
                w,
                FactorWarning::InadequateData { .. } | FactorWarning::DegenerateFactorCount { .. }
            )),
            "{:?}",
            model.warnings
        );
        assert_valid_model(&model);
        let first = model.loading("x0", 0).expect("x0 is a feature");
        assert!(first > 0.9, "x0 loading {first}");
    }

    #[test]
    fn test_independent_noise_is_rejected() {
        let matrix = test_utils::noise_matrix(500, 8, 7);
        let result = fit(&matrix, &FactorParameters::default());
        match result {
            Err(FactorError::InadequateData { kmo, .. }) => assert!(kmo < 0.6),
            other => panic!("expected InadequateData, found {other:?}"),
        }
    }

    #[test]
    fn test_independent_noise_with_override() {
        let matrix = test_utils::noise_matrix(500, 8, 7);
        let params = FactorParameters {
            proceed_on_inadequate: true,
            ..Default::default()
        };
        let model = fit(&matrix, &params).expect("override proceeds");
        assert!(model
            .warnings
            .iter()
            .any(|w| matches!(w, FactorWarning::InadequateData { .. })));
        assert!(model.n_factors >= 1);
        assert_valid_model(&model);
    }

    #[test]
    fn test_two_factor_structure_recovered() {
        let model = fit(&two_factor_matrix(), &FactorParameters::default())
            .expect("two factor data is adequate");
        assert_eq!(model.n_factors, 2);
        assert_valid_model(&model);
        let primary = model
            .loadings
            .iter()
            .map(|row| if row[0] > row[1] { 0 } else { 1 })
            .collect_vec();
        // each block of four features loads on its own factor
        assert!(primary[..4].iter().all_equal());
        assert!(primary[4..].iter().all_equal());
        assert_ne!(primary[0], primary[4]);
        for row in model.loadings.iter() {
            let (big, small) = (row[0].max(row[1]), row[0].min(row[1]));
            assert!(big > 0.6, "primary loading {big}");
            assert!(small.abs() < 0.2, "cross loading {small}");
        }
        assert!(model.cumulative_variance[1] <= 1.0);
        assert!(model.proportion_variance[0] >= model.proportion_variance[1]);
    }

    #[test]
    fn test_maximum_likelihood_extraction() {
        let params = FactorParameters {
            extraction_method: ExtractionMethod::Ml,
            ..Default::default()
        };
        let model = fit(&two_factor_matrix(), &params).expect("two factor data is adequate");
        assert_eq!(model.n_factors, 2);
        assert_eq!(model.extraction_method, ExtractionMethod::Ml);
        assert_valid_model(&model);
        for row in model.loadings.iter() {
            assert!(row[0].max(row[1]) > 0.6);
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let matrix = two_factor_matrix();
        let params = FactorParameters::default();
        let a = fit(&matrix, &params).expect("fit should succeed");
        let b = fit(&matrix, &params).expect("fit should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_unrotated_loadings() {
        let params = FactorParameters {
            rotation_method: RotationMethod::None,
            ..Default::default()
        };
        let unrotated = fit(&two_factor_matrix(), &params).expect("fit should succeed");
        let rotated =
            fit(&two_factor_matrix(), &FactorParameters::default()).expect("fit should succeed");
        assert_eq!(unrotated.rotation_iterations, 0);
        assert_eq!(unrotated.rotation_method, RotationMethod::None);
        for (a, b) in unrotated.communalities.iter().zip(rotated.communalities.iter()) {
            assert!((a - b).abs() < 1e-9, "communality {a} vs {b}");
        }
    }

    #[test]
    fn test_quartimax_rotation() {
        let params = FactorParameters {
            rotation_method: RotationMethod::Quartimax,
            ..Default::default()
        };
        let quartimax = fit(&two_factor_matrix(), &params).expect("fit should succeed");
        let varimax =
            fit(&two_factor_matrix(), &FactorParameters::default()).expect("fit should succeed");
        assert_eq!(quartimax.rotation_method, RotationMethod::Quartimax);
        assert_eq!(quartimax.n_factors, 2);
        assert_valid_model(&quartimax);
        for (a, b) in quartimax.communalities.iter().zip(varimax.communalities.iter()) {
            assert!((a - b).abs() < 1e-9, "communality {a} vs {b}");
        }
    }

    #[test]
    fn test_degenerate_factor_count() {
        let eigenvalues = [0.9, 0.8, 0.7];
        let params = FactorParameters::default();
        let (k, warning) = retained_factor_count(&eigenvalues, &params);
        assert_eq!(k, 1);
        assert!(matches!(
            warning,
            Some(FactorWarning::DegenerateFactorCount { .. })
        ));

        let model = fit(
            &two_factor_matrix(),
            &FactorParameters {
                kaiser_threshold: 100.0,
                ..Default::default()
            },
        )
        .expect("fit should succeed");
        assert_eq!(model.n_factors, 1);
        assert!(model
            .warnings
            .iter()
            .any(|w| matches!(w, FactorWarning::DegenerateFactorCount { .. })));
    }

    #[test]
    fn test_max_factors_cap() {
        let eigenvalues = [3.0, 2.0, 1.5, 0.5];
        let params = FactorParameters {
            max_factors: Some(2),
            ..Default::default()
        };
        assert_eq!(retained_factor_count(&eigenvalues, &params), (2, None));
    }

    #[test]
    fn test_scree_rows() {
        let model = fit(&two_factor_matrix(), &FactorParameters::default())
            .expect("fit should succeed");
        let scree = model.scree_rows();
        assert_eq!(scree.len(), 8);
        assert_eq!(scree[0].component, 1);
        let last = scree.last().expect("scree is non-empty");
        assert!((last.cumulative - 1.0).abs() < 1e-9);
    }
}
