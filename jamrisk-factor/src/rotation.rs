use itertools::Itertools;
use jamrisk_core::config::RotationMethod;
use nalgebra::DMatrix;

use crate::FactorError;

/// loadings after an orthogonal rotation.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub loadings: DMatrix<f64>,
    /// orthogonal k × k matrix such that `rotated = unrotated · rotation`
    pub rotation: DMatrix<f64>,
    pub iterations: usize,
    pub converged: bool,
}

pub fn rotate(
    loadings: &DMatrix<f64>,
    method: RotationMethod,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Rotation, FactorError> {
    match method {
        RotationMethod::Varimax => varimax(loadings, max_iterations, tolerance),
        RotationMethod::Quartimax => quartimax(loadings, max_iterations, tolerance),
        RotationMethod::None => Ok(Rotation::identity(loadings)),
    }
}

impl Rotation {
    fn identity(loadings: &DMatrix<f64>) -> Rotation {
        Rotation {
            loadings: loadings.clone(),
            rotation: DMatrix::identity(loadings.ncols(), loadings.ncols()),
            iterations: 0,
            converged: true,
        }
    }
}

/// halvings of the step length tried before a step is abandoned
const MAX_STEP_HALVINGS: usize = 20;

/// Kaiser-normalized varimax rotation, maximizing the variance of the
/// squared loadings within each factor.
pub fn varimax(
    loadings: &DMatrix<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Rotation, FactorError> {
    gradient_projection(loadings, Criterion::Varimax, max_iterations, tolerance)
}

/// Kaiser-normalized quartimax rotation, maximizing the variance of the
/// squared loadings within each feature.
pub fn quartimax(
    loadings: &DMatrix<f64>,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Rotation, FactorError> {
    gradient_projection(loadings, Criterion::Quartimax, max_iterations, tolerance)
}

#[derive(Debug, Clone, Copy)]
enum Criterion {
    Varimax,
    Quartimax,
}

impl Criterion {
    /// value and gradient of the negated criterion at the loadings `b`.
    fn evaluate(&self, b: &DMatrix<f64>) -> (f64, DMatrix<f64>) {
        let (p, k) = b.shape();
        let fourth = b.iter().map(|v| v.powi(4)).sum::<f64>();
        match self {
            Criterion::Quartimax => (-fourth / 4.0, b.map(|v| -v.powi(3))),
            Criterion::Varimax => {
                let column_ss = b.row_iter().fold(vec![0.0; k], |mut acc, row| {
                    for (j, v) in row.iter().enumerate() {
                        acc[j] += v * v;
                    }
                    acc
                });
                let spread = column_ss.iter().map(|ss| ss * ss).sum::<f64>() / p as f64;
                let gradient = DMatrix::from_fn(p, k, |i, j| {
                    b[(i, j)] * column_ss[j] / p as f64 - b[(i, j)].powi(3)
                });
                (-(fourth - spread) / 4.0, gradient)
            }
        }
    }
}

/// orthogonal rotation by gradient projection.
///
/// rows are scaled to unit communality. each iteration projects the
/// criterion gradient `G = Aᵀ dQ/dB` onto the tangent space of the
/// orthogonal group at `T`, steps against it and maps back with the polar
/// factor of the result. the step is halved until the criterion decreases
/// by at least half the squared gradient norm times the step. stops when the
/// projected gradient norm falls below `tolerance`, or when no step decreases
/// the criterion any further.
fn gradient_projection(
    loadings: &DMatrix<f64>,
    criterion: Criterion,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Rotation, FactorError> {
    let (p, k) = loadings.shape();
    if k < 2 {
        return Ok(Rotation::identity(loadings));
    }

    let norms = loadings.row_iter().map(|row| row.norm()).collect_vec();
    let normalized = DMatrix::from_fn(p, k, |i, j| {
        if norms[i] > 0.0 {
            loadings[(i, j)] / norms[i]
        } else {
            0.0
        }
    });

    let mut rotation = DMatrix::<f64>::identity(k, k);
    let (mut value, initial_gradient) = criterion.evaluate(&normalized);
    let mut gradient = normalized.tr_mul(&initial_gradient);
    let mut step = 1.0;
    let mut converged = false;
    let mut iterations = 0;
    loop {
        let m = rotation.tr_mul(&gradient);
        let symmetric = (&m + m.transpose()) * 0.5;
        let projected = &gradient - &rotation * symmetric;
        let gradient_norm = projected.norm();
        log::debug!(
            "{criterion:?} iteration {iterations}: criterion {:.8}, projected gradient {gradient_norm:.3e}",
            -value
        );
        if gradient_norm < tolerance {
            converged = true;
            break;
        }
        if iterations == max_iterations {
            break;
        }
        iterations += 1;

        step *= 2.0;
        let mut accepted = None;
        for _ in 0..MAX_STEP_HALVINGS {
            let candidate = polar_factor(&rotation - &projected * step)?;
            let (candidate_value, candidate_gradient) =
                criterion.evaluate(&(&normalized * &candidate));
            if candidate_value < value - 0.5 * gradient_norm * gradient_norm * step {
                accepted = Some((candidate, candidate_value, candidate_gradient));
                break;
            }
            step /= 2.0;
        }
        match accepted {
            Some((candidate, candidate_value, candidate_gradient)) => {
                rotation = candidate;
                value = candidate_value;
                gradient = normalized.tr_mul(&candidate_gradient);
            }
            // stationary up to rounding
            None => {
                converged = true;
                break;
            }
        }
    }

    let mut rotated = &normalized * &rotation;
    for (i, mut row) in rotated.row_iter_mut().enumerate() {
        row *= norms[i];
    }
    Ok(Rotation {
        loadings: rotated,
        rotation,
        iterations,
        converged,
    })
}

/// the orthogonal factor `U Vᵀ` of `m = U S Vᵀ`.
fn polar_factor(m: DMatrix<f64>) -> Result<DMatrix<f64>, FactorError> {
    let svd = m.svd(true, true);
    match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => Ok(u * v_t),
        _ => Err(FactorError::SingularMatrix(String::from(
            "singular value decomposition failed during factor rotation",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_structure() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            6,
            2,
            &[0.8, 0.0, 0.75, 0.0, 0.7, 0.0, 0.0, 0.8, 0.0, 0.75, 0.0, 0.7],
        )
    }

    fn rotated_by(loadings: &DMatrix<f64>, angle: f64) -> DMatrix<f64> {
        let (s, c) = angle.sin_cos();
        let t = DMatrix::from_row_slice(2, 2, &[c, -s, s, c]);
        loadings * t
    }

    #[test]
    fn test_recovers_simple_structure() {
        let mixed = rotated_by(&simple_structure(), 0.5);
        let result = varimax(&mixed, 500, 1e-8).expect("rotation should succeed");
        assert!(result.converged);
        for row in result.loadings.row_iter() {
            let (big, small) = if row[0].abs() > row[1].abs() {
                (row[0].abs(), row[1].abs())
            } else {
                (row[1].abs(), row[0].abs())
            };
            assert!(big > 0.65, "row {row:?} lost its primary loading");
            assert!(small < 1e-3, "row {row:?} has a cross loading");
        }
    }

    #[test]
    fn test_rotation_preserves_communalities() {
        let mixed = rotated_by(&simple_structure(), 0.3);
        let result = varimax(&mixed, 500, 1e-8).expect("rotation should succeed");
        for (before, after) in mixed.row_iter().zip(result.loadings.row_iter()) {
            assert!((before.norm_squared() - after.norm_squared()).abs() < 1e-10);
        }
        let identity = result.rotation.tr_mul(&result.rotation);
        assert!((identity - DMatrix::<f64>::identity(2, 2)).abs().max() < 1e-10);
    }

    #[test]
    fn test_quartimax_recovers_simple_structure() {
        let mixed = rotated_by(&simple_structure(), 0.5);
        let result = rotate(&mixed, RotationMethod::Quartimax, 500, 1e-8)
            .expect("rotation should succeed");
        assert!(result.converged);
        for row in result.loadings.row_iter() {
            let (big, small) = (row[0].abs().max(row[1].abs()), row[0].abs().min(row[1].abs()));
            assert!(big > 0.65, "row {row:?} lost its primary loading");
            assert!(small < 1e-3, "row {row:?} has a cross loading");
        }
    }

    #[test]
    fn test_quartimax_preserves_communalities() {
        let mixed = rotated_by(&simple_structure(), 0.3);
        let result = quartimax(&mixed, 500, 1e-8).expect("rotation should succeed");
        for (before, after) in mixed.row_iter().zip(result.loadings.row_iter()) {
            assert!((before.norm_squared() - after.norm_squared()).abs() < 1e-10);
        }
        let identity = result.rotation.tr_mul(&result.rotation);
        assert!((identity - DMatrix::<f64>::identity(2, 2)).abs().max() < 1e-10);
    }

    #[test]
    fn test_rotation_does_not_lower_criterion() {
        let mixed = rotated_by(&simple_structure(), 0.5);
        for criterion in [Criterion::Varimax, Criterion::Quartimax] {
            let (before, _) = criterion.evaluate(&mixed);
            let result = gradient_projection(&mixed, criterion, 500, 1e-8)
                .expect("rotation should succeed");
            let (after, _) = criterion.evaluate(&result.loadings);
            assert!(after <= before, "{criterion:?}: {after} > {before}");
        }
    }

    #[test]
    fn test_single_factor_unchanged() {
        let loadings = DMatrix::from_column_slice(3, 1, &[0.9, 0.5, 0.4]);
        let result = varimax(&loadings, 500, 1e-8).expect("rotation should succeed");
        assert_eq!(result.loadings, loadings);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_none_is_identity() {
        let mixed = rotated_by(&simple_structure(), 0.5);
        let result = rotate(&mixed, RotationMethod::None, 500, 1e-8).expect("no rotation");
        assert_eq!(result.loadings, mixed);
    }
}
