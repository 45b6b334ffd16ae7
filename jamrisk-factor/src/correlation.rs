use jamrisk_core::model::FeatureMatrix;
use nalgebra::DMatrix;

use crate::FactorError;

/// minimum number of features for a meaningful factor analysis
pub const MIN_FEATURES: usize = 3;

/// checks the feature matrix and returns its z-scores (population standard
/// deviation), one column per feature.
///
/// fails when there are fewer than [`MIN_FEATURES`] features, no more rows
/// than features, a non-finite value, or a zero-variance column.
pub fn standardize(matrix: &FeatureMatrix) -> Result<DMatrix<f64>, FactorError> {
    let n = matrix.n_rows();
    let p = matrix.n_features();
    if p < MIN_FEATURES {
        return Err(FactorError::MalformedInput(format!(
            "factor analysis requires at least {MIN_FEATURES} features, found {p}"
        )));
    }
    if n <= p {
        return Err(FactorError::MalformedInput(format!(
            "factor analysis requires more rows than features, found {n} rows for {p} features"
        )));
    }

    let mut z = DMatrix::from_column_slice(n, p, matrix.column_major());
    for (j, mut col) in z.column_iter_mut().enumerate() {
        let name = &matrix.names()[j];
        if let Some(row) = col.iter().position(|v| !v.is_finite()) {
            return Err(FactorError::MalformedInput(format!(
                "feature '{name}' holds a non-finite value at row {row}"
            )));
        }
        let mean = col.mean();
        let std = (col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
        if std <= f64::EPSILON * mean.abs().max(1.0) {
            return Err(FactorError::MalformedInput(format!(
                "feature '{name}' has zero variance"
            )));
        }
        col.apply(|v| *v = (*v - mean) / std);
    }
    Ok(z)
}

/// Pearson correlation matrix of standardized data, `ZᵀZ / n`. the result is
/// exactly symmetric with a unit diagonal.
pub fn correlation_matrix(z: &DMatrix<f64>) -> DMatrix<f64> {
    let n = z.nrows() as f64;
    let mut r = z.tr_mul(z) / n;
    let p = r.nrows();
    for i in 0..p {
        r[(i, i)] = 1.0;
        for j in (i + 1)..p {
            let v = ((r[(i, j)] + r[(j, i)]) / 2.0).clamp(-1.0, 1.0);
            r[(i, j)] = v;
            r[(j, i)] = v;
        }
    }
    r
}
