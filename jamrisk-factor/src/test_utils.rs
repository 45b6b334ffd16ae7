//! synthetic feature matrices with known factor structure.
use itertools::Itertools;
use jamrisk_core::model::FeatureMatrix;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// features driven by one latent factor, `x_j = λ_j f + sqrt(1 - λ_j²) e_j`.
/// two features with loading 0.975 correlate at about 0.95.
pub fn single_factor_matrix(n: usize, loadings: &[f64], seed: u64) -> FeatureMatrix {
    let blocks = loadings.iter().map(|l| (0, *l)).collect_vec();
    latent_matrix(n, 1, &blocks, seed)
}

/// features driven by several latent factors. each feature is given as
/// (factor index, loading).
pub fn latent_matrix(n: usize, n_factors: usize, features: &[(usize, f64)], seed: u64) -> FeatureMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let latent = (0..n_factors)
        .map(|_| {
            (0..n)
                .map(|_| StandardNormal.sample(&mut rng))
                .collect::<Vec<f64>>()
        })
        .collect_vec();
    let columns = features
        .iter()
        .map(|(factor, loading)| {
            let unique = (1.0 - loading * loading).sqrt();
            latent[*factor]
                .iter()
                .map(|f| {
                    let e: f64 = StandardNormal.sample(&mut rng);
                    loading * f + unique * e
                })
                .collect_vec()
        })
        .collect_vec();
    let names = (0..features.len()).map(|i| format!("x{i}")).collect_vec();
    FeatureMatrix::new(names, columns).expect("test invariant failed: matrix should build")
}

/// independent standard normal columns.
pub fn noise_matrix(n: usize, p: usize, seed: u64) -> FeatureMatrix {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let columns = (0..p)
        .map(|_| {
            (0..n)
                .map(|_| StandardNormal.sample(&mut rng))
                .collect::<Vec<f64>>()
        })
        .collect_vec();
    let names = (0..p).map(|i| format!("noise{i}")).collect_vec();
    FeatureMatrix::new(names, columns).expect("test invariant failed: matrix should build")
}
