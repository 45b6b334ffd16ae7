//! synthetic merged traffic/weather observations for tests.
use jamrisk_core::model::{ObservationRecord, ObservationSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

const LABELS: [&str; 5] = ["Clear", "Rain", "Storm", "Snow", "Fog"];

/// builds `n` observations where precipitation, temperature, visibility and
/// speed depend on the weather label. `null_ratio` of the precipitation,
/// temperature and visibility values are dropped.
pub fn synthetic_observations(n: usize, seed: u64, null_ratio: f64) -> ObservationSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 8.0).expect("test invariant failed: valid normal");
    let records = (0..n)
        .map(|_| {
            let label = LABELS[rng.gen_range(0..LABELS.len())];
            let rain_mm: f64 = match label {
                "Rain" | "Snow" => rng.gen_range(0.0..30.0),
                "Storm" => rng.gen_range(25.0..80.0),
                _ => 0.0,
            };
            let temperature_c: f64 = match label {
                "Snow" => rng.gen_range(-8.0..2.0),
                _ => rng.gen_range(0.0..30.0),
            };
            let visibility_m: f64 = match label {
                "Fog" => rng.gen_range(50.0..1500.0),
                "Clear" => rng.gen_range(8000.0..12000.0),
                _ => rng.gen_range(1000.0..8000.0),
            };
            let base_speed = match label {
                "Clear" => 55.0,
                "Fog" => 40.0,
                _ => 32.0,
            } - rain_mm * 0.3;
            let speed = (base_speed + noise.sample(&mut rng)).max(3.0);
            let mut maybe = |v: f64| {
                if rng.gen::<f64>() < null_ratio {
                    None
                } else {
                    Some(v)
                }
            };
            let precipitation = maybe(rain_mm);
            let temperature = maybe(temperature_c);
            let visibility = maybe(visibility_m);
            ObservationRecord::new(speed, precipitation, temperature, visibility, Some(label))
        })
        .collect();
    ObservationSet::new(records)
}
