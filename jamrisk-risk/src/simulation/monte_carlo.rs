use itertools::Itertools;
use jamrisk_core::config::SimulationParameters;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::{Reliability, RiskReport, ScenarioRisk, ScenarioSampler};
use crate::{
    scenario::{ConditionalDistribution, ConditionalDistributions},
    RiskError,
};

/// ChaCha stream owned by one chunk of draws for one scenario. every
/// (scenario, chunk) pair reads a disjoint sub-sequence of the seeded
/// generator, so results do not depend on how chunks are scheduled.
pub fn stream_id(scenario_index: usize, chunk_index: usize) -> u64 {
    ((scenario_index as u64) << 32) | (chunk_index as u64 & 0xFFFF_FFFF)
}

/// runs the Monte Carlo congestion risk simulation over every scenario with
/// sufficient data.
///
/// for each scenario, `num_runs` values are drawn from the conditional
/// distribution and compared against the jam threshold:
///
///   p_jam = jams / N
///   CI    = p_jam ± z * sqrt(p_jam * (1 - p_jam) / N), clipped to [0, 1]
///
/// the result is a pure function of the distributions and parameters when a
/// seed is provided. without a seed, one is drawn from entropy and the run is
/// not reproducible.
pub fn simulate(
    distributions: &ConditionalDistributions,
    params: &SimulationParameters,
) -> Result<RiskReport, RiskError> {
    let effective_seed = match params.random_seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::random();
            log::warn!(
                "no random_seed configured, this simulation is not reproducible (drew seed {seed})"
            );
            seed
        }
    };
    if distributions.distributions.is_empty() {
        return Err(RiskError::InsufficientData {
            min_samples: distributions.min_scenario_samples,
            excluded: distributions.excluded.clone(),
        });
    }
    log::info!(
        "simulating {} scenarios with {} runs each, jam threshold {} ({:?}), seed {effective_seed}",
        distributions.distributions.len(),
        params.num_runs,
        params.jam_threshold,
        params.jam_direction
    );

    let risks = distributions
        .distributions
        .iter()
        .map(|dist| simulate_scenario(dist, params, effective_seed))
        .collect::<Result<Vec<_>, _>>()?;

    for risk in risks.iter() {
        log::info!(
            "scenario '{}': p_jam={:.4} [{:.4}, {:.4}] from {} records",
            risk.scenario,
            risk.p_jam,
            risk.ci_low,
            risk.ci_high,
            risk.sample_size
        );
    }

    Ok(RiskReport {
        risks,
        excluded: distributions.excluded.clone(),
        records: distributions.records,
        min_scenario_samples: distributions.min_scenario_samples,
        num_runs: params.num_runs,
        jam_threshold: params.jam_threshold,
        jam_direction: params.jam_direction,
        sampling_method: params.sampling_method,
        ci_z: params.ci_z,
        seed: params.random_seed,
        effective_seed,
    })
}

fn simulate_scenario(
    distribution: &ConditionalDistribution,
    params: &SimulationParameters,
    seed: u64,
) -> Result<ScenarioRisk, RiskError> {
    let sampler = ScenarioSampler::new(distribution, params.sampling_method)?;
    let scenario_index = distribution.scenario.index();
    let n = params.num_runs;
    let n_chunks = n.div_ceil(params.chunk_size);
    if n_chunks > u32::MAX as usize {
        return Err(RiskError::InvalidConfiguration(format!(
            "{n} runs in chunks of {} exceed the number of available random streams",
            params.chunk_size
        )));
    }

    let count_chunk = |chunk: usize| -> usize {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream_id(scenario_index, chunk));
        let start = chunk * params.chunk_size;
        let len = params.chunk_size.min(n - start);
        (0..len)
            .filter(|_| params.is_jam(sampler.draw(&mut rng)))
            .count()
    };
    let jams: usize = if params.parallel {
        (0..n_chunks).into_par_iter().map(count_chunk).sum()
    } else {
        (0..n_chunks).map(count_chunk).sum()
    };

    let n_f64 = n as f64;
    let p_jam = jams as f64 / n_f64;
    let ci_half_width = params.ci_z * (p_jam * (1.0 - p_jam) / n_f64).sqrt();
    let reliability = if n < params.min_reliable_runs {
        Reliability::SmallSample
    } else {
        Reliability::Reliable
    };

    Ok(ScenarioRisk {
        scenario: distribution.scenario,
        sample_size: distribution.sample_size(),
        num_runs: n,
        jams,
        p_jam,
        ci_low: (p_jam - ci_half_width).max(0.0),
        ci_high: (p_jam + ci_half_width).min(1.0),
        ci_half_width,
        reliability,
        indicator_mean: distribution.mean,
        indicator_std: distribution.std_dev,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        scenario::{estimate_conditional_distributions, partition, RecordAudit},
        test_utils,
    };
    use jamrisk_core::{
        config::{JamDirection, SamplingMethod, ScenarioParameters},
        model::{PrecipitationIntensity, WeatherCondition, WeatherScenario},
    };

    fn rain_high() -> WeatherScenario {
        WeatherScenario::new(WeatherCondition::Rain, PrecipitationIntensity::High)
    }

    fn seeded_params(seed: u64) -> SimulationParameters {
        SimulationParameters {
            random_seed: Some(seed),
            ..SimulationParameters::new(20.0)
        }
    }

    fn distributions_from(n: usize, seed: u64) -> ConditionalDistributions {
        let observations = test_utils::synthetic_observations(n, seed, 0.0);
        let params = ScenarioParameters::default();
        let parts = partition(&observations, &params);
        estimate_conditional_distributions(&observations, &parts, &params)
            .expect("test invariant failed: synthetic data has valid scenarios")
    }

    fn single(values: Vec<f64>) -> ConditionalDistributions {
        ConditionalDistributions {
            distributions: vec![ConditionalDistribution::new(rain_high(), values)],
            excluded: vec![],
            min_scenario_samples: 2,
            records: RecordAudit::default(),
        }
    }

    #[test]
    fn test_rain_high_precip_reproducible() {
        let distributions = distributions_from(10_000, 2024);
        let params = seeded_params(42);
        let first = simulate(&distributions, &params).expect("simulation should succeed");
        let second = simulate(&distributions, &params).expect("simulation should succeed");
        assert_eq!(first, second);

        let risk = first
            .get(&rain_high())
            .expect("rain,high-precip should be simulated");
        let again = second
            .get(&rain_high())
            .expect("rain,high-precip should be simulated");
        assert_eq!(risk.p_jam.to_bits(), again.p_jam.to_bits());
        assert_eq!(risk.num_runs, 5000);
        assert!(risk.p_jam > 0.0 && risk.p_jam < 1.0);
        assert!(first.is_reproducible());
        assert_eq!(first.effective_seed, 42);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let distributions = distributions_from(4000, 5);
        let parallel = seeded_params(42);
        let sequential = SimulationParameters {
            parallel: false,
            ..parallel.clone()
        };
        let a = simulate(&distributions, &parallel).expect("simulation should succeed");
        let b = simulate(&distributions, &sequential).expect("simulation should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let distributions = distributions_from(4000, 5);
        let a = simulate(&distributions, &seeded_params(1)).expect("simulation should succeed");
        let b = simulate(&distributions, &seeded_params(2)).expect("simulation should succeed");
        assert_ne!(a.risks, b.risks);
    }

    #[test]
    fn test_probabilities_within_bounds() {
        let distributions = distributions_from(6000, 99);
        for threshold in [-100.0, 0.0, 20.0, 35.0, 60.0, 500.0] {
            for direction in [JamDirection::Below, JamDirection::Above] {
                let params = SimulationParameters {
                    jam_threshold: threshold,
                    jam_direction: direction,
                    num_runs: 700,
                    ..seeded_params(8)
                };
                let report = simulate(&distributions, &params).expect("simulation should succeed");
                for risk in report.risks.iter() {
                    assert!((0.0..=1.0).contains(&risk.p_jam));
                    assert!(risk.ci_low >= 0.0 && risk.ci_low <= risk.p_jam);
                    assert!(risk.ci_high <= 1.0 && risk.ci_high >= risk.p_jam);
                }
            }
        }
    }

    #[test]
    fn test_certain_jam_has_zero_width_interval() {
        let distributions = single(vec![5.0, 5.0, 5.0]);
        let report = simulate(&distributions, &seeded_params(42)).expect("simulation should succeed");
        let risk = &report.risks[0];
        assert_eq!(risk.p_jam, 1.0);
        assert_eq!(risk.ci_half_width, 0.0);
        assert_eq!(risk.ci_low, 1.0);
        assert_eq!(risk.ci_high, 1.0);
        assert_eq!(risk.reliability, Reliability::Reliable);

        let never = single(vec![80.0, 80.0]);
        let report = simulate(&never, &seeded_params(42)).expect("simulation should succeed");
        assert_eq!(report.risks[0].p_jam, 0.0);
        assert_eq!(report.risks[0].ci_half_width, 0.0);
    }

    #[test]
    fn test_small_run_count_flagged() {
        let distributions = single(vec![10.0, 30.0, 25.0, 15.0]);
        let params = SimulationParameters {
            num_runs: 200,
            ..seeded_params(42)
        };
        let report = simulate(&distributions, &params).expect("simulation should succeed");
        assert_eq!(report.risks[0].reliability, Reliability::SmallSample);
        assert_eq!(report.risks[0].num_runs, 200);
    }

    #[test]
    fn test_interval_narrows_with_more_runs() {
        let distributions = single(vec![10.0, 18.0, 22.0, 26.0, 30.0, 19.0]);
        let mean_width = |num_runs: usize| -> f64 {
            let widths = (0..20)
                .map(|seed| {
                    let params = SimulationParameters {
                        num_runs,
                        ..seeded_params(seed)
                    };
                    let report =
                        simulate(&distributions, &params).expect("simulation should succeed");
                    report.risks[0].ci_high - report.risks[0].ci_low
                })
                .collect_vec();
            widths.iter().sum::<f64>() / widths.len() as f64
        };
        let w_small = mean_width(250);
        let w_medium = mean_width(2500);
        let w_large = mean_width(10_000);
        assert!(w_small > w_medium, "{w_small} <= {w_medium}");
        assert!(w_medium > w_large, "{w_medium} <= {w_large}");
    }

    #[test]
    fn test_bootstrap_sampling() {
        let distributions = single(vec![10.0, 12.0, 30.0, 40.0]);
        let params = SimulationParameters {
            sampling_method: SamplingMethod::Bootstrap,
            ..seeded_params(42)
        };
        let report = simulate(&distributions, &params).expect("simulation should succeed");
        let p = report.risks[0].p_jam;
        // half of the observed values are below the threshold
        assert!((p - 0.5).abs() < 0.05, "bootstrap p_jam {p} too far from 0.5");
    }

    #[test]
    fn test_unseeded_run_is_flagged() {
        let distributions = single(vec![10.0, 30.0]);
        let params = SimulationParameters::new(20.0);
        let report = simulate(&distributions, &params).expect("simulation should succeed");
        assert!(!report.is_reproducible());
        assert_eq!(report.seed, None);
    }

    #[test]
    fn test_report_rows_cover_every_scenario() {
        let distributions = distributions_from(3000, 17);
        let report = simulate(&distributions, &seeded_params(42)).expect("simulation should succeed");
        let rows = report.rows();
        assert_eq!(rows.len(), WeatherScenario::COUNT);
        let labels = rows.iter().map(|r| r.scenario.clone()).collect_vec();
        let expected = WeatherScenario::all()
            .iter()
            .map(|s| s.label())
            .collect_vec();
        assert_eq!(labels, expected);
        for row in rows {
            match row.reliability {
                Reliability::InsufficientData => assert!(row.p_jam.is_none()),
                _ => assert!(row.p_jam.is_some()),
            }
        }
    }

    #[test]
    fn test_stream_ids_are_distinct() {
        let ids = (0..WeatherScenario::COUNT)
            .flat_map(|s| (0..64).map(move |c| stream_id(s, c)))
            .collect_vec();
        assert_eq!(ids.iter().unique().count(), ids.len());
    }
}
