use std::f64::consts::PI;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::coerce;

/// Quantiles reported for every projection year.
pub const PERCENTILES: [f64; 5] = [0.10, 0.25, 0.50, 0.75, 0.90];

/// A path "succeeds" when its final value exceeds this multiple of the
/// starting wealth.
pub const SUCCESS_MULTIPLE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloParams {
    #[serde(default, deserialize_with = "coerce::number")]
    pub initial_wealth: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub annual_contribution: f64,
    /// Mean yearly return in percent.
    #[serde(default, deserialize_with = "coerce::number")]
    pub expected_return: f64,
    /// Standard deviation of the yearly return in percent.
    #[serde(default, deserialize_with = "coerce::number")]
    pub volatility: f64,
    #[serde(default, deserialize_with = "coerce::whole")]
    pub years: u32,
    #[serde(default, deserialize_with = "coerce::whole")]
    pub simulations: u32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentileBand {
    pub year: u32,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub bands: Vec<PercentileBand>,
    pub success_rate: f64,
    pub simulations: u32,
}

pub fn simulate(params: &MonteCarloParams) -> MonteCarloResult {
    let years = params.years as usize;
    log::debug!(
        "monte carlo: {} paths x {} years (seed {})",
        params.simulations,
        params.years,
        params.seed
    );

    if params.simulations == 0 {
        return MonteCarloResult {
            bands: Vec::new(),
            success_rate: 0.0,
            simulations: 0,
        };
    }

    let paths: Vec<Vec<f64>> = (0..params.simulations)
        .into_par_iter()
        .map(|path_id| {
            let mut rng = Rng::new(derive_seed(params.seed, path_id));
            simulate_path(params, &mut rng)
        })
        .collect();

    let mut bands = Vec::with_capacity(years);
    let mut column = Vec::with_capacity(paths.len());
    for year_idx in 0..years {
        column.clear();
        column.extend(paths.iter().map(|path| path[year_idx]));
        column.sort_by(|a, b| a.total_cmp(b));
        bands.push(PercentileBand {
            year: year_idx as u32 + 1,
            p10: nearest_rank(&column, PERCENTILES[0]),
            p25: nearest_rank(&column, PERCENTILES[1]),
            p50: nearest_rank(&column, PERCENTILES[2]),
            p75: nearest_rank(&column, PERCENTILES[3]),
            p90: nearest_rank(&column, PERCENTILES[4]),
        });
    }

    let bar = params.initial_wealth * SUCCESS_MULTIPLE;
    let successes = paths
        .iter()
        .filter(|path| path.last().is_some_and(|&last| last > bar))
        .count();

    MonteCarloResult {
        bands,
        success_rate: successes as f64 / params.simulations as f64,
        simulations: params.simulations,
    }
}

fn simulate_path(params: &MonteCarloParams, rng: &mut Rng) -> Vec<f64> {
    let mut wealth = params.initial_wealth;
    let mut path = Vec::with_capacity(params.years as usize);
    for _ in 0..params.years {
        let yearly_return = params.expected_return + params.volatility * rng.standard_normal();
        wealth = wealth * (1.0 + yearly_return / 100.0) + params.annual_contribution;
        path.push(wealth);
    }
    path
}

/// Value at index `floor(n * p)` of an ascending slice.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn derive_seed(base_seed: u64, path_id: u32) -> u64 {
    splitmix64(base_seed ^ ((path_id as u64) << 17) ^ path_id as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            seed
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform on the open interval (0, 1).
    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    /// One Box–Muller draw from two fresh uniforms; the paired sine sample
    /// is discarded so every year consumes exactly two uniforms.
    fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn params() -> MonteCarloParams {
        MonteCarloParams {
            initial_wealth: 100_000.0,
            annual_contribution: 10_000.0,
            expected_return: 7.0,
            volatility: 15.0,
            years: 20,
            simulations: 400,
            seed: 7,
        }
    }

    #[test]
    fn zero_volatility_collapses_to_deterministic_path() {
        let mut p = params();
        p.volatility = 0.0;
        p.simulations = 25;
        let result = simulate(&p);

        let mut expected = p.initial_wealth;
        for band in &result.bands {
            expected = expected * 1.07 + p.annual_contribution;
            for value in [band.p10, band.p25, band.p50, band.p75, band.p90] {
                assert_approx_tol(value, expected, 1e-6);
            }
        }
        assert_eq!(result.bands.len(), 20);
    }

    #[test]
    fn zero_volatility_without_contributions_is_pure_compounding() {
        let mut p = params();
        p.volatility = 0.0;
        p.annual_contribution = 0.0;
        p.years = 10;
        let result = simulate(&p);
        for band in &result.bands {
            let expected = p.initial_wealth * 1.07_f64.powi(band.year as i32);
            assert_approx_tol(band.p50, expected, 1e-6);
        }
        // 1.07^10 is about 1.967: just short of doubling.
        assert_eq!(result.success_rate, 0.0);
    }

    #[test]
    fn success_rate_counts_paths_that_double() {
        let mut p = params();
        p.volatility = 0.0;
        p.expected_return = 10.0;
        p.annual_contribution = 0.0;
        p.years = 8;
        assert_eq!(simulate(&p).success_rate, 1.0);
    }

    #[test]
    fn same_seed_reproduces_results() {
        let a = simulate(&params());
        let b = simulate(&params());
        assert_eq!(a, b);

        let mut other = params();
        other.seed = 8;
        assert_ne!(simulate(&other).bands, a.bands);
    }

    #[test]
    fn no_simulations_or_years_yield_empty_bands() {
        let mut p = params();
        p.simulations = 0;
        let empty = simulate(&p);
        assert!(empty.bands.is_empty());
        assert_eq!(empty.success_rate, 0.0);

        let mut p = params();
        p.years = 0;
        let result = simulate(&p);
        assert!(result.bands.is_empty());
        assert_eq!(result.success_rate, 0.0);
    }

    #[test]
    fn zero_years_never_count_as_success_even_in_debt() {
        let mut p = params();
        p.years = 0;
        p.initial_wealth = -50_000.0;
        let result = simulate(&p);
        assert_eq!(result.success_rate, 0.0);
    }

    #[test]
    fn nearest_rank_reads_floor_index() {
        let sorted: Vec<f64> = (0..10).map(|v| v as f64).collect();
        assert_eq!(nearest_rank(&sorted, 0.10), 1.0);
        assert_eq!(nearest_rank(&sorted, 0.50), 5.0);
        assert_eq!(nearest_rank(&sorted, 0.90), 9.0);
        assert_eq!(nearest_rank(&[3.0], 0.90), 3.0);
    }

    #[test]
    fn standard_normal_has_roughly_unit_moments() {
        let mut rng = Rng::new(123);
        let n = 50_000;
        let draws: Vec<f64> = (0..n).map(|_| rng.standard_normal()).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / n as f64;
        assert!(mean.abs() < 0.03, "mean {mean}");
        assert!((var - 1.0).abs() < 0.05, "variance {var}");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_bands_are_ordered(
            seed in any::<u64>(),
            vol_bp in 0u32..4_000,
            years in 1u32..15,
            simulations in 1u32..60
        ) {
            let mut p = params();
            p.seed = seed;
            p.volatility = vol_bp as f64 / 100.0;
            p.years = years;
            p.simulations = simulations;
            let result = simulate(&p);
            prop_assert!(result.bands.len() == years as usize);
            prop_assert!((0.0..=1.0).contains(&result.success_rate));
            for band in &result.bands {
                prop_assert!(band.p10 <= band.p25);
                prop_assert!(band.p25 <= band.p50);
                prop_assert!(band.p50 <= band.p75);
                prop_assert!(band.p75 <= band.p90);
            }
        }
    }
}
