use log::debug;
use rand::Rng;
use rand::SeedableRng;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use statrs::distribution::Normal;

use super::engine::{ensure_finite_horizon, monthly_rate, validate_months};
use super::error::{
    ProjectionError, ProjectionResult, ensure_finite, ensure_non_negative, ensure_rate_percent,
};
use super::types::{MonteCarloParameters, MonteCarloResult};

/// Most trials a single simulation will run.
pub const MAX_MONTE_CARLO_TRIALS: i32 = 1_000_000;

/// Simulates `trials` independent paths of monthly compounding with normally
/// distributed monthly returns and summarizes the final balances.
///
/// The generator is supplied by the caller so a fixed seed reproduces the
/// result exactly. With zero volatility every path is the deterministic
/// growth path and `rng` is never drawn from.
pub fn run_monte_carlo<R: Rng + ?Sized>(
    params: &MonteCarloParameters,
    rng: &mut R,
) -> ProjectionResult<MonteCarloResult> {
    validate_monte_carlo(params)?;

    let monthly_mean = monthly_rate(params.expected_annual_return_percent);
    let monthly_vol = params.annual_volatility_percent / 100.0 / 12_f64.sqrt();
    let trials = params.trials as usize;

    let mut finals = Vec::with_capacity(trials);
    if monthly_vol == 0.0 {
        let value = simulate_path(params, || monthly_mean);
        finals.resize(trials, value);
    } else {
        let normal = Normal::new(monthly_mean, monthly_vol).map_err(|e| {
            ProjectionError::invalid(
                "annualVolatilityPercent",
                format!("invalid return distribution: {e}"),
            )
        })?;
        for _ in 0..trials {
            finals.push(simulate_path(params, || normal.sample(rng)));
        }
    }

    debug!(
        "monte carlo finished {trials} trials over {} months",
        params.months
    );
    let summary = summarize(finals, params.target_amount);
    ensure_finite_horizon("months", summary.max)?;
    ensure_finite_horizon("months", summary.standard_deviation)?;
    Ok(summary)
}

pub fn run_monte_carlo_with_seed(
    params: &MonteCarloParameters,
    seed: u64,
) -> ProjectionResult<MonteCarloResult> {
    let mut rng = StdRng::seed_from_u64(seed);
    run_monte_carlo(params, &mut rng)
}

fn simulate_path(params: &MonteCarloParameters, mut next_return: impl FnMut() -> f64) -> f64 {
    let mut balance = params.present_value;
    for _ in 0..params.months {
        // A month can lose at most everything invested.
        let monthly_return = next_return().max(-1.0);
        balance = (balance + params.monthly_contribution) * (1.0 + monthly_return);
        if balance.is_infinite() {
            break;
        }
    }
    balance
}

fn summarize(mut finals: Vec<f64>, target_amount: Option<f64>) -> MonteCarloResult {
    finals.sort_by(|a, b| a.total_cmp(b));

    let n = finals.len() as f64;
    let mean = finals.iter().sum::<f64>() / n;
    let variance = finals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    MonteCarloResult {
        trials: finals.len() as u32,
        mean,
        median: percentile_sorted(&finals, 50.0),
        percentile10: percentile_sorted(&finals, 10.0),
        percentile90: percentile_sorted(&finals, 90.0),
        standard_deviation: variance.sqrt(),
        min: finals.first().copied().unwrap_or(0.0),
        max: finals.last().copied().unwrap_or(0.0),
        probability_of_reaching_target: target_amount.map(|target| {
            finals.iter().filter(|&&value| value >= target).count() as f64 / n
        }),
    }
}

/// Linear interpolation between closest ranks of an ascending slice.
fn percentile_sorted(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let (lo, hi) = (values[lower], values[upper]);
        let w = rank - lower as f64;
        (lo + (hi - lo) * w).max(lo).min(hi)
    }
}

fn validate_monte_carlo(params: &MonteCarloParameters) -> ProjectionResult<()> {
    if params.trials <= 0 {
        return Err(ProjectionError::invalid("trials", "must be > 0"));
    }
    if params.trials > MAX_MONTE_CARLO_TRIALS {
        return Err(ProjectionError::invalid(
            "trials",
            format!("must be <= {MAX_MONTE_CARLO_TRIALS}"),
        ));
    }
    ensure_finite("presentValue", params.present_value)?;
    ensure_non_negative("monthlyContribution", params.monthly_contribution)?;
    ensure_rate_percent(
        "expectedAnnualReturnPercent",
        params.expected_annual_return_percent,
    )?;
    ensure_non_negative("annualVolatilityPercent", params.annual_volatility_percent)?;
    validate_months("months", params.months)?;
    if let Some(target) = params.target_amount {
        ensure_finite("targetAmount", target)?;
    }
    Ok(())
}
