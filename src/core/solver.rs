use log::debug;

use super::engine::{
    compound_factor, contribution_factor, ensure_finite_horizon, growth_unchecked, monthly_rate,
    scale_by, validate_growth, validate_months,
};
use super::error::{
    ProjectionError, ProjectionResult, ensure_finite, ensure_non_negative, ensure_rate_percent,
};
use super::types::{
    GoalSolveParameters, GoalSolveResult, GrowthParameters, RateSearchConfig, RateSearchIteration,
    RequiredReturnParameters, RequiredReturnResult,
};

/// Upper bound on bisection steps for the required return search.
pub const MAX_SEARCH_ITERATIONS: u32 = 10_000;

/// Level monthly contribution that grows `present_value` to `target_amount`.
///
/// Never returns a negative contribution: when growth of the present value
/// alone meets the target the answer is zero. With no months left and a gap
/// remaining the goal is reported as not achievable.
pub fn solve_goal(params: &GoalSolveParameters) -> ProjectionResult<GoalSolveResult> {
    validate_goal(params)?;

    let rate = monthly_rate(params.annual_return_rate_percent);
    let future_value_of_present = scale_by(params.present_value, compound_factor(rate, params.months));
    let factor = contribution_factor(rate, params.months);
    ensure_finite_horizon("months", future_value_of_present)?;
    ensure_finite_horizon("months", factor)?;
    let remaining = params.target_amount - future_value_of_present;

    if remaining <= 0.0 {
        return Ok(GoalSolveResult {
            required_monthly_contribution: 0.0,
            achievable: true,
            future_value_of_present,
            remaining_after_growth: 0.0,
        });
    }

    if params.months == 0 {
        return Ok(GoalSolveResult {
            required_monthly_contribution: 0.0,
            achievable: false,
            future_value_of_present,
            remaining_after_growth: remaining,
        });
    }

    Ok(GoalSolveResult {
        required_monthly_contribution: remaining / factor,
        achievable: true,
        future_value_of_present,
        remaining_after_growth: remaining,
    })
}

fn validate_goal(params: &GoalSolveParameters) -> ProjectionResult<()> {
    ensure_finite("presentValue", params.present_value)?;
    ensure_finite("targetAmount", params.target_amount)?;
    ensure_rate_percent("annualReturnRatePercent", params.annual_return_rate_percent)?;
    validate_months("months", params.months)
}

/// Lowest annual return (percent) at which the contributions reach the target,
/// found by bisection over `config`'s search bounds.
pub fn solve_required_return_rate(
    params: &RequiredReturnParameters,
    config: RateSearchConfig,
) -> ProjectionResult<RequiredReturnResult> {
    validate_required_return(params, config)?;

    let future_value_at = |rate_percent: f64| {
        growth_unchecked(&GrowthParameters {
            present_value: params.present_value,
            monthly_contribution: params.monthly_contribution,
            annual_return_rate_percent: rate_percent,
            months: params.months,
        })
        .future_value
    };

    let mut iterations = Vec::new();
    let low_value = future_value_at(config.search_min_percent);
    let high_value = future_value_at(config.search_max_percent);
    ensure_finite_horizon("months", low_value)?;

    if low_value + 1e-9 >= params.target_amount {
        return Ok(RequiredReturnResult {
            solved_rate_percent: Some(config.search_min_percent),
            future_value_at_solution: Some(low_value),
            feasible: true,
            converged: true,
            iterations,
            message: "Already meets target at lower rate bound.".to_string(),
        });
    }
    if high_value + 1e-9 < params.target_amount {
        return Ok(RequiredReturnResult {
            solved_rate_percent: None,
            future_value_at_solution: None,
            feasible: false,
            converged: false,
            iterations,
            message: "No feasible return rate found within the search bounds.".to_string(),
        });
    }

    let mut lo = config.search_min_percent;
    let mut hi = config.search_max_percent;
    let mut converged = false;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let value = future_value_at(mid);
        iterations.push(RateSearchIteration {
            iteration: it,
            lower_bound_percent: lo,
            upper_bound_percent: hi,
            candidate_percent: mid,
            future_value: value,
        });

        if value + 1e-9 >= params.target_amount {
            hi = mid;
        } else {
            lo = mid;
        }

        if (hi - lo).abs() <= config.tolerance_percent {
            converged = true;
            break;
        }
    }
    debug!("required return search finished after {it} iterations (converged: {converged})");

    Ok(RequiredReturnResult {
        solved_rate_percent: Some(hi),
        future_value_at_solution: Some(future_value_at(hi)),
        feasible: true,
        converged,
        iterations,
        message: if converged {
            "Solved required return rate.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate.".to_string()
        },
    })
}

fn validate_required_return(
    params: &RequiredReturnParameters,
    config: RateSearchConfig,
) -> ProjectionResult<()> {
    validate_growth(&GrowthParameters {
        present_value: params.present_value,
        monthly_contribution: params.monthly_contribution,
        annual_return_rate_percent: 0.0,
        months: params.months,
    })?;
    ensure_non_negative("presentValue", params.present_value)?;
    ensure_finite("targetAmount", params.target_amount)?;
    ensure_rate_percent("searchMinPercent", config.search_min_percent)?;
    ensure_finite("searchMaxPercent", config.search_max_percent)?;
    if config.search_max_percent <= config.search_min_percent {
        return Err(ProjectionError::invalid(
            "searchMaxPercent",
            "must be greater than searchMinPercent",
        ));
    }
    if !config.tolerance_percent.is_finite() || config.tolerance_percent <= 0.0 {
        return Err(ProjectionError::invalid("tolerancePercent", "must be > 0"));
    }
    if config.max_iterations == 0 || config.max_iterations > MAX_SEARCH_ITERATIONS {
        return Err(ProjectionError::invalid(
            "maxIterations",
            format!("must be between 1 and {MAX_SEARCH_ITERATIONS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::project_growth;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn goal(pv: f64, target: f64, rate: f64, months: i32) -> GoalSolveResult {
        solve_goal(&GoalSolveParameters {
            present_value: pv,
            target_amount: target,
            annual_return_rate_percent: rate,
            months,
        })
        .expect("valid goal parameters")
    }

    fn future_value(pv: f64, contribution: f64, rate: f64, months: i32) -> f64 {
        project_growth(&GrowthParameters {
            present_value: pv,
            monthly_contribution: contribution,
            annual_return_rate_percent: rate,
            months,
        })
        .expect("valid growth parameters")
        .future_value
    }

    #[test]
    fn million_in_ten_years_at_twelve_percent() {
        let result = goal(0.0, 1_000_000.0, 12.0, 120);

        let r: f64 = 0.01;
        let factor = ((1.0 + r).powi(120) - 1.0) / r * (1.0 + r);
        assert!(result.achievable);
        assert_close(result.required_monthly_contribution, 1_000_000.0 / factor, 1e-6);
        assert_close(
            future_value(0.0, result.required_monthly_contribution, 12.0, 120),
            1_000_000.0,
            0.01,
        );
    }

    #[test]
    fn present_value_already_covering_target_needs_nothing() {
        let result = goal(800_000.0, 1_000_000.0, 8.0, 60);
        assert!(result.achievable);
        assert_eq!(result.required_monthly_contribution, 0.0);
        assert_eq!(result.remaining_after_growth, 0.0);
        assert!(result.future_value_of_present > 1_000_000.0);
    }

    #[test]
    fn zero_rate_splits_gap_evenly() {
        let result = goal(1_000.0, 13_000.0, 0.0, 24);
        assert!(result.achievable);
        assert_close(result.required_monthly_contribution, 500.0, 1e-9);
    }

    #[test]
    fn no_time_left_is_unachievable_not_an_error() {
        let result = goal(1_000.0, 5_000.0, 10.0, 0);
        assert!(!result.achievable);
        assert_eq!(result.required_monthly_contribution, 0.0);
        assert_close(result.remaining_after_growth, 4_000.0, 1e-9);

        let met = goal(5_000.0, 5_000.0, 10.0, 0);
        assert!(met.achievable);
    }

    #[test]
    fn negative_months_is_invalid_input() {
        let err = solve_goal(&GoalSolveParameters {
            present_value: 0.0,
            target_amount: 10.0,
            annual_return_rate_percent: 5.0,
            months: -3,
        })
        .expect_err("negative months");
        assert_eq!(err.field(), "months");
    }

    #[test]
    fn required_return_solver_finds_rate_used_to_build_target() {
        let target = future_value(10_000.0, 500.0, 9.0, 180);
        let result = solve_required_return_rate(
            &RequiredReturnParameters {
                present_value: 10_000.0,
                monthly_contribution: 500.0,
                target_amount: target,
                months: 180,
            },
            RateSearchConfig::default(),
        )
        .expect("must solve");

        assert!(result.feasible);
        assert!(result.converged);
        assert_close(result.solved_rate_percent.expect("rate expected"), 9.0, 1e-4);
        assert!(result.future_value_at_solution.expect("value expected") + 1e-6 >= target);
        assert!(!result.iterations.is_empty());
    }

    #[test]
    fn required_return_solver_reports_lower_bound_when_already_met() {
        let result = solve_required_return_rate(
            &RequiredReturnParameters {
                present_value: 100_000.0,
                monthly_contribution: 0.0,
                target_amount: 10_000.0,
                months: 12,
            },
            RateSearchConfig::default(),
        )
        .expect("must return result");
        assert!(result.feasible);
        assert_eq!(result.solved_rate_percent, Some(-50.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn required_return_solver_reports_infeasible_when_bounds_too_low() {
        let result = solve_required_return_rate(
            &RequiredReturnParameters {
                present_value: 0.0,
                monthly_contribution: 100.0,
                target_amount: 1_000_000.0,
                months: 12,
            },
            RateSearchConfig::default(),
        )
        .expect("must return result");
        assert!(!result.feasible);
        assert!(result.solved_rate_percent.is_none());
    }

    #[test]
    fn required_return_solver_rejects_inverted_bounds() {
        let err = solve_required_return_rate(
            &RequiredReturnParameters {
                present_value: 0.0,
                monthly_contribution: 100.0,
                target_amount: 2_000.0,
                months: 12,
            },
            RateSearchConfig {
                search_min_percent: 10.0,
                search_max_percent: 5.0,
                ..RateSearchConfig::default()
            },
        )
        .expect_err("inverted bounds");
        assert_eq!(err.field(), "searchMaxPercent");
    }

    #[test]
    fn required_return_solver_caps_iterations() {
        let params = RequiredReturnParameters {
            present_value: 0.0,
            monthly_contribution: 100.0,
            target_amount: 2_000.0,
            months: 12,
        };
        let err = solve_required_return_rate(
            &params,
            RateSearchConfig {
                max_iterations: u32::MAX,
                ..RateSearchConfig::default()
            },
        )
        .expect_err("too many iterations");
        assert_eq!(err.field(), "maxIterations");

        let result = solve_required_return_rate(
            &params,
            RateSearchConfig {
                max_iterations: MAX_SEARCH_ITERATIONS,
                ..RateSearchConfig::default()
            },
        )
        .expect("largest iteration budget is valid");
        assert!(result.converged);
    }

    #[test]
    fn goal_over_overflowing_horizon_is_invalid_not_nan() {
        let err = solve_goal(&GoalSolveParameters {
            present_value: 0.0,
            target_amount: 1_000.0,
            annual_return_rate_percent: 30.0,
            months: 100_000,
        })
        .expect_err("factor overflows");
        assert_eq!(err.field(), "months");
    }

    #[test]
    fn required_return_solver_survives_overflow_at_upper_bound() {
        let result = solve_required_return_rate(
            &RequiredReturnParameters {
                present_value: 0.0,
                monthly_contribution: 100.0,
                target_amount: 1_000_000.0,
                months: 100_000,
            },
            RateSearchConfig::default(),
        )
        .expect("must return result");
        assert!(result.feasible);
        assert!(result.solved_rate_percent.expect("rate expected").is_finite());
        assert!(result.future_value_at_solution.expect("value expected").is_finite());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_solved_contribution_reaches_target(
            pv in 0u32..500_000,
            target in 1_000u32..5_000_000,
            rate_bp in -2_000i32..2_500,
            months in 1i32..480
        ) {
            let rate = rate_bp as f64 / 100.0;
            let result = goal(pv as f64, target as f64, rate, months);
            prop_assert!(result.achievable);
            prop_assert!(result.required_monthly_contribution >= 0.0);

            let reached = future_value(pv as f64, result.required_monthly_contribution, rate, months);
            if result.required_monthly_contribution > 0.0 {
                prop_assert!((reached - target as f64).abs() <= 0.01);
            } else {
                prop_assert!(reached + 1e-6 >= target as f64);
            }
        }

        #[test]
        fn prop_longer_horizon_never_needs_more_at_positive_rates(
            target in 10_000u32..5_000_000,
            rate_bp in 0i32..2_500,
            months in 1i32..400,
            extra in 1i32..80
        ) {
            let short = goal(0.0, target as f64, rate_bp as f64 / 100.0, months);
            let long = goal(0.0, target as f64, rate_bp as f64 / 100.0, months + extra);
            prop_assume!(short.required_monthly_contribution > 0.0);
            prop_assert!(long.required_monthly_contribution <= short.required_monthly_contribution + 1e-9);
        }
    }
}
