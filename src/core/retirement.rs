use log::debug;

use super::engine::{ensure_finite_horizon, growth_unchecked};
use super::error::{
    ProjectionError, ProjectionResult, ensure_finite, ensure_non_negative, ensure_rate_percent,
};
use super::solver::solve_goal;
use super::types::{
    CorpusMethod, GoalSolveParameters, GrowthParameters, RetirementParameters, RetirementResult,
};

/// Corpus that funds `desired_monthly_income` for `withdrawal_years` with no
/// growth during drawdown.
pub fn required_corpus_by_years(
    desired_monthly_income: f64,
    withdrawal_years: u32,
) -> ProjectionResult<f64> {
    ensure_non_negative("desiredMonthlyIncome", desired_monthly_income)?;
    validate_withdrawal_years(withdrawal_years)?;
    Ok(desired_monthly_income * 12.0 * withdrawal_years as f64)
}

/// Corpus whose annual `withdrawal_rate_percent` equals the desired income.
pub fn required_corpus_by_withdrawal_rate(
    desired_monthly_income: f64,
    withdrawal_rate_percent: f64,
) -> ProjectionResult<f64> {
    ensure_non_negative("desiredMonthlyIncome", desired_monthly_income)?;
    validate_withdrawal_rate(withdrawal_rate_percent)?;
    Ok(desired_monthly_income * 12.0 / (withdrawal_rate_percent / 100.0))
}

pub fn possible_monthly_income_by_years(corpus: f64, withdrawal_years: u32) -> ProjectionResult<f64> {
    ensure_finite("corpus", corpus)?;
    validate_withdrawal_years(withdrawal_years)?;
    Ok(corpus / (withdrawal_years as f64 * 12.0))
}

pub fn possible_monthly_income_by_withdrawal_rate(
    corpus: f64,
    withdrawal_rate_percent: f64,
) -> ProjectionResult<f64> {
    ensure_finite("corpus", corpus)?;
    validate_withdrawal_rate(withdrawal_rate_percent)?;
    Ok(corpus * (withdrawal_rate_percent / 100.0) / 12.0)
}

/// Restates today's monthly income in money of `years` from now.
pub fn inflate_monthly_income(
    monthly_income: f64,
    inflation_rate_percent: f64,
    years: u32,
) -> ProjectionResult<f64> {
    ensure_finite("monthlyIncome", monthly_income)?;
    ensure_rate_percent("inflationRatePercent", inflation_rate_percent)?;
    let inflated = inflate_unchecked(monthly_income, inflation_rate_percent, years);
    ensure_finite_horizon("years", inflated)?;
    Ok(inflated)
}

fn inflate_unchecked(monthly_income: f64, inflation_rate_percent: f64, years: u32) -> f64 {
    monthly_income * (1.0 + inflation_rate_percent / 100.0).powf(f64::from(years))
}

pub fn plan_retirement(params: &RetirementParameters) -> ProjectionResult<RetirementResult> {
    validate_retirement(params)?;

    let years_to_retirement = params.retirement_age - params.current_age;
    let months = i32::try_from(u64::from(years_to_retirement) * 12)
        .map_err(|_| ProjectionError::invalid("retirementAge", "horizon is too long"))?;

    let corpus_at_retirement = growth_unchecked(&GrowthParameters {
        present_value: params.current_savings,
        monthly_contribution: params.monthly_contribution,
        annual_return_rate_percent: params.annual_return_rate_percent,
        months,
    })
    .future_value;
    ensure_finite_horizon("retirementAge", corpus_at_retirement)?;

    let desired_monthly_income_at_retirement = match params.inflation_rate_percent {
        Some(rate) => inflate_unchecked(params.desired_monthly_income, rate, years_to_retirement),
        None => params.desired_monthly_income,
    };
    ensure_finite_horizon("retirementAge", desired_monthly_income_at_retirement)?;

    let (required_corpus, possible_monthly_income) = match params.corpus_method {
        CorpusMethod::Years => (
            required_corpus_by_years(desired_monthly_income_at_retirement, params.withdrawal_years)?,
            possible_monthly_income_by_years(corpus_at_retirement, params.withdrawal_years)?,
        ),
        CorpusMethod::WithdrawalRate => (
            required_corpus_by_withdrawal_rate(
                desired_monthly_income_at_retirement,
                params.withdrawal_rate_percent,
            )?,
            possible_monthly_income_by_withdrawal_rate(
                corpus_at_retirement,
                params.withdrawal_rate_percent,
            )?,
        ),
    };

    let shortfall = (required_corpus - corpus_at_retirement).max(0.0);
    let additional_monthly_contribution_needed = if shortfall > 0.0 {
        solve_goal(&GoalSolveParameters {
            present_value: 0.0,
            target_amount: shortfall,
            annual_return_rate_percent: params.annual_return_rate_percent,
            months,
        })?
        .required_monthly_contribution
    } else {
        0.0
    };

    debug!(
        "retirement plan: {years_to_retirement} years, corpus {corpus_at_retirement:.2}, required {required_corpus:.2}"
    );

    Ok(RetirementResult {
        years_to_retirement,
        corpus_at_retirement,
        required_corpus,
        corpus_sufficient: corpus_at_retirement >= required_corpus,
        shortfall,
        possible_monthly_income,
        desired_monthly_income_at_retirement,
        additional_monthly_contribution_needed,
    })
}

fn validate_retirement(params: &RetirementParameters) -> ProjectionResult<()> {
    if params.retirement_age <= params.current_age {
        return Err(ProjectionError::invalid(
            "retirementAge",
            "must be greater than currentAge",
        ));
    }
    ensure_finite("currentSavings", params.current_savings)?;
    ensure_non_negative("monthlyContribution", params.monthly_contribution)?;
    ensure_rate_percent("annualReturnRatePercent", params.annual_return_rate_percent)?;
    ensure_non_negative("desiredMonthlyIncome", params.desired_monthly_income)?;
    validate_withdrawal_years(params.withdrawal_years)?;
    validate_withdrawal_rate(params.withdrawal_rate_percent)?;
    if let Some(rate) = params.inflation_rate_percent {
        ensure_rate_percent("inflationRatePercent", rate)?;
    }
    Ok(())
}

fn validate_withdrawal_years(years: u32) -> ProjectionResult<()> {
    if years == 0 {
        return Err(ProjectionError::invalid("withdrawalYears", "must be > 0"));
    }
    Ok(())
}

fn validate_withdrawal_rate(rate_percent: f64) -> ProjectionResult<()> {
    ensure_finite("withdrawalRatePercent", rate_percent)?;
    if rate_percent <= 0.0 {
        return Err(ProjectionError::invalid("withdrawalRatePercent", "must be > 0"));
    }
    Ok(())
}
