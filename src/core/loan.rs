use log::trace;

use super::engine::{is_zero_rate, monthly_rate};
use super::error::{ProjectionError, ProjectionResult, ensure_finite, ensure_non_negative, ensure_rate_percent};
use super::types::{AmortizationRow, ExtraPaymentOutcome, LoanParameters, LoanResult};

/// Outstanding balances below this are treated as paid off.
const BALANCE_EPSILON: f64 = 1e-7;

/// Longest tenure accepted, in months (100 years).
pub const MAX_TENURE_MONTHS: i32 = 1_200;

/// Reducing-balance EMI: `P * r * (1 + r)^n / ((1 + r)^n - 1)`, or `P / n`
/// for an interest-free loan.
pub fn monthly_emi(params: &LoanParameters) -> ProjectionResult<f64> {
    validate_loan(params)?;
    Ok(emi_unchecked(params))
}

fn emi_unchecked(params: &LoanParameters) -> f64 {
    let rate = monthly_rate(params.annual_interest_rate_percent);
    let months = params.tenure_months as f64;
    if is_zero_rate(rate) {
        return params.principal / months;
    }
    let growth = (months * rate.ln_1p()).exp_m1();
    params.principal * rate * (growth + 1.0) / growth
}

pub fn calculate_loan(params: &LoanParameters) -> ProjectionResult<LoanResult> {
    validate_loan(params)?;

    let monthly_emi = emi_unchecked(params);
    let total_payment = monthly_emi * params.tenure_months as f64;
    let total_interest = total_payment - params.principal;

    let with_extra_payment = if params.extra_monthly_payment > 0.0 {
        let schedule = build_schedule(params, monthly_emi);
        let payoff_months = schedule.len() as i32;
        let total_interest_paid: f64 = schedule.iter().map(|row| row.interest_paid).sum();
        trace!("extra payment schedule paid off in {payoff_months} months");
        Some(ExtraPaymentOutcome {
            months_saved: params.tenure_months - payoff_months,
            interest_saved: (total_interest - total_interest_paid).max(0.0),
            payoff_months,
            total_interest_paid,
        })
    } else {
        None
    };

    Ok(LoanResult {
        monthly_emi,
        total_payment,
        total_interest,
        with_extra_payment,
    })
}

/// Month-by-month repayment rows, extra payment included. The final row
/// settles whatever balance is left, so it may be smaller than the EMI.
pub fn amortization_schedule(params: &LoanParameters) -> ProjectionResult<Vec<AmortizationRow>> {
    validate_loan(params)?;
    Ok(build_schedule(params, emi_unchecked(params)))
}

fn build_schedule(params: &LoanParameters, emi: f64) -> Vec<AmortizationRow> {
    let rate = monthly_rate(params.annual_interest_rate_percent);
    let scheduled_payment = emi + params.extra_monthly_payment;

    let mut rows = Vec::new();
    let mut balance = params.principal;
    let mut month = 0;
    while balance > BALANCE_EPSILON && month < params.tenure_months {
        month += 1;
        let interest = balance * rate;
        let due = balance + interest;
        let payment = if month == params.tenure_months {
            due
        } else {
            scheduled_payment.min(due)
        };
        balance = due - payment;
        rows.push(AmortizationRow {
            month,
            payment,
            principal_paid: payment - interest,
            interest_paid: interest,
            balance,
        });
    }
    rows
}

fn validate_loan(params: &LoanParameters) -> ProjectionResult<()> {
    ensure_finite("principal", params.principal)?;
    if params.principal <= 0.0 {
        return Err(ProjectionError::invalid("principal", "must be > 0"));
    }
    ensure_rate_percent("annualInterestRatePercent", params.annual_interest_rate_percent)?;
    if params.tenure_months <= 0 {
        return Err(ProjectionError::invalid("tenureMonths", "must be > 0"));
    }
    if params.tenure_months > MAX_TENURE_MONTHS {
        return Err(ProjectionError::invalid(
            "tenureMonths",
            format!("must be <= {MAX_TENURE_MONTHS}"),
        ));
    }
    ensure_non_negative("extraMonthlyPayment", params.extra_monthly_payment)
}
