use super::error::{
    ProjectionError, ProjectionResult, ensure_finite, ensure_non_negative, ensure_rate_percent,
};
use super::types::{GrowthParameters, GrowthResult, ProjectionPoint};

/// Monthly rates with a smaller magnitude are treated as exactly zero.
pub(crate) const RATE_EPSILON: f64 = 1e-12;

/// Longest month-by-month series `project_growth_series` will build.
pub const MAX_SERIES_MONTHS: i32 = 12_000;

/// Converts an annual percentage (e.g. `12.0`) to the monthly decimal rate.
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

pub fn is_zero_rate(rate: f64) -> bool {
    rate.abs() < RATE_EPSILON
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Currency-style two decimal rounding for the presentation boundary. The
/// calculators themselves always return full precision.
pub fn round_currency(value: f64) -> f64 {
    round_to(value, 2)
}

/// `(1 + r)^n`. Requires `r > -1`.
pub(crate) fn compound_factor(rate: f64, months: i32) -> f64 {
    if months <= 0 || is_zero_rate(rate) {
        return 1.0;
    }
    (months as f64 * rate.ln_1p()).exp()
}

/// Value after `n` months of one unit contributed at the start of every
/// month: `((1 + r)^n - 1) / r * (1 + r)`, or `n` when `r == 0`.
pub(crate) fn contribution_factor(rate: f64, months: i32) -> f64 {
    if months <= 0 {
        return 0.0;
    }
    if is_zero_rate(rate) {
        return months as f64;
    }
    let growth = (months as f64 * rate.ln_1p()).exp_m1();
    growth / rate * (1.0 + rate)
}

/// `amount * factor`, where a zero amount stays zero even if the factor has
/// overflowed to infinity.
pub(crate) fn scale_by(amount: f64, factor: f64) -> f64 {
    if amount == 0.0 { 0.0 } else { amount * factor }
}

/// Rejects a compounded value that overflowed for the requested horizon.
pub(crate) fn ensure_finite_horizon(field: &'static str, value: f64) -> ProjectionResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::invalid(field, "horizon too long for rate"))
    }
}

pub(crate) fn validate_months(field: &'static str, months: i32) -> ProjectionResult<()> {
    if months < 0 {
        return Err(ProjectionError::invalid(field, "must be >= 0"));
    }
    Ok(())
}

pub(crate) fn validate_growth(params: &GrowthParameters) -> ProjectionResult<()> {
    ensure_finite("presentValue", params.present_value)?;
    ensure_non_negative("monthlyContribution", params.monthly_contribution)?;
    ensure_rate_percent("annualReturnRatePercent", params.annual_return_rate_percent)?;
    validate_months("months", params.months)
}

/// Future value of a lump sum plus level monthly contributions.
pub fn project_growth(params: &GrowthParameters) -> ProjectionResult<GrowthResult> {
    validate_growth(params)?;
    let result = growth_unchecked(params);
    ensure_finite_horizon("months", result.future_value)?;
    Ok(result)
}

pub(crate) fn growth_unchecked(params: &GrowthParameters) -> GrowthResult {
    let rate = monthly_rate(params.annual_return_rate_percent);
    let months = params.months.max(0);

    let future_value = scale_by(params.present_value, compound_factor(rate, months))
        + scale_by(params.monthly_contribution, contribution_factor(rate, months));
    let total_contributed = params.present_value + params.monthly_contribution * months as f64;

    GrowthResult {
        future_value,
        total_contributed,
        total_growth: future_value - total_contributed,
    }
}

/// Month-by-month balances for `month = 0..=months`, each point being the
/// closed form evaluated at that horizon.
pub fn project_growth_series(params: &GrowthParameters) -> ProjectionResult<Vec<ProjectionPoint>> {
    validate_growth(params)?;
    if params.months > MAX_SERIES_MONTHS {
        return Err(ProjectionError::invalid(
            "months",
            format!("series is limited to {MAX_SERIES_MONTHS} months"),
        ));
    }
    ensure_finite_horizon("months", growth_unchecked(params).future_value)?;

    let series = (0..=params.months)
        .map(|month| {
            let point = growth_unchecked(&GrowthParameters { months: month, ..*params });
            ProjectionPoint {
                month,
                value: point.future_value,
                contributed: point.total_contributed,
            }
        })
        .collect();
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::{prop_assert, proptest};

    fn growth(pv: f64, contribution: f64, rate: f64, months: i32) -> GrowthResult {
        project_growth(&GrowthParameters {
            present_value: pv,
            monthly_contribution: contribution,
            annual_return_rate_percent: rate,
            months,
        })
        .expect("valid growth parameters")
    }

    #[test]
    fn monthly_rate_divides_annual_percent() {
        assert_relative_eq!(monthly_rate(12.0), 0.01);
        assert_relative_eq!(monthly_rate(-6.0), -0.005);
        assert_eq!(monthly_rate(0.0), 0.0);
    }

    #[test]
    fn round_currency_keeps_two_decimals() {
        assert_eq!(round_currency(8364.404_9), 8364.4);
        assert_eq!(round_currency(4303.056), 4303.06);
        assert_eq!(round_currency(-1.005_1), -1.01);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn sip_ten_years_matches_closed_form() {
        let result = growth(100_000.0, 10_000.0, 12.0, 120);

        let r: f64 = 0.01;
        let compounded = (1.0 + r).powi(120);
        let expected = 100_000.0 * compounded + 10_000.0 * ((compounded - 1.0) / r) * (1.0 + r);

        assert_relative_eq!(result.future_value, expected, max_relative = 1e-9);
        assert!((2_650_000.0..2_660_000.0).contains(&result.future_value));
        assert_relative_eq!(result.total_contributed, 1_300_000.0);
        assert_relative_eq!(
            result.total_growth,
            result.future_value - result.total_contributed
        );
    }

    #[test]
    fn zero_months_returns_present_value() {
        let result = growth(50_000.0, 1_000.0, 9.0, 0);
        assert_eq!(result.future_value, 50_000.0);
        assert_eq!(result.total_contributed, 50_000.0);
        assert_eq!(result.total_growth, 0.0);
    }

    #[test]
    fn negative_rate_shrinks_balance_without_nan() {
        let result = growth(10_000.0, 100.0, -50.0, 36);
        assert!(result.future_value.is_finite());
        assert!(result.future_value < result.total_contributed);
        assert!(result.total_growth < 0.0);
    }

    #[test]
    fn rejects_negative_months_and_contribution() {
        let mut params = GrowthParameters {
            present_value: 1.0,
            monthly_contribution: 1.0,
            annual_return_rate_percent: 5.0,
            months: -1,
        };
        let err = project_growth(&params).expect_err("negative months");
        assert_eq!(err.field(), "months");

        params.months = 12;
        params.monthly_contribution = -5.0;
        let err = project_growth(&params).expect_err("negative contribution");
        assert_eq!(err.field(), "monthlyContribution");

        params.monthly_contribution = 5.0;
        params.annual_return_rate_percent = f64::NAN;
        let err = project_growth(&params).expect_err("nan rate");
        assert_eq!(err.field(), "annualReturnRatePercent");
    }

    #[test]
    fn series_starts_at_present_value_and_ends_at_future_value() {
        let params = GrowthParameters {
            present_value: 2_000.0,
            monthly_contribution: 250.0,
            annual_return_rate_percent: 7.5,
            months: 24,
        };
        let series = project_growth_series(&params).expect("valid series");
        let last = growth(2_000.0, 250.0, 7.5, 24);

        assert_eq!(series.len(), 25);
        assert_eq!(series[0].month, 0);
        assert_eq!(series[0].value, 2_000.0);
        assert_eq!(series[24].value, last.future_value);
        assert_relative_eq!(series[24].contributed, 2_000.0 + 250.0 * 24.0);
        assert!(series.windows(2).all(|w| w[1].value > w[0].value));
    }

    #[test]
    fn overflowing_horizon_is_invalid_instead_of_nan() {
        let params = GrowthParameters {
            present_value: 0.0,
            monthly_contribution: 100.0,
            annual_return_rate_percent: 30.0,
            months: 100_000,
        };
        let err = project_growth(&params).expect_err("overflowing factor");
        assert_eq!(err.field(), "months");
        assert!(project_growth_series(&params).is_err());

        let idle = growth(0.0, 0.0, 30.0, 100_000);
        assert_eq!(idle.future_value, 0.0);
        assert_eq!(idle.total_growth, 0.0);
    }

    #[test]
    fn series_length_is_capped() {
        let err = project_growth_series(&GrowthParameters {
            present_value: 1_000.0,
            monthly_contribution: 0.0,
            annual_return_rate_percent: 0.0,
            months: i32::MAX,
        })
        .expect_err("series too long");
        assert_eq!(err.field(), "months");
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_rate_zero_contribution_is_identity(
            pv in 0u32..5_000_000,
            months in 0i32..600
        ) {
            let result = growth(pv as f64, 0.0, 0.0, months);
            prop_assert!(result.future_value == pv as f64);
        }

        #[test]
        fn prop_zero_rate_is_linear(
            pv in 0u32..5_000_000,
            contribution in 0u32..100_000,
            months in 0i32..600
        ) {
            let result = growth(pv as f64, contribution as f64, 0.0, months);
            let expected = pv as f64 + contribution as f64 * months as f64;
            prop_assert!((result.future_value - expected).abs() <= 1e-6 * expected.max(1.0));
        }

        #[test]
        fn prop_growth_decomposes_into_contributions_and_growth(
            pv in 0u32..5_000_000,
            contribution in 0u32..100_000,
            rate_bp in -9_000i32..3_000,
            months in 0i32..600
        ) {
            let result = growth(pv as f64, contribution as f64, rate_bp as f64 / 100.0, months);
            let recombined = result.total_contributed + result.total_growth;
            prop_assert!(
                (result.future_value - recombined).abs() <= 1e-6 * result.future_value.abs().max(1.0)
            );
        }

        #[test]
        fn prop_higher_rate_never_reduces_future_value(
            pv in 0u32..2_000_000,
            contribution in 0u32..50_000,
            low_bp in -9_000i32..3_000,
            extra_bp in 0i32..2_000,
            months in 0i32..480
        ) {
            let low = growth(pv as f64, contribution as f64, low_bp as f64 / 100.0, months);
            let high = growth(
                pv as f64,
                contribution as f64,
                (low_bp + extra_bp) as f64 / 100.0,
                months,
            );
            prop_assert!(high.future_value >= low.future_value - 1e-9 * low.future_value.abs().max(1.0));
        }
    }
}
