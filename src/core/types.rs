use serde::{Deserialize, Serialize};

pub const DEFAULT_WITHDRAWAL_YEARS: u32 = 25;
pub const DEFAULT_WITHDRAWAL_RATE_PERCENT: f64 = 4.0;
pub const DEFAULT_MONTE_CARLO_TRIALS: i32 = 1000;

fn default_withdrawal_years() -> u32 {
    DEFAULT_WITHDRAWAL_YEARS
}

fn default_withdrawal_rate_percent() -> f64 {
    DEFAULT_WITHDRAWAL_RATE_PERCENT
}

fn default_monte_carlo_trials() -> i32 {
    DEFAULT_MONTE_CARLO_TRIALS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthParameters {
    pub present_value: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate_percent: f64,
    pub months: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResult {
    pub future_value: f64,
    pub total_contributed: f64,
    pub total_growth: f64,
}

/// One month of a growth projection, used for charting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionPoint {
    pub month: i32,
    pub value: f64,
    pub contributed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveParameters {
    pub present_value: f64,
    pub target_amount: f64,
    pub annual_return_rate_percent: f64,
    pub months: i32,
}

/// `achievable == false` means there is no time left to invest and the
/// present value alone falls short; callers must check the flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub required_monthly_contribution: f64,
    pub achievable: bool,
    pub future_value_of_present: f64,
    pub remaining_after_growth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredReturnParameters {
    pub present_value: f64,
    pub monthly_contribution: f64,
    pub target_amount: f64,
    pub months: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSearchConfig {
    pub search_min_percent: f64,
    pub search_max_percent: f64,
    pub tolerance_percent: f64,
    pub max_iterations: u32,
}

impl Default for RateSearchConfig {
    fn default() -> Self {
        Self {
            search_min_percent: -50.0,
            search_max_percent: 100.0,
            tolerance_percent: 1e-6,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSearchIteration {
    pub iteration: u32,
    pub lower_bound_percent: f64,
    pub upper_bound_percent: f64,
    pub candidate_percent: f64,
    pub future_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredReturnResult {
    pub solved_rate_percent: Option<f64>,
    pub future_value_at_solution: Option<f64>,
    pub feasible: bool,
    pub converged: bool,
    pub iterations: Vec<RateSearchIteration>,
    pub message: String,
}

/// Which of the two corpus-sizing formulas drives a retirement plan.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorpusMethod {
    #[default]
    #[serde(alias = "byYears", alias = "by_years", alias = "by-years")]
    Years,
    #[serde(
        alias = "withdrawalRate",
        alias = "withdrawal_rate",
        alias = "by-withdrawal-rate"
    )]
    WithdrawalRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementParameters {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_savings: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate_percent: f64,
    pub desired_monthly_income: f64,
    #[serde(default = "default_withdrawal_years")]
    pub withdrawal_years: u32,
    #[serde(default = "default_withdrawal_rate_percent")]
    pub withdrawal_rate_percent: f64,
    #[serde(default)]
    pub corpus_method: CorpusMethod,
    /// When set, desired income is restated in retirement-date money before
    /// the corpus is sized. Absent means no inflation is applied.
    #[serde(default)]
    pub inflation_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementResult {
    pub years_to_retirement: u32,
    pub corpus_at_retirement: f64,
    pub required_corpus: f64,
    pub corpus_sufficient: bool,
    pub shortfall: f64,
    pub possible_monthly_income: f64,
    pub desired_monthly_income_at_retirement: f64,
    pub additional_monthly_contribution_needed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParameters {
    pub principal: f64,
    pub annual_interest_rate_percent: f64,
    pub tenure_months: i32,
    #[serde(default)]
    pub extra_monthly_payment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentOutcome {
    pub months_saved: i32,
    pub interest_saved: f64,
    pub payoff_months: i32,
    pub total_interest_paid: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResult {
    pub monthly_emi: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_extra_payment: Option<ExtraPaymentOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: i32,
    pub payment: f64,
    pub principal_paid: f64,
    pub interest_paid: f64,
    pub balance: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthSweepAxis {
    #[serde(alias = "returnRate", alias = "return_rate", alias = "rate")]
    ReturnRate,
    #[serde(
        alias = "monthlyContribution",
        alias = "monthly_contribution",
        alias = "contribution"
    )]
    MonthlyContribution,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalSweepAxis {
    #[serde(alias = "returnRate", alias = "return_rate", alias = "rate")]
    ReturnRate,
    #[serde(alias = "targetAmount", alias = "target_amount", alias = "target")]
    TargetAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSweepParameters {
    pub base: GrowthParameters,
    pub axis: GrowthSweepAxis,
    pub variants: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSweepParameters {
    pub base: GoalSolveParameters,
    pub axis: GoalSweepAxis,
    pub variants: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepEntry<T> {
    pub variant_value: f64,
    pub result: T,
}

/// Entries are in the same order as the input variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioSweepResult<T> {
    pub entries: Vec<SweepEntry<T>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloParameters {
    pub present_value: f64,
    pub monthly_contribution: f64,
    pub expected_annual_return_percent: f64,
    pub annual_volatility_percent: f64,
    pub months: i32,
    #[serde(default = "default_monte_carlo_trials")]
    pub trials: i32,
    #[serde(default)]
    pub target_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub trials: u32,
    pub mean: f64,
    pub median: f64,
    pub percentile10: f64,
    pub percentile90: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability_of_reaching_target: Option<f64>,
}
