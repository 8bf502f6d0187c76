mod engine;
mod error;
mod loan;
mod monte_carlo;
mod retirement;
mod scenario;
mod solver;
mod types;

pub use engine::{
    MAX_SERIES_MONTHS, is_zero_rate, monthly_rate, project_growth, project_growth_series,
    round_currency, round_to,
};
pub use error::{ProjectionError, ProjectionResult};
pub use loan::{MAX_TENURE_MONTHS, amortization_schedule, calculate_loan, monthly_emi};
pub use monte_carlo::{MAX_MONTE_CARLO_TRIALS, run_monte_carlo, run_monte_carlo_with_seed};
pub use retirement::{
    inflate_monthly_income, plan_retirement, possible_monthly_income_by_withdrawal_rate,
    possible_monthly_income_by_years, required_corpus_by_withdrawal_rate,
    required_corpus_by_years,
};
pub use scenario::{sweep_goal, sweep_growth};
pub use solver::{MAX_SEARCH_ITERATIONS, solve_goal, solve_required_return_rate};
pub use types::{
    AmortizationRow, CorpusMethod, DEFAULT_MONTE_CARLO_TRIALS, DEFAULT_WITHDRAWAL_RATE_PERCENT,
    DEFAULT_WITHDRAWAL_YEARS, ExtraPaymentOutcome, GoalSolveParameters, GoalSolveResult,
    GoalSweepAxis, GoalSweepParameters, GrowthParameters, GrowthResult, GrowthSweepAxis,
    GrowthSweepParameters, LoanParameters, LoanResult, MonteCarloParameters, MonteCarloResult,
    ProjectionPoint, RateSearchConfig, RateSearchIteration, RequiredReturnParameters,
    RequiredReturnResult, RetirementParameters, RetirementResult, ScenarioSweepResult, SweepEntry,
};
