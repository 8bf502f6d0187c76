use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use serde::Serialize;

use crate::config::ServeArgs;
use crate::core::{
    CorpusMethod, DEFAULT_MONTE_CARLO_TRIALS, DEFAULT_WITHDRAWAL_RATE_PERCENT,
    DEFAULT_WITHDRAWAL_YEARS, GoalSolveParameters, GrowthParameters, LoanParameters,
    MonteCarloParameters, RetirementParameters, calculate_loan, plan_retirement, project_growth,
    run_monte_carlo_with_seed, solve_goal,
};

#[derive(Parser, Debug)]
#[command(
    name = "wealthcalc",
    about = "Financial projection calculators: SIP growth, goal contributions, retirement, loan EMI and Monte Carlo"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Future value of a lump sum plus monthly SIP contributions
    Sip(SipArgs),
    /// Monthly contribution required to reach a target amount
    Goal(GoalArgs),
    /// Retirement corpus projection and required savings
    Retirement(RetirementArgs),
    /// Loan EMI, totals and extra-payment savings
    Loan(LoanArgs),
    /// Monte Carlo distribution of final balances
    MonteCarlo(MonteCarloArgs),
}

#[derive(Args, Debug)]
pub struct SipArgs {
    #[arg(long, default_value_t = 0.0)]
    present_value: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(long, allow_hyphen_values = true, help = "Expected annual return in percent, e.g. 12")]
    annual_return_rate: f64,
    #[arg(long)]
    months: i32,
}

impl From<SipArgs> for GrowthParameters {
    fn from(args: SipArgs) -> Self {
        GrowthParameters {
            present_value: args.present_value,
            monthly_contribution: args.monthly_contribution,
            annual_return_rate_percent: args.annual_return_rate,
            months: args.months,
        }
    }
}

#[derive(Args, Debug)]
pub struct GoalArgs {
    #[arg(long, default_value_t = 0.0)]
    present_value: f64,
    #[arg(long)]
    target_amount: f64,
    #[arg(long, allow_hyphen_values = true)]
    annual_return_rate: f64,
    #[arg(long)]
    months: i32,
}

impl From<GoalArgs> for GoalSolveParameters {
    fn from(args: GoalArgs) -> Self {
        GoalSolveParameters {
            present_value: args.present_value,
            target_amount: args.target_amount,
            annual_return_rate_percent: args.annual_return_rate,
            months: args.months,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliCorpusMethod {
    Years,
    WithdrawalRate,
}

impl From<CliCorpusMethod> for CorpusMethod {
    fn from(value: CliCorpusMethod) -> Self {
        match value {
            CliCorpusMethod::Years => CorpusMethod::Years,
            CliCorpusMethod::WithdrawalRate => CorpusMethod::WithdrawalRate,
        }
    }
}

#[derive(Args, Debug)]
pub struct RetirementArgs {
    #[arg(long)]
    current_age: u32,
    #[arg(long)]
    retirement_age: u32,
    #[arg(long, default_value_t = 0.0)]
    current_savings: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(long, allow_hyphen_values = true)]
    annual_return_rate: f64,
    #[arg(long, help = "Desired monthly income in today's money")]
    desired_monthly_income: f64,
    #[arg(long, default_value_t = DEFAULT_WITHDRAWAL_YEARS)]
    withdrawal_years: u32,
    #[arg(long, default_value_t = DEFAULT_WITHDRAWAL_RATE_PERCENT)]
    withdrawal_rate: f64,
    #[arg(long, value_enum, default_value_t = CliCorpusMethod::Years)]
    corpus_method: CliCorpusMethod,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual inflation in percent; when omitted income is not inflated"
    )]
    inflation_rate: Option<f64>,
}

impl From<RetirementArgs> for RetirementParameters {
    fn from(args: RetirementArgs) -> Self {
        RetirementParameters {
            current_age: args.current_age,
            retirement_age: args.retirement_age,
            current_savings: args.current_savings,
            monthly_contribution: args.monthly_contribution,
            annual_return_rate_percent: args.annual_return_rate,
            desired_monthly_income: args.desired_monthly_income,
            withdrawal_years: args.withdrawal_years,
            withdrawal_rate_percent: args.withdrawal_rate,
            corpus_method: args.corpus_method.into(),
            inflation_rate_percent: args.inflation_rate,
        }
    }
}

#[derive(Args, Debug)]
pub struct LoanArgs {
    #[arg(long)]
    principal: f64,
    #[arg(long, allow_hyphen_values = true)]
    annual_interest_rate: f64,
    #[arg(long)]
    tenure_months: i32,
    #[arg(long, default_value_t = 0.0)]
    extra_monthly_payment: f64,
}

impl From<LoanArgs> for LoanParameters {
    fn from(args: LoanArgs) -> Self {
        LoanParameters {
            principal: args.principal,
            annual_interest_rate_percent: args.annual_interest_rate,
            tenure_months: args.tenure_months,
            extra_monthly_payment: args.extra_monthly_payment,
        }
    }
}

#[derive(Args, Debug)]
pub struct MonteCarloArgs {
    #[arg(long, default_value_t = 0.0)]
    present_value: f64,
    #[arg(long, default_value_t = 0.0)]
    monthly_contribution: f64,
    #[arg(long, allow_hyphen_values = true)]
    expected_annual_return: f64,
    #[arg(long, default_value_t = 15.0)]
    annual_volatility: f64,
    #[arg(long)]
    months: i32,
    #[arg(long, default_value_t = DEFAULT_MONTE_CARLO_TRIALS)]
    trials: i32,
    #[arg(long)]
    target_amount: Option<f64>,
    #[arg(long, help = "Seed for reproducible runs; random when omitted")]
    seed: Option<u64>,
}

/// Runs a one-shot calculator subcommand and renders its result as JSON.
pub fn run_calculator(command: Command) -> anyhow::Result<String> {
    match command {
        Command::Serve(_) => anyhow::bail!("serve is not a calculator command"),
        Command::Sip(args) => to_json(&project_growth(&args.into())?),
        Command::Goal(args) => to_json(&solve_goal(&args.into())?),
        Command::Retirement(args) => to_json(&plan_retirement(&args.into())?),
        Command::Loan(args) => to_json(&calculate_loan(&args.into())?),
        Command::MonteCarlo(args) => {
            let seed = args.seed.unwrap_or_else(rand::random);
            let params = MonteCarloParameters {
                present_value: args.present_value,
                monthly_contribution: args.monthly_contribution,
                expected_annual_return_percent: args.expected_annual_return,
                annual_volatility_percent: args.annual_volatility,
                months: args.months,
                trials: args.trials,
                target_amount: args.target_amount,
            };
            debug!("monte carlo seed {seed}");
            to_json(&run_monte_carlo_with_seed(&params, seed)?)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
