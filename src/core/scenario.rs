use super::engine::project_growth;
use super::error::{ProjectionError, ProjectionResult};
use super::solver::solve_goal;
use super::types::{
    GoalSolveParameters, GoalSolveResult, GoalSweepAxis, GoalSweepParameters, GrowthParameters,
    GrowthResult, GrowthSweepAxis, GrowthSweepParameters, ScenarioSweepResult, SweepEntry,
};

/// Re-runs the growth projection once per variant of a single input.
/// Entries come back in input order; any invalid variant fails the sweep.
pub fn sweep_growth(
    params: &GrowthSweepParameters,
) -> ProjectionResult<ScenarioSweepResult<GrowthResult>> {
    ensure_variants(&params.variants)?;
    sweep(&params.variants, |value| {
        let variant = match params.axis {
            GrowthSweepAxis::ReturnRate => GrowthParameters {
                annual_return_rate_percent: value,
                ..params.base
            },
            GrowthSweepAxis::MonthlyContribution => GrowthParameters {
                monthly_contribution: value,
                ..params.base
            },
        };
        project_growth(&variant)
    })
}

pub fn sweep_goal(
    params: &GoalSweepParameters,
) -> ProjectionResult<ScenarioSweepResult<GoalSolveResult>> {
    ensure_variants(&params.variants)?;
    sweep(&params.variants, |value| {
        let variant = match params.axis {
            GoalSweepAxis::ReturnRate => GoalSolveParameters {
                annual_return_rate_percent: value,
                ..params.base
            },
            GoalSweepAxis::TargetAmount => GoalSolveParameters {
                target_amount: value,
                ..params.base
            },
        };
        solve_goal(&variant)
    })
}

fn sweep<T, F>(variants: &[f64], mut run: F) -> ProjectionResult<ScenarioSweepResult<T>>
where
    F: FnMut(f64) -> ProjectionResult<T>,
{
    let entries = variants
        .iter()
        .map(|&variant_value| {
            run(variant_value).map(|result| SweepEntry {
                variant_value,
                result,
            })
        })
        .collect::<ProjectionResult<Vec<_>>>()?;
    Ok(ScenarioSweepResult { entries })
}

fn ensure_variants(variants: &[f64]) -> ProjectionResult<()> {
    if variants.is_empty() {
        return Err(ProjectionError::invalid(
            "variants",
            "at least one variant value is required",
        ));
    }
    Ok(())
}
