use tracing::debug;

use super::solver::{effective_monthly_rate, solve_contribution, solve_months};
use super::types::{
    AnnualDataPoint, CalculationMode, MonthlyDataPoint, SimulationInput, SimulationResult,
    SolveOutcome,
};

/// Degenerate solves collapse to zero and are reported through `outcome`.
pub fn simulate(input: &SimulationInput) -> SimulationResult {
    let monthly_rate = effective_monthly_rate(input.interest_rate, input.rate_period);

    let (months, contribution, raw_solution, outcome) = match input.mode {
        CalculationMode::SolveForTime => {
            let solved = solve_months(
                input.initial_value,
                input.monthly_contribution,
                monthly_rate,
            );
            (
                solved.value,
                input.monthly_contribution.max(0.0),
                solved.raw,
                solved.outcome,
            )
        }
        CalculationMode::SolveForContribution => match input.horizon_months() {
            Some(months) => {
                let solved = solve_contribution(input.initial_value, months, monthly_rate);
                (months, solved.value, solved.raw, solved.outcome)
            }
            None => (0, 0.0, f64::NAN, SolveOutcome::Unreachable),
        },
    };

    let history = build_monthly_history(input.initial_value, contribution, monthly_rate, months);
    let annual_history = build_annual_history(&history, months);

    let last = history[history.len() - 1];
    debug!(
        mode = ?input.mode,
        outcome = ?outcome,
        months,
        contribution,
        "simulation finished"
    );

    SimulationResult {
        total_final: last.total_accumulated,
        total_invested: last.total_invested,
        total_interest: last.total_interest,
        monthly_contribution: contribution,
        period_in_months: months,
        monthly_rate,
        outcome,
        raw_solution,
        history,
        annual_history,
    }
}

fn build_monthly_history(
    initial_value: f64,
    contribution: f64,
    monthly_rate: f64,
    months: u32,
) -> Vec<MonthlyDataPoint> {
    let mut history = Vec::with_capacity(months as usize + 1);
    let mut accumulated = initial_value;
    let mut invested = initial_value;
    let mut interest = 0.0;

    history.push(MonthlyDataPoint {
        month: 0,
        total_accumulated: accumulated,
        total_invested: invested,
        total_interest: interest,
    });

    for month in 1..=months {
        let interest_of_month = accumulated * monthly_rate;
        interest += interest_of_month;
        invested += contribution;
        accumulated += interest_of_month + contribution;
        history.push(MonthlyDataPoint {
            month,
            total_accumulated: accumulated,
            total_invested: invested,
            total_interest: interest,
        });
    }

    history
}

/// Year buckets over the monthly series. The last bucket is truncated to the
/// final month and may cover fewer than 12 months.
fn build_annual_history(history: &[MonthlyDataPoint], months: u32) -> Vec<AnnualDataPoint> {
    let years = months.div_ceil(12);
    (1..=years)
        .map(|year| {
            let end = history[(year * 12).min(months) as usize];
            let start = history[((year - 1) * 12) as usize];
            AnnualDataPoint {
                year,
                annual_investment: end.total_invested - start.total_invested,
                annual_interest: end.total_interest - start.total_interest,
                total_invested: end.total_invested,
                total_interest: end.total_interest,
                total_accumulated: end.total_accumulated,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GOAL, HorizonUnit, RatePeriod};
    use proptest::prelude::{any, prop_assert, prop_assert_eq, prop_assume, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_approx_rel(actual: f64, expected: f64, rel: f64) {
        let tol = rel * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn contribution_input(initial: f64, rate: f64, years: f64) -> SimulationInput {
        SimulationInput {
            mode: CalculationMode::SolveForContribution,
            initial_value: initial,
            monthly_contribution: 0.0,
            interest_rate: rate,
            rate_period: RatePeriod::Annual,
            horizon_length: years,
            horizon_unit: HorizonUnit::Years,
        }
    }

    fn time_input(initial: f64, contribution: f64, rate: f64) -> SimulationInput {
        SimulationInput {
            mode: CalculationMode::SolveForTime,
            initial_value: initial,
            monthly_contribution: contribution,
            interest_rate: rate,
            rate_period: RatePeriod::Annual,
            horizon_length: 0.0,
            horizon_unit: HorizonUnit::Years,
        }
    }

    fn assert_result_invariants(result: &SimulationResult, initial: f64) {
        assert_eq!(result.history.len(), result.period_in_months as usize + 1);
        assert_eq!(
            result.annual_history.len(),
            result.period_in_months.div_ceil(12) as usize
        );
        assert_approx(result.history[0].total_accumulated, initial);
        assert_approx(result.history[0].total_invested, initial);
        assert_eq!(result.history[0].total_interest, 0.0);
        assert_approx_rel(
            result.total_final,
            result.total_invested + result.total_interest,
            1e-9,
        );
        for point in &result.history {
            assert_approx_rel(
                point.total_accumulated,
                point.total_invested + point.total_interest,
                1e-9,
            );
        }
    }

    #[test]
    fn scenario_twenty_years_at_ten_percent_from_zero() {
        let result = simulate(&contribution_input(0.0, 10.0, 20.0));

        assert_eq!(result.outcome, SolveOutcome::Solved);
        assert_eq!(result.period_in_months, 240);
        assert_approx_rel(result.monthly_rate, 0.007_974_14, 1e-6);
        assert!(
            result.monthly_contribution > 100.0 && result.monthly_contribution < 3_000.0,
            "contribution {}",
            result.monthly_contribution
        );
        assert_approx_rel(result.total_final, GOAL, 1e-9);
        assert_approx_rel(result.history[240].total_accumulated, GOAL, 1e-9);
        assert_approx(
            result.total_invested,
            result.monthly_contribution * 240.0,
        );
        for pair in result.history.windows(2) {
            assert!(pair[1].total_accumulated >= pair[0].total_accumulated);
            assert!(pair[1].total_invested >= pair[0].total_invested);
            assert!(pair[1].total_interest >= pair[0].total_interest);
        }
        assert_result_invariants(&result, 0.0);
    }

    #[test]
    fn scenario_no_balance_no_contribution_clamps_months() {
        for rate in [0.0, 5.0, 12.0] {
            let result = simulate(&time_input(0.0, 0.0, rate));
            assert_eq!(result.period_in_months, 0);
            assert_eq!(result.outcome, SolveOutcome::Unreachable);
            assert_eq!(result.history.len(), 1);
            assert!(result.annual_history.is_empty());
            assert_eq!(result.total_final, 0.0);
        }
    }

    #[test]
    fn scenario_goal_already_met_clamps_months() {
        let result = simulate(&time_input(1_000_000.0, 1_000.0, 8.0));
        assert_eq!(result.period_in_months, 0);
        assert_eq!(result.outcome, SolveOutcome::GoalAlreadyMet);
        assert_approx(result.total_final, 1_000_000.0);
        assert_approx(result.total_invested, 1_000_000.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[test]
    fn solve_for_time_ignores_horizon_and_reaches_goal() {
        let mut input = time_input(50_000.0, 2_000.0, 9.0);
        input.horizon_length = 3.0;
        let result = simulate(&input);

        assert_eq!(result.outcome, SolveOutcome::Solved);
        assert!(result.period_in_months > 36);
        assert!(result.total_final >= GOAL - EPS);
        let before_last = result.history[result.period_in_months as usize - 1];
        assert!(before_last.total_accumulated < GOAL);
        assert_approx(result.monthly_contribution, 2_000.0);
        assert_result_invariants(&result, 50_000.0);
    }

    #[test]
    fn solve_for_contribution_ignores_given_contribution() {
        let mut input = contribution_input(10_000.0, 6.0, 30.0);
        input.monthly_contribution = 99_999.0;
        let result = simulate(&input);
        assert!(result.monthly_contribution < 99_999.0);
        assert_approx_rel(result.total_final, GOAL, 1e-9);
    }

    #[test]
    fn monthly_rate_and_month_unit_are_respected() {
        let input = SimulationInput {
            mode: CalculationMode::SolveForContribution,
            initial_value: 0.0,
            monthly_contribution: 0.0,
            interest_rate: 1.0,
            rate_period: RatePeriod::Monthly,
            horizon_length: 30.0,
            horizon_unit: HorizonUnit::Months,
        };
        let result = simulate(&input);
        assert_eq!(result.period_in_months, 30);
        assert_approx(result.monthly_rate, 0.01);
        assert_eq!(result.annual_history.len(), 3);
        assert_approx_rel(result.total_final, GOAL, 1e-9);
    }

    #[test]
    fn fractional_horizon_is_floored_to_whole_months() {
        let result = simulate(&contribution_input(0.0, 5.0, 1.55));
        assert_eq!(result.period_in_months, 18);
        assert_approx_rel(result.total_final, GOAL, 1e-9);
    }

    #[test]
    fn partial_final_year_is_not_rounded_up() {
        let input = SimulationInput {
            horizon_length: 27.0,
            horizon_unit: HorizonUnit::Months,
            ..contribution_input(1_000.0, 7.0, 0.0)
        };
        let result = simulate(&input);
        assert_eq!(result.annual_history.len(), 3);

        let last = result.annual_history[2];
        assert_eq!(last.year, 3);
        assert_approx(last.annual_investment, result.monthly_contribution * 3.0);
        assert_approx(last.total_accumulated, result.history[27].total_accumulated);
        assert_approx(
            last.annual_interest,
            result.history[27].total_interest - result.history[24].total_interest,
        );
    }

    #[test]
    fn annual_points_are_derived_from_monthly_series() {
        let result = simulate(&contribution_input(20_000.0, 8.0, 5.0));
        for point in &result.annual_history {
            let end = result.history[(point.year * 12) as usize];
            let start = result.history[((point.year - 1) * 12) as usize];
            assert_eq!(point.total_invested, end.total_invested);
            assert_eq!(point.total_interest, end.total_interest);
            assert_eq!(point.total_accumulated, end.total_accumulated);
            assert_eq!(
                point.annual_investment,
                end.total_invested - start.total_invested
            );
            assert_eq!(point.annual_interest, end.total_interest - start.total_interest);
        }
    }

    #[test]
    fn zero_rate_growth_is_linear() {
        let result = simulate(&time_input(100_000.0, 2_500.0, 0.0));
        assert_eq!(result.period_in_months, 360);
        for point in &result.history {
            assert_approx(
                point.total_accumulated,
                100_000.0 + point.month as f64 * 2_500.0,
            );
            assert_eq!(point.total_interest, 0.0);
        }
    }

    #[test]
    fn composition_splits_final_total() {
        let result = simulate(&contribution_input(0.0, 10.0, 20.0));
        let composition = result.composition();
        assert_approx(composition.invested_share + composition.interest_share, 1.0);
        assert!(composition.interest_share > 0.5);

        let empty = simulate(&time_input(0.0, 0.0, 0.0)).composition();
        assert_eq!(empty.invested_share, 0.0);
        assert_eq!(empty.interest_share, 0.0);
    }

    #[test]
    fn horizon_beyond_limit_is_unreachable_not_truncated() {
        let result = simulate(&contribution_input(0.0, 1.0, 5_000.0));
        assert_eq!(result.outcome, SolveOutcome::Unreachable);
        assert_eq!(result.period_in_months, 0);
        assert_eq!(result.monthly_contribution, 0.0);
        assert!(result.raw_solution.is_nan());
        assert_eq!(result.history.len(), 1);
        assert_eq!(result.total_final, 0.0);

        let at_limit = simulate(&contribution_input(0.0, 1.0, 1_200.0));
        assert_eq!(at_limit.outcome, SolveOutcome::Solved);
        assert_eq!(at_limit.period_in_months, crate::core::MAX_MONTHS);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_totals_and_series_are_consistent(
            initial in 0u32..900_000,
            contribution in 1u32..20_000,
            rate_bp in 0u32..2_000,
            monthly_rate in any::<bool>(),
            solve_for_time in any::<bool>(),
            horizon in 1u32..480,
        ) {
            let input = SimulationInput {
                mode: if solve_for_time {
                    CalculationMode::SolveForTime
                } else {
                    CalculationMode::SolveForContribution
                },
                initial_value: initial as f64,
                monthly_contribution: contribution as f64,
                interest_rate: if monthly_rate { rate_bp as f64 / 1_000.0 } else { rate_bp as f64 / 100.0 },
                rate_period: if monthly_rate { RatePeriod::Monthly } else { RatePeriod::Annual },
                horizon_length: horizon as f64,
                horizon_unit: HorizonUnit::Months,
            };
            let result = simulate(&input);
            let months = result.period_in_months as usize;

            prop_assert_eq!(result.history.len(), months + 1);
            prop_assert_eq!(result.annual_history.len(), months.div_ceil(12));
            prop_assert!(result.monthly_contribution >= 0.0);
            prop_assert!(result.monthly_contribution.is_finite());

            let tol = 1e-6 * result.total_final.abs().max(1.0);
            prop_assert!((result.total_final - (result.total_invested + result.total_interest)).abs() <= tol);

            let invested_sum: f64 = result.annual_history.iter().map(|p| p.annual_investment).sum();
            let interest_sum: f64 = result.annual_history.iter().map(|p| p.annual_interest).sum();
            prop_assert!((invested_sum - (result.total_invested - input.initial_value)).abs() <= tol);
            prop_assert!((interest_sum - result.total_interest).abs() <= tol);

            for pair in result.history.windows(2) {
                prop_assert!(pair[1].total_accumulated >= pair[0].total_accumulated);
                prop_assert!(pair[1].total_invested >= pair[0].total_invested);
                prop_assert!(pair[1].total_interest >= pair[0].total_interest);
            }
        }

        #[test]
        fn prop_contribution_then_time_round_trips(
            initial in 0u32..200_000,
            rate_bp in 0u32..1_500,
            horizon in 12u32..480,
        ) {
            let rate = rate_bp as f64 / 100.0;
            let by_contribution = simulate(&SimulationInput {
                horizon_length: horizon as f64,
                horizon_unit: HorizonUnit::Months,
                ..contribution_input(initial as f64, rate, 0.0)
            });
            prop_assume!(by_contribution.outcome == SolveOutcome::Solved);
            prop_assume!(by_contribution.monthly_contribution > 1.0);

            let by_time = simulate(&time_input(
                initial as f64,
                by_contribution.monthly_contribution,
                rate,
            ));
            let diff = by_time.period_in_months as i64 - horizon as i64;
            prop_assert!(diff.abs() <= 1, "horizon {} solved back to {}", horizon, by_time.period_in_months);
        }

        #[test]
        fn prop_zero_rate_is_linear(
            initial in 0u32..500_000,
            contribution in 500u32..50_000,
        ) {
            let result = simulate(&time_input(initial as f64, contribution as f64, 0.0));
            for point in &result.history {
                let expected = initial as f64 + point.month as f64 * contribution as f64;
                prop_assert!((point.total_accumulated - expected).abs() <= 1e-6 * expected.max(1.0));
            }
        }
    }
}
