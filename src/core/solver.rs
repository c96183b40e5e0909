use super::types::{GOAL, MAX_MONTHS, RatePeriod, SolveOutcome};

/// Annual rates use the twelfth root, not a division by twelve.
pub fn effective_monthly_rate(rate_percent: f64, period: RatePeriod) -> f64 {
    match period {
        RatePeriod::Monthly => rate_percent / 100.0,
        RatePeriod::Annual => (1.0 + rate_percent / 100.0).powf(1.0 / 12.0) - 1.0,
    }
}

/// Months needed to reach `goal` from `initial_value` depositing `contribution`
/// each month. Unclamped: may be NaN, infinite or negative.
pub fn months_to_goal(goal: f64, initial_value: f64, contribution: f64, monthly_rate: f64) -> f64 {
    if monthly_rate == 0.0 {
        return ((goal - initial_value) / contribution).ceil();
    }
    let numerator = goal * monthly_rate + contribution;
    let denominator = initial_value * monthly_rate + contribution;
    ((numerator / denominator).ln() / (1.0 + monthly_rate).ln()).ceil()
}

/// Monthly contribution that reaches `goal` after `months`. Unclamped.
pub fn contribution_for_goal(goal: f64, initial_value: f64, months: u32, monthly_rate: f64) -> f64 {
    let n = months as f64;
    if monthly_rate == 0.0 {
        return (goal - initial_value) / n;
    }
    let pow = (1.0 + monthly_rate).powf(n);
    (goal - initial_value * pow) / ((pow - 1.0) / monthly_rate)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clamped<T> {
    pub value: T,
    pub raw: f64,
    pub outcome: SolveOutcome,
}

pub fn solve_months(initial_value: f64, contribution: f64, monthly_rate: f64) -> Clamped<u32> {
    let raw = months_to_goal(GOAL, initial_value, contribution, monthly_rate);
    if initial_value >= GOAL {
        return Clamped {
            value: 0,
            raw,
            outcome: SolveOutcome::GoalAlreadyMet,
        };
    }
    if (0.0..=MAX_MONTHS as f64).contains(&raw) {
        Clamped {
            value: raw as u32,
            raw,
            outcome: SolveOutcome::Solved,
        }
    } else {
        Clamped {
            value: 0,
            raw,
            outcome: SolveOutcome::Unreachable,
        }
    }
}

pub fn solve_contribution(initial_value: f64, months: u32, monthly_rate: f64) -> Clamped<f64> {
    let raw = contribution_for_goal(GOAL, initial_value, months, monthly_rate);
    if initial_value < GOAL && raw.is_finite() && raw >= 0.0 {
        return Clamped {
            value: raw,
            raw,
            outcome: SolveOutcome::Solved,
        };
    }
    // Negative PMT: the initial value outgrows the goal without deposits.
    let already_met = initial_value >= GOAL || (raw.is_finite() && raw < 0.0);
    Clamped {
        value: 0.0,
        raw,
        outcome: if already_met {
            SolveOutcome::GoalAlreadyMet
        } else {
            SolveOutcome::Unreachable
        },
    }
}
