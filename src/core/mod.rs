mod engine;
mod format;
mod solver;
mod types;

pub use engine::simulate;
pub use format::{format_currency, format_duration};
pub use solver::{contribution_for_goal, effective_monthly_rate, months_to_goal};
pub use types::{
    AnnualDataPoint, CalculationMode, Composition, GOAL, HorizonUnit, MAX_MONTHS,
    MonthlyDataPoint, RatePeriod, SimulationInput, SimulationResult, SolveOutcome,
};
