use serde::Serialize;

pub const GOAL: f64 = 1_000_000.0;

/// Longest horizon the engine will simulate (1200 years).
pub const MAX_MONTHS: u32 = 14_400;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CalculationMode {
    #[default]
    SolveForContribution,
    SolveForTime,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RatePeriod {
    #[default]
    Annual,
    Monthly,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizonUnit {
    #[default]
    Years,
    Months,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveOutcome {
    Solved,
    GoalAlreadyMet,
    Unreachable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationInput {
    pub mode: CalculationMode,
    pub initial_value: f64,
    pub monthly_contribution: f64,
    /// Nominal rate in percent.
    pub interest_rate: f64,
    pub rate_period: RatePeriod,
    pub horizon_length: f64,
    pub horizon_unit: HorizonUnit,
}

impl SimulationInput {
    /// Horizon in whole months, or `None` when it is not finite or longer
    /// than [`MAX_MONTHS`].
    pub fn horizon_months(&self) -> Option<u32> {
        let months = match self.horizon_unit {
            HorizonUnit::Years => self.horizon_length * 12.0,
            HorizonUnit::Months => self.horizon_length,
        };
        if !months.is_finite() {
            return None;
        }
        if months <= 0.0 {
            return Some(0);
        }
        let months = months.floor();
        (months <= MAX_MONTHS as f64).then_some(months as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDataPoint {
    pub month: u32,
    pub total_accumulated: f64,
    pub total_invested: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualDataPoint {
    pub year: u32,
    pub annual_investment: f64,
    pub annual_interest: f64,
    pub total_invested: f64,
    pub total_interest: f64,
    pub total_accumulated: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    pub invested_share: f64,
    pub interest_share: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub total_final: f64,
    pub total_invested: f64,
    pub total_interest: f64,
    pub monthly_contribution: f64,
    pub period_in_months: u32,
    pub monthly_rate: f64,
    pub outcome: SolveOutcome,
    /// Solved value before clamping: months or contribution depending on mode.
    pub raw_solution: f64,
    pub history: Vec<MonthlyDataPoint>,
    pub annual_history: Vec<AnnualDataPoint>,
}

impl SimulationResult {
    pub fn composition(&self) -> Composition {
        if self.total_final <= 0.0 || !self.total_final.is_finite() {
            return Composition {
                invested_share: 0.0,
                interest_share: 0.0,
            };
        }
        Composition {
            invested_share: self.total_invested / self.total_final,
            interest_share: self.total_interest / self.total_final,
        }
    }
}
