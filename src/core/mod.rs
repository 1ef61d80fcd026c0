pub mod amortization;
pub(crate) mod coerce;
pub mod debt;
mod engine;
mod error;
pub mod goals;
pub mod monte_carlo;
pub mod scenario;
mod solver;
pub mod tax;
mod types;

pub use debt::{
    DebtPayoffPlan, MAX_PAYOFF_MONTHS, PayoffStrategy, StrategyComparison, calculate_payoff_plan,
    compare_strategies,
};
pub use engine::{
    BASELINE_AGE, MAX_PROJECTION_YEARS, age_in_year, income_by_type, is_retired, project,
    project_tax_breakdown, property_expenses, validate_horizon,
};
pub use error::{Error, Result, ScenarioError, SolveError};
pub use goals::{Goal, GoalMetric, GoalProgress, GoalTracker};
pub use monte_carlo::{MonteCarloParams, MonteCarloResult, PercentileBand, simulate};
pub use scenario::{
    BASE_SCENARIO_ID, Scenario, ScenarioPatch, ScenarioStore, ScenarioSummary, compare_scenarios,
};
pub use solver::{
    ExtraPaymentIteration, ExtraPaymentSolveConfig, ExtraPaymentSolveResult, MAX_SOLVER_ITERATIONS,
    solve_extra_payment,
};
pub use tax::{TaxBreakdown, effective_rate, federal_tax, state_tax, tax_breakdown, total_tax};
pub use types::{
    Debt, EquityPayout, ExpenseCategory, FilingStatus, Frequency, IncomeSource, IncomeType,
    RealEstateProperty, RetirementSettings, ScenarioData, WealthProjection,
};
