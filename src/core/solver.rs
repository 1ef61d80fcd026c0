use serde::{Deserialize, Serialize};

use super::debt::{PayoffStrategy, calculate_payoff_plan};
use super::error::SolveError;
use super::types::Debt;

/// Bisection steps allowed per solve; f64 halving stalls long before this.
pub const MAX_SOLVER_ITERATIONS: u32 = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentSolveConfig {
    pub target_months: u32,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for ExtraPaymentSolveConfig {
    fn default() -> Self {
        Self {
            target_months: 36,
            search_max: 10_000.0,
            tolerance: 1.0,
            max_iterations: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub payoff_months: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraPaymentSolveResult {
    pub strategy: PayoffStrategy,
    pub target_months: u32,
    pub solved_extra_payment: Option<f64>,
    pub achieved_payoff_months: Option<u32>,
    pub achieved_total_interest: Option<f64>,
    pub iterations: Vec<ExtraPaymentIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

struct CandidateEval {
    payoff_months: u32,
    total_interest: f64,
    meets_target: bool,
}

fn evaluate_candidate(
    debts: &[Debt],
    strategy: PayoffStrategy,
    target_months: u32,
    extra: f64,
) -> CandidateEval {
    let plan = calculate_payoff_plan(debts, extra, strategy);
    CandidateEval {
        payoff_months: plan.payoff_months,
        total_interest: plan.total_interest,
        meets_target: plan.converged && plan.payoff_months <= target_months,
    }
}

/// Smallest extra monthly payment (within `tolerance`) that clears every
/// debt within `target_months` under `strategy`.
pub fn solve_extra_payment(
    debts: &[Debt],
    strategy: PayoffStrategy,
    config: ExtraPaymentSolveConfig,
) -> Result<ExtraPaymentSolveResult, SolveError> {
    validate_config(config)?;

    let target = config.target_months;
    let mut iterations = Vec::new();

    let low_eval = evaluate_candidate(debts, strategy, target, 0.0);
    if low_eval.meets_target {
        return Ok(ExtraPaymentSolveResult {
            strategy,
            target_months: target,
            solved_extra_payment: Some(0.0),
            achieved_payoff_months: Some(low_eval.payoff_months),
            achieved_total_interest: Some(low_eval.total_interest),
            iterations,
            converged: true,
            feasible: true,
            message: "Minimum payments already meet the target".to_string(),
        });
    }

    let high_eval = evaluate_candidate(debts, strategy, target, config.search_max);
    if !high_eval.meets_target {
        return Ok(ExtraPaymentSolveResult {
            strategy,
            target_months: target,
            solved_extra_payment: None,
            achieved_payoff_months: None,
            achieved_total_interest: None,
            iterations,
            converged: false,
            feasible: false,
            message: format!(
                "Even {:.2}/month extra needs {} months",
                config.search_max, high_eval.payoff_months
            ),
        });
    }

    let mut lo = 0.0;
    let mut hi = config.search_max;
    let mut best = high_eval;
    let mut converged = false;

    for iteration in 1..=config.max_iterations {
        let mid = 0.5 * (lo + hi);
        let eval = evaluate_candidate(debts, strategy, target, mid);
        iterations.push(ExtraPaymentIteration {
            iteration,
            lower_bound: lo,
            upper_bound: hi,
            candidate_value: mid,
            payoff_months: eval.payoff_months,
        });

        if eval.meets_target {
            hi = mid;
            best = eval;
        } else {
            lo = mid;
        }

        if hi - lo <= config.tolerance {
            converged = true;
            break;
        }
    }

    log::debug!(
        "extra payment solve ({strategy:?}, {target} months): {hi:.2} after {} iterations",
        iterations.len()
    );

    let message = if converged {
        format!("Pay {hi:.2}/month extra to be debt-free in {} months", best.payoff_months)
    } else {
        format!("Stopped after {} iterations; best bound {hi:.2}", config.max_iterations)
    };

    Ok(ExtraPaymentSolveResult {
        strategy,
        target_months: target,
        solved_extra_payment: Some(hi),
        achieved_payoff_months: Some(best.payoff_months),
        achieved_total_interest: Some(best.total_interest),
        iterations,
        converged,
        feasible: true,
        message,
    })
}

fn validate_config(config: ExtraPaymentSolveConfig) -> Result<(), SolveError> {
    if config.target_months == 0 {
        return Err(SolveError::InvalidConfig(
            "target_months must be > 0".to_string(),
        ));
    }
    if !config.search_max.is_finite() || config.search_max <= 0.0 {
        return Err(SolveError::InvalidConfig(
            "search_max must be a positive number".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::InvalidConfig("tolerance must be > 0".to_string()));
    }
    if config.max_iterations == 0 || config.max_iterations > MAX_SOLVER_ITERATIONS {
        return Err(SolveError::InvalidConfig(format!(
            "max_iterations must be between 1 and {MAX_SOLVER_ITERATIONS}"
        )));
    }
    Ok(())
}
