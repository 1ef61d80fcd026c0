//! Month-by-month payoff simulation for a portfolio of debts.

use serde::{Deserialize, Serialize};

use super::types::Debt;

/// Hard stop for portfolios whose payments never catch up with interest.
pub const MAX_PAYOFF_MONTHS: u32 = 600;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoffStrategy {
    /// Smallest balance first.
    Snowball,
    /// Highest APR first.
    #[default]
    Avalanche,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtMonth {
    pub debt_id: String,
    pub payment: f64,
    pub interest: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    pub month: u32,
    pub total_payment: f64,
    pub total_interest: f64,
    pub total_balance: f64,
    pub debts: Vec<DebtMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoffPlan {
    pub strategy: PayoffStrategy,
    pub total_interest: f64,
    pub payoff_months: u32,
    /// False when the month cap stopped the simulation with balances left.
    pub converged: bool,
    pub monthly_schedule: Vec<MonthlySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub snowball: DebtPayoffPlan,
    pub avalanche: DebtPayoffPlan,
    pub interest_saved: f64,
    pub time_saved: i64,
}

struct Account {
    id: String,
    balance: f64,
    apr: f64,
    minimum_payment: f64,
}

fn ordered_accounts(debts: &[Debt], strategy: PayoffStrategy) -> Vec<Account> {
    let mut ordered: Vec<&Debt> = debts.iter().collect();
    match strategy {
        PayoffStrategy::Snowball => ordered.sort_by(|a, b| a.balance.total_cmp(&b.balance)),
        PayoffStrategy::Avalanche => ordered.sort_by(|a, b| b.apr.total_cmp(&a.apr)),
    }
    ordered
        .into_iter()
        .map(|d| Account {
            id: d.id.clone(),
            balance: d.balance,
            apr: d.apr,
            minimum_payment: d.minimum_payment,
        })
        .collect()
}

pub fn calculate_payoff_plan(
    debts: &[Debt],
    extra_payment: f64,
    strategy: PayoffStrategy,
) -> DebtPayoffPlan {
    let mut accounts = ordered_accounts(debts, strategy);
    let mut month = 0u32;
    let mut total_interest = 0.0;
    let mut schedule = Vec::new();

    while month < MAX_PAYOFF_MONTHS && accounts.iter().any(|a| a.balance > 0.0) {
        month += 1;
        let mut rows: Vec<DebtMonth> = Vec::with_capacity(accounts.len());
        let mut month_interest = 0.0;

        for account in accounts.iter_mut() {
            let mut row = DebtMonth {
                debt_id: account.id.clone(),
                payment: 0.0,
                interest: 0.0,
                balance: account.balance.max(0.0),
            };
            if account.balance > 0.0 {
                let payment = account.minimum_payment.min(account.balance);
                let interest = account.balance * account.apr / 100.0 / 12.0;
                account.balance = (account.balance - (payment - interest)).max(0.0);
                row.payment = payment;
                row.interest = interest;
                row.balance = account.balance;
                month_interest += interest;
            }
            rows.push(row);
        }

        if extra_payment > 0.0 {
            if let Some(idx) = accounts.iter().position(|a| a.balance > 0.0) {
                let target = &mut accounts[idx];
                let applied = extra_payment.min(target.balance);
                target.balance = (target.balance - applied).max(0.0);
                rows[idx].payment += applied;
                rows[idx].balance = target.balance;
            }
        }

        total_interest += month_interest;
        schedule.push(MonthlySnapshot {
            month,
            total_payment: rows.iter().map(|r| r.payment).sum(),
            total_interest: month_interest,
            total_balance: accounts.iter().map(|a| a.balance).sum(),
            debts: rows,
        });
    }

    let converged = accounts.iter().all(|a| a.balance <= 0.0);
    if !converged {
        log::warn!(
            "{strategy:?} payoff did not converge within {MAX_PAYOFF_MONTHS} months; \
             {:.2} still outstanding",
            accounts.iter().map(|a| a.balance).sum::<f64>()
        );
    }

    DebtPayoffPlan {
        strategy,
        total_interest,
        payoff_months: month,
        converged,
        monthly_schedule: schedule,
    }
}

pub fn compare_strategies(debts: &[Debt], extra_payment: f64) -> StrategyComparison {
    let snowball = calculate_payoff_plan(debts, extra_payment, PayoffStrategy::Snowball);
    let avalanche = calculate_payoff_plan(debts, extra_payment, PayoffStrategy::Avalanche);
    let interest_saved = snowball.total_interest - avalanche.total_interest;
    let time_saved = snowball.payoff_months as i64 - avalanche.payoff_months as i64;
    StrategyComparison {
        snowball,
        avalanche,
        interest_saved,
        time_saved,
    }
}
