use std::collections::BTreeMap;

use super::amortization::remaining_balance;
use super::error::{Error, Result};
use super::tax::{TaxBreakdown, tax_breakdown, total_tax};
use super::types::{
    ExpenseCategory, Frequency, IncomeType, RealEstateProperty, RetirementSettings, ScenarioData,
    WealthProjection,
};

/// Household age in projection year 0; year `n` is age `30 + n`.
pub const BASELINE_AGE: u32 = 30;

/// Longest horizon accepted from callers outside the crate.
pub const MAX_PROJECTION_YEARS: u32 = 200;

const PROPERTY_TAX_GROWTH_RATE: f64 = 2.0;
const MAINTENANCE_GROWTH_RATE: f64 = 3.0;

struct ScheduledExpense {
    expense: ExpenseCategory,
    /// Set for lines generated from a property; the line is skipped before
    /// the property is bought.
    purchase_year: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RealEstatePosition {
    value: f64,
    equity: f64,
    loan_balance: f64,
}

pub fn validate_horizon(years: u32) -> Result<()> {
    if years > MAX_PROJECTION_YEARS {
        return Err(Error::Input(format!(
            "projectionYears must be <= {MAX_PROJECTION_YEARS}"
        )));
    }
    Ok(())
}

pub fn age_in_year(year: u32) -> u32 {
    BASELINE_AGE + year
}

pub fn is_retired(settings: &RetirementSettings, year: u32) -> bool {
    settings.enabled && age_in_year(year) >= settings.retirement_age
}

/// Carrying costs generated for a property: mortgage, property tax and
/// maintenance. Tax and maintenance are based on the purchase price.
pub fn property_expenses(property: &RealEstateProperty) -> Vec<ExpenseCategory> {
    vec![
        ExpenseCategory {
            id: format!("{}-mortgage", property.id),
            name: format!("Mortgage: {}", property.name),
            amount: property.monthly_mortgage_payment() * 12.0,
            frequency: Frequency::Annually,
            growth_rate: 0.0,
            is_fixed: true,
        },
        ExpenseCategory {
            id: format!("{}-property-tax", property.id),
            name: format!("Property tax: {}", property.name),
            amount: property.purchase_price * property.property_tax_rate / 100.0,
            frequency: Frequency::Annually,
            growth_rate: PROPERTY_TAX_GROWTH_RATE,
            is_fixed: false,
        },
        ExpenseCategory {
            id: format!("{}-maintenance", property.id),
            name: format!("Maintenance: {}", property.name),
            amount: property.purchase_price * property.maintenance_rate / 100.0,
            frequency: Frequency::Annually,
            growth_rate: MAINTENANCE_GROWTH_RATE,
            is_fixed: false,
        },
    ]
}

fn expense_schedule(data: &ScenarioData) -> Vec<ScheduledExpense> {
    let user = data.expenses.iter().map(|e| ScheduledExpense {
        expense: e.clone(),
        purchase_year: None,
    });
    let generated = data.properties.iter().flat_map(|p| {
        property_expenses(p)
            .into_iter()
            .map(move |expense| ScheduledExpense {
                expense,
                purchase_year: Some(p.purchase_year),
            })
    });
    user.chain(generated).collect()
}

/// Pre-tax income for a working year grouped by income type. Equity payouts
/// realised in `year` land in the `Equity` bucket.
pub fn income_by_type(data: &ScenarioData, year: u32) -> BTreeMap<IncomeType, f64> {
    let mut buckets = BTreeMap::new();
    for income in &data.incomes {
        *buckets.entry(income.income_type).or_insert(0.0) += income.amount_for_year(year);
    }
    for payout in data.equity_payouts.iter().filter(|p| p.year == year) {
        *buckets.entry(IncomeType::Equity).or_insert(0.0) += payout.amount;
    }
    buckets
}

fn total_expenses(schedule: &[ScheduledExpense], year: u32) -> f64 {
    schedule
        .iter()
        .filter(|line| line.purchase_year.is_none_or(|bought| bought <= year))
        .map(|line| line.expense.amount_for_year(year))
        .sum()
}

fn real_estate_position(properties: &[RealEstateProperty], year: u32) -> RealEstatePosition {
    let mut position = RealEstatePosition::default();
    for property in properties.iter().filter(|p| p.is_owned_in(year)) {
        let years_owned = property.years_owned(year);
        let value = property.purchase_price
            * (1.0 + property.appreciation_rate / 100.0).powi(years_owned as i32 - 1);
        let balance = remaining_balance(
            property.loan_amount,
            property.interest_rate,
            property.loan_term_years,
            years_owned as f64 * 12.0,
        );
        position.value += value;
        position.loan_balance += balance;
        // Each property's equity is reduced by the running loan total, not
        // its own balance.
        position.equity += value - position.loan_balance.max(0.0);
    }
    position
}

fn project_year(
    data: &ScenarioData,
    expenses: &[ScheduledExpense],
    year: u32,
    prior_wealth: f64,
) -> WealthProjection {
    let retired = is_retired(&data.retirement, year);

    let (gross_income, taxes) = if retired {
        (0.0, 0.0)
    } else {
        let buckets = income_by_type(data, year);
        let gross: f64 = buckets.values().sum();
        let taxes: f64 = buckets
            .iter()
            .filter(|(_, amount)| **amount > 0.0)
            .map(|(kind, amount)| total_tax(*amount, *kind, &data.state, data.filing_status))
            .sum();
        (gross, taxes)
    };
    let net_income = gross_income - taxes;
    let total_expenses = total_expenses(expenses, year);
    let real_estate = real_estate_position(&data.properties, year);

    let savings = if retired {
        -(prior_wealth + real_estate.equity) * data.retirement.withdrawal_rate / 100.0
    } else {
        net_income - total_expenses
    };

    // Real-estate equity is added in full every year, not as a delta.
    let cumulative_wealth =
        prior_wealth * (1.0 + data.investment_return / 100.0) + savings + real_estate.equity;

    WealthProjection {
        year,
        gross_income,
        net_income,
        total_expenses,
        savings,
        cumulative_wealth,
        taxes,
        real_estate_value: real_estate.value,
        real_estate_equity: real_estate.equity,
        loan_balance: real_estate.loan_balance,
    }
}

/// Year-by-year projection for `data.projection_years` years.
pub fn project(data: &ScenarioData) -> Vec<WealthProjection> {
    log::debug!(
        "projecting {} years: {} incomes, {} expenses, {} properties",
        data.projection_years,
        data.incomes.len(),
        data.expenses.len(),
        data.properties.len()
    );

    let expenses = expense_schedule(data);
    let mut results = Vec::new();
    let mut wealth = data.initial_wealth;
    for year in 1..=data.projection_years {
        let row = project_year(data, &expenses, year, wealth);
        wealth = row.cumulative_wealth;
        results.push(row);
    }
    results
}

/// Federal and state tax per projection year, accumulated with the split
/// form of the tax engine. Retired years owe nothing.
pub fn project_tax_breakdown(data: &ScenarioData) -> Vec<TaxBreakdown> {
    (1..=data.projection_years)
        .map(|year| {
            let mut total = TaxBreakdown::default();
            if is_retired(&data.retirement, year) {
                return total;
            }
            for (kind, amount) in income_by_type(data, year) {
                if amount > 0.0 {
                    total += tax_breakdown(amount, kind, &data.state, data.filing_status);
                }
            }
            total
        })
        .collect()
}
