//! Simplified US income tax: progressive federal brackets per filing status,
//! progressive tables for California and New York, and flat approximations
//! for every other state.

use serde::Serialize;

use super::types::{FilingStatus, IncomeType};

/// Simplified long-term capital gains rate applied to investment income.
pub const INVESTMENT_FEDERAL_RATE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub min: f64,
    pub max: f64,
    pub rate: f64,
}

const fn bracket(min: f64, max: f64, rate: f64) -> Bracket {
    Bracket { min, max, rate }
}

const INF: f64 = f64::INFINITY;

const SINGLE: [Bracket; 7] = [
    bracket(0.0, 11_600.0, 10.0),
    bracket(11_600.0, 47_150.0, 12.0),
    bracket(47_150.0, 100_525.0, 22.0),
    bracket(100_525.0, 191_950.0, 24.0),
    bracket(191_950.0, 243_725.0, 32.0),
    bracket(243_725.0, 609_350.0, 35.0),
    bracket(609_350.0, INF, 37.0),
];

const MARRIED_FILING_JOINTLY: [Bracket; 7] = [
    bracket(0.0, 23_200.0, 10.0),
    bracket(23_200.0, 94_300.0, 12.0),
    bracket(94_300.0, 201_050.0, 22.0),
    bracket(201_050.0, 383_900.0, 24.0),
    bracket(383_900.0, 487_450.0, 32.0),
    bracket(487_450.0, 731_200.0, 35.0),
    bracket(731_200.0, INF, 37.0),
];

const MARRIED_FILING_SEPARATELY: [Bracket; 7] = [
    bracket(0.0, 11_600.0, 10.0),
    bracket(11_600.0, 47_150.0, 12.0),
    bracket(47_150.0, 100_525.0, 22.0),
    bracket(100_525.0, 191_950.0, 24.0),
    bracket(191_950.0, 243_725.0, 32.0),
    bracket(243_725.0, 365_600.0, 35.0),
    bracket(365_600.0, INF, 37.0),
];

const HEAD_OF_HOUSEHOLD: [Bracket; 7] = [
    bracket(0.0, 16_550.0, 10.0),
    bracket(16_550.0, 63_100.0, 12.0),
    bracket(63_100.0, 100_500.0, 22.0),
    bracket(100_500.0, 191_950.0, 24.0),
    bracket(191_950.0, 243_700.0, 32.0),
    bracket(243_700.0, 609_350.0, 35.0),
    bracket(609_350.0, INF, 37.0),
];

const CALIFORNIA: [Bracket; 9] = [
    bracket(0.0, 10_756.0, 1.0),
    bracket(10_756.0, 25_499.0, 2.0),
    bracket(25_499.0, 40_245.0, 4.0),
    bracket(40_245.0, 55_866.0, 6.0),
    bracket(55_866.0, 70_606.0, 8.0),
    bracket(70_606.0, 360_659.0, 9.3),
    bracket(360_659.0, 432_787.0, 10.3),
    bracket(432_787.0, 721_314.0, 11.3),
    bracket(721_314.0, INF, 12.3),
];

const NEW_YORK: [Bracket; 9] = [
    bracket(0.0, 8_500.0, 4.0),
    bracket(8_500.0, 11_700.0, 4.5),
    bracket(11_700.0, 13_900.0, 5.25),
    bracket(13_900.0, 80_650.0, 5.5),
    bracket(80_650.0, 215_400.0, 6.0),
    bracket(215_400.0, 1_077_550.0, 6.85),
    bracket(1_077_550.0, 5_000_000.0, 9.65),
    bracket(5_000_000.0, 25_000_000.0, 10.3),
    bracket(25_000_000.0, INF, 10.9),
];

/// Flat approximations keyed by normalized state name (no whitespace,
/// lowercase). States with progressive tables above are listed too but the
/// table wins.
const STATE_TAX_RATES: [(&str, f64); 51] = [
    ("alabama", 5.0),
    ("alaska", 0.0),
    ("arizona", 2.5),
    ("arkansas", 4.4),
    ("california", 9.3),
    ("colorado", 4.4),
    ("connecticut", 6.99),
    ("delaware", 6.6),
    ("districtofcolumbia", 8.5),
    ("florida", 0.0),
    ("georgia", 5.49),
    ("hawaii", 8.25),
    ("idaho", 5.8),
    ("illinois", 4.95),
    ("indiana", 3.05),
    ("iowa", 5.7),
    ("kansas", 5.7),
    ("kentucky", 4.0),
    ("louisiana", 4.25),
    ("maine", 7.15),
    ("maryland", 5.75),
    ("massachusetts", 5.0),
    ("michigan", 4.25),
    ("minnesota", 7.85),
    ("mississippi", 4.7),
    ("missouri", 4.8),
    ("montana", 5.9),
    ("nebraska", 5.84),
    ("nevada", 0.0),
    ("newhampshire", 0.0),
    ("newjersey", 6.37),
    ("newmexico", 4.9),
    ("newyork", 6.85),
    ("northcarolina", 4.5),
    ("northdakota", 2.5),
    ("ohio", 3.5),
    ("oklahoma", 4.75),
    ("oregon", 8.75),
    ("pennsylvania", 3.07),
    ("rhodeisland", 5.99),
    ("southcarolina", 6.4),
    ("southdakota", 0.0),
    ("tennessee", 0.0),
    ("texas", 0.0),
    ("utah", 4.65),
    ("vermont", 6.6),
    ("virginia", 5.75),
    ("washington", 0.0),
    ("westvirginia", 5.12),
    ("wisconsin", 5.3),
    ("wyoming", 0.0),
];

pub fn federal_brackets(filing_status: FilingStatus) -> &'static [Bracket] {
    match filing_status {
        FilingStatus::Single => &SINGLE,
        FilingStatus::MarriedFilingJointly => &MARRIED_FILING_JOINTLY,
        FilingStatus::MarriedFilingSeparately => &MARRIED_FILING_SEPARATELY,
        FilingStatus::HeadOfHousehold => &HEAD_OF_HOUSEHOLD,
    }
}

pub fn normalize_state(state: &str) -> String {
    state
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn state_brackets(normalized: &str) -> Option<&'static [Bracket]> {
    match normalized {
        "california" => Some(&CALIFORNIA),
        "newyork" => Some(&NEW_YORK),
        _ => None,
    }
}

fn state_flat_rate(normalized: &str) -> f64 {
    match STATE_TAX_RATES.iter().find(|(name, _)| *name == normalized) {
        Some((_, rate)) => *rate,
        None => {
            log::debug!("no tax rate registered for state {normalized:?}; using 0%");
            0.0
        }
    }
}

fn progressive_tax(income: f64, brackets: &[Bracket]) -> f64 {
    let mut remaining = income;
    let mut tax = 0.0;
    for b in brackets {
        if remaining <= 0.0 {
            break;
        }
        let taxable = remaining.min(b.max - b.min);
        tax += taxable * b.rate / 100.0;
        remaining -= taxable;
    }
    tax
}

pub fn federal_tax(income: f64, income_type: IncomeType, filing_status: FilingStatus) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    match income_type {
        IncomeType::Investment => income * INVESTMENT_FEDERAL_RATE / 100.0,
        IncomeType::Salary
        | IncomeType::Freelance
        | IncomeType::Equity
        | IncomeType::Other
        | IncomeType::Bonus
        | IncomeType::Rsu => progressive_tax(income, federal_brackets(filing_status)),
    }
}

/// State income tax. Every income type is treated alike at state level.
pub fn state_tax(income: f64, _income_type: IncomeType, state: &str) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    let key = normalize_state(state);
    match state_brackets(&key) {
        Some(brackets) => progressive_tax(income, brackets),
        None => income * state_flat_rate(&key) / 100.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub federal: f64,
    pub state: f64,
}

impl TaxBreakdown {
    pub fn total(self) -> f64 {
        self.federal + self.state
    }
}

impl std::ops::AddAssign for TaxBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.federal += rhs.federal;
        self.state += rhs.state;
    }
}

/// Federal and state tax reported separately.
pub fn tax_breakdown(
    income: f64,
    income_type: IncomeType,
    state: &str,
    filing_status: FilingStatus,
) -> TaxBreakdown {
    TaxBreakdown {
        federal: federal_tax(income, income_type, filing_status),
        state: state_tax(income, income_type, state),
    }
}

pub fn total_tax(
    income: f64,
    income_type: IncomeType,
    state: &str,
    filing_status: FilingStatus,
) -> f64 {
    tax_breakdown(income, income_type, state, filing_status).total()
}

/// Combined tax as a percentage of income; 0 for non-positive income.
pub fn effective_rate(
    income: f64,
    income_type: IncomeType,
    state: &str,
    filing_status: FilingStatus,
) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }
    total_tax(income, income_type, state, filing_status) / income * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    const ALL_STATUSES: [FilingStatus; 4] = [
        FilingStatus::Single,
        FilingStatus::MarriedFilingJointly,
        FilingStatus::MarriedFilingSeparately,
        FilingStatus::HeadOfHousehold,
    ];

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn every_table_has_seven_contiguous_brackets() {
        for status in ALL_STATUSES {
            let table = federal_brackets(status);
            assert_eq!(table.len(), 7);
            let rates: Vec<f64> = table.iter().map(|b| b.rate).collect();
            assert_eq!(rates, vec![10.0, 12.0, 22.0, 24.0, 32.0, 35.0, 37.0]);
            assert_eq!(table[0].min, 0.0);
            assert!(table[6].max.is_infinite());
            for pair in table.windows(2) {
                assert_eq!(pair[0].max, pair[1].min);
            }
        }
    }

    #[test]
    fn single_filer_reference_amounts() {
        // 11600 * 10% + (47150 - 11600) * 12% + (100000 - 47150) * 22%
        let expected = 1_160.0 + 4_266.0 + 11_627.0;
        assert_approx(
            federal_tax(100_000.0, IncomeType::Salary, FilingStatus::Single),
            expected,
        );
    }

    #[test]
    fn investment_income_uses_flat_capital_gains_rate() {
        for status in ALL_STATUSES {
            assert_approx(
                federal_tax(80_000.0, IncomeType::Investment, status),
                12_000.0,
            );
        }
    }

    #[test]
    fn zero_and_negative_income_owe_nothing() {
        for status in ALL_STATUSES {
            assert_eq!(federal_tax(0.0, IncomeType::Salary, status), 0.0);
            assert_eq!(federal_tax(-500.0, IncomeType::Investment, status), 0.0);
            assert_eq!(effective_rate(0.0, IncomeType::Salary, "California", status), 0.0);
        }
        assert_eq!(state_tax(0.0, IncomeType::Salary, "New York"), 0.0);
        assert_eq!(state_tax(-10.0, IncomeType::Salary, "Oregon"), 0.0);
    }

    #[test]
    fn california_uses_progressive_table() {
        let income = 50_000.0;
        let expected = 10_756.0 * 0.01
            + (25_499.0 - 10_756.0) * 0.02
            + (40_245.0 - 25_499.0) * 0.04
            + (50_000.0 - 40_245.0) * 0.06;
        assert_approx(state_tax(income, IncomeType::Salary, "California"), expected);
        assert!(state_tax(income, IncomeType::Salary, "California") < income * 0.093);
    }

    #[test]
    fn state_names_normalize_whitespace_and_case() {
        let spaced = state_tax(90_000.0, IncomeType::Salary, "New York");
        assert_approx(state_tax(90_000.0, IncomeType::Salary, "NewYork"), spaced);
        assert_approx(state_tax(90_000.0, IncomeType::Salary, " new york "), spaced);
        assert_approx(
            state_tax(90_000.0, IncomeType::Salary, "North Carolina"),
            90_000.0 * 0.045,
        );
    }

    #[test]
    fn no_income_tax_and_unknown_states_are_zero() {
        assert_eq!(state_tax(150_000.0, IncomeType::Salary, "Texas"), 0.0);
        assert_eq!(state_tax(150_000.0, IncomeType::Salary, "Atlantis"), 0.0);
        assert_eq!(state_tax(150_000.0, IncomeType::Salary, ""), 0.0);
    }

    #[test]
    fn effective_rate_is_total_over_income() {
        let income = 120_000.0;
        let total = total_tax(income, IncomeType::Salary, "Illinois", FilingStatus::Single);
        assert_approx(
            effective_rate(income, IncomeType::Salary, "Illinois", FilingStatus::Single),
            total / income * 100.0,
        );
    }

    #[test]
    fn marginal_rate_just_above_each_boundary_is_bracket_rate() {
        for status in ALL_STATUSES {
            for b in federal_brackets(status) {
                let lo = federal_tax(b.min + 1.0, IncomeType::Salary, status);
                let hi = federal_tax(b.min + 2.0, IncomeType::Salary, status);
                assert!(
                    ((hi - lo) - b.rate / 100.0).abs() < 1e-6,
                    "{status:?} bracket starting at {} should be marginal {}%",
                    b.min,
                    b.rate
                );
            }
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_federal_tax_is_non_decreasing_and_continuous(
            cents in 0u64..200_000_000,
            step_cents in 1u64..10_000,
            status_idx in 0usize..4
        ) {
            let status = ALL_STATUSES[status_idx];
            let income = cents as f64 / 100.0;
            let step = step_cents as f64 / 100.0;
            let a = federal_tax(income, IncomeType::Salary, status);
            let b = federal_tax(income + step, IncomeType::Salary, status);
            prop_assert!(b >= a);
            prop_assert!(b - a <= step * 0.37 + 1e-6);
        }

        #[test]
        fn prop_split_sums_to_total(
            cents in 0u64..500_000_000,
            status_idx in 0usize..4,
            state_idx in 0usize..5
        ) {
            let states = ["California", "New York", "Texas", "Oregon", "Nowhere"];
            let income = cents as f64 / 100.0;
            let status = ALL_STATUSES[status_idx];
            let split = tax_breakdown(income, IncomeType::Bonus, states[state_idx], status);
            let total = total_tax(income, IncomeType::Bonus, states[state_idx], status);
            prop_assert!((split.federal + split.state - total).abs() <= 1e-9);
        }
    }
}
