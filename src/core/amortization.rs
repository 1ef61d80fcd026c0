//! Fixed-rate loan arithmetic shared by properties and debts.

fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

/// Level monthly payment that retires `principal` over `years`.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, years: f64) -> f64 {
    let n = years * 12.0;
    if n <= 0.0 {
        return 0.0;
    }

    let r = monthly_rate(annual_rate_pct);
    if r == 0.0 {
        return principal / n;
    }

    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

/// Outstanding balance after `months_elapsed` level payments.
pub fn remaining_balance(
    principal: f64,
    annual_rate_pct: f64,
    years: f64,
    months_elapsed: f64,
) -> f64 {
    let n = years * 12.0;
    if n <= 0.0 || months_elapsed >= n {
        return 0.0;
    }
    let m = months_elapsed.max(0.0);

    let r = monthly_rate(annual_rate_pct);
    let balance = if r == 0.0 {
        principal * (1.0 - m / n)
    } else {
        let growth_n = (1.0 + r).powf(n);
        let growth_m = (1.0 + r).powf(m);
        principal * (growth_n - growth_m) / (growth_n - 1.0)
    };

    balance.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn zero_rate_payment_is_straight_line() {
        assert_approx_tol(monthly_payment(12_000.0, 0.0, 1.0), 1_000.0, 1e-9);
        assert_approx_tol(monthly_payment(360_000.0, 0.0, 30.0), 1_000.0, 1e-9);
    }

    #[test]
    fn thirty_year_mortgage_payment_matches_reference() {
        // 400k at 6.5% over 30 years.
        assert_approx_tol(monthly_payment(400_000.0, 6.5, 30.0), 2_528.27, 0.01);
    }

    #[test]
    fn non_positive_term_pays_nothing() {
        assert_eq!(monthly_payment(10_000.0, 5.0, 0.0), 0.0);
        assert_eq!(monthly_payment(10_000.0, 5.0, -2.0), 0.0);
        assert_eq!(remaining_balance(10_000.0, 5.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn balance_is_principal_at_start_and_zero_at_term() {
        assert_approx_tol(remaining_balance(250_000.0, 5.0, 30.0, 0.0), 250_000.0, 1e-6);
        assert_eq!(remaining_balance(250_000.0, 5.0, 30.0, 360.0), 0.0);
        assert_eq!(remaining_balance(250_000.0, 5.0, 30.0, 500.0), 0.0);
    }

    #[test]
    fn zero_rate_balance_declines_linearly() {
        assert_approx_tol(remaining_balance(12_000.0, 0.0, 1.0, 6.0), 6_000.0, 1e-9);
    }

    #[test]
    fn balance_matches_explicit_amortization_schedule() {
        let principal = 30_000.0;
        let rate = 7.2;
        let years = 5.0;
        let payment = monthly_payment(principal, rate, years);
        let mut balance = principal;
        for _ in 0..24 {
            balance = balance * (1.0 + rate / 1200.0) - payment;
        }
        assert_approx_tol(remaining_balance(principal, rate, years, 24.0), balance, 1e-6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_balance_never_increases_over_time(
            principal in 1_000u32..1_000_000,
            rate_bp in 0u32..2_000,
            years in 1u32..40,
            month in 0u32..480
        ) {
            let rate = rate_bp as f64 / 100.0;
            let now = remaining_balance(principal as f64, rate, years as f64, month as f64);
            let later = remaining_balance(principal as f64, rate, years as f64, month as f64 + 1.0);
            prop_assert!(later <= now + 1e-6);
            prop_assert!(now >= 0.0);
            prop_assert!(now <= principal as f64 + 1e-6);
        }
    }
}
