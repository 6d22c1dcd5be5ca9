//! Compounding interest over an elapsed number of days.
//!
//! Results are signed like the balance: a negative (liability) balance
//! accrues a negative delta, so debt grows in magnitude.

use crate::schema::CompoundingScheme;

/// Average month length used to turn elapsed days into fractional months.
pub const DAYS_PER_MONTH: f64 = 30.4375;
pub const DAYS_PER_YEAR: f64 = 365.0;
pub const BASIS_POINTS: f64 = 10_000.0;

/// Fractional interest (in minor units) on `balance_cents` over `days`.
pub fn interest_for_period(
    balance_cents: i64,
    apr_bps: i64,
    scheme: CompoundingScheme,
    days: i64,
) -> f64 {
    if days <= 0 || apr_bps <= 0 {
        return 0.0;
    }
    let annual = apr_bps as f64 / BASIS_POINTS;

    let factor = match scheme {
        CompoundingScheme::Monthly => {
            let months = days as f64 / DAYS_PER_MONTH;
            (1.0 + annual / 12.0).powf(months) - 1.0
        }
        CompoundingScheme::Daily | CompoundingScheme::Unrecognized => {
            (1.0 + annual / DAYS_PER_YEAR).powf(days as f64) - 1.0
        }
    };

    balance_cents as f64 * factor
}

/// [`interest_for_period`] rounded to the nearest minor unit.
pub fn interest_for_period_cents(
    balance_cents: i64,
    apr_bps: i64,
    scheme: CompoundingScheme,
    days: i64,
) -> i64 {
    interest_for_period(balance_cents, apr_bps, scheme, days).round() as i64
}

/// Fractional minor units left over from earlier accruals.
///
/// Each accrual adds its exact amount to the carry, books the whole-unit
/// part (truncated toward zero) and keeps the remainder, so a long run of
/// small accruals neither loses nor invents money.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InterestCarry {
    remainder: f64,
}

impl InterestCarry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remainder(&self) -> f64 {
        self.remainder
    }

    /// Adds `interest` and returns the whole minor units to book now.
    ///
    /// Returns `None`, leaving the carry untouched, when the total is not
    /// finite or its whole part does not fit in an `i64`.
    pub fn book(&mut self, interest: f64) -> Option<i64> {
        let total = self.remainder + interest;
        if !total.is_finite() {
            return None;
        }
        let whole = total.trunc();
        if whole < i64::MIN as f64 || whole >= i64::MAX as f64 {
            return None;
        }
        self.remainder = total - whole;
        Some(whole as i64)
    }

    /// Books the interest on `balance_cents` over `days`.
    pub fn accrue(
        &mut self,
        balance_cents: i64,
        apr_bps: i64,
        scheme: CompoundingScheme,
        days: i64,
    ) -> Option<i64> {
        self.book(interest_for_period(balance_cents, apr_bps, scheme, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_zero_rate_or_zero_days_accrues_nothing() {
        for scheme in [
            CompoundingScheme::Daily,
            CompoundingScheme::Monthly,
            CompoundingScheme::Unrecognized,
        ] {
            assert_eq!(interest_for_period_cents(100_000, 0, scheme, 30), 0);
            assert_eq!(interest_for_period_cents(100_000, 1200, scheme, 0), 0);
            assert_eq!(interest_for_period_cents(100_000, 1200, scheme, -5), 0);
            assert_eq!(interest_for_period_cents(100_000, -100, scheme, 30), 0);
        }
    }

    #[test]
    fn test_sign_follows_balance() {
        for scheme in [
            CompoundingScheme::Daily,
            CompoundingScheme::Monthly,
            CompoundingScheme::Unrecognized,
        ] {
            let pos = interest_for_period_cents(100_000, 1200, scheme, 30);
            assert!(pos > 0, "{:?}: expected positive interest, got {}", scheme, pos);
            let neg = interest_for_period_cents(-100_000, 1200, scheme, 30);
            assert!(neg < 0, "{:?}: expected negative interest, got {}", scheme, neg);
            assert_eq!(pos, -neg, "{:?}", scheme);
        }
    }

    #[test]
    fn test_full_year_at_hundred_percent() {
        let big = interest_for_period_cents(10_000, 10_000, CompoundingScheme::Daily, 365);
        assert!(big >= 10_000, "expected sizable interest, got {}", big);
        // (1 + 1/365)^365 - 1 is just under e - 1.
        assert!(big < 17_183, "got {}", big);
    }

    #[test]
    fn test_daily_and_monthly_differ() {
        let daily = interest_for_period_cents(10_000_000, 2400, CompoundingScheme::Daily, 45);
        let monthly = interest_for_period_cents(10_000_000, 2400, CompoundingScheme::Monthly, 45);
        assert_ne!(daily, monthly);
    }

    #[test]
    fn test_monthly_compounds_over_fractional_months() {
        let got = interest_for_period(1_000_000, 1200, CompoundingScheme::Monthly, 365);
        let expected = 1_000_000.0 * (1.01f64.powf(365.0 / DAYS_PER_MONTH) - 1.0);
        assert!((got - expected).abs() < 1e-6);
    }

    #[test]
    fn test_unrecognized_scheme_uses_daily_formula() {
        let fallback = interest_for_period_cents(100_000, 1200, CompoundingScheme::Unrecognized, 30);
        let daily = interest_for_period_cents(100_000, 1200, CompoundingScheme::Daily, 30);
        assert_eq!(fallback, daily);
    }

    #[test]
    fn test_carry_books_whole_units_and_keeps_remainder() {
        let mut carry = InterestCarry::new();
        assert_eq!(carry.book(0.4), Some(0));
        assert_eq!(carry.book(0.4), Some(0));
        assert_eq!(carry.book(0.4), Some(1));
        assert!((carry.remainder() - 0.2).abs() < 1e-9);

        let mut debt = InterestCarry::new();
        assert_eq!(debt.book(-0.7), Some(0));
        assert_eq!(debt.book(-0.7), Some(-1));
        assert!((debt.remainder() + 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_accrue_books_period_interest() {
        let mut carry = InterestCarry::new();
        let exact = interest_for_period(100_000, 1200, CompoundingScheme::Monthly, 31);
        assert_eq!(
            carry.accrue(100_000, 1200, CompoundingScheme::Monthly, 31),
            Some(exact.trunc() as i64)
        );
        assert!((carry.remainder() - exact.fract()).abs() < 1e-9);
        assert_eq!(carry.accrue(100_000, 0, CompoundingScheme::Monthly, 31), Some(0));
    }

    #[test]
    fn test_carry_refuses_amounts_outside_i64() {
        let mut carry = InterestCarry::new();
        assert_eq!(carry.book(0.5), Some(0));

        assert_eq!(carry.book(f64::INFINITY), None);
        assert_eq!(carry.book(f64::NEG_INFINITY), None);
        assert_eq!(carry.book(f64::NAN), None);
        assert_eq!(carry.book(1e19), None);
        assert_eq!(carry.book(-1e19), None);
        assert!((carry.remainder() - 0.5).abs() < 1e-9, "carry must be untouched");

        assert_eq!(carry.book(0.5), Some(1));
    }

    #[test]
    fn test_huge_debt_at_high_rate_overflows_accrual() {
        // Decades of 18.99% daily compounding on a large debt leave the i64 range.
        let mut carry = InterestCarry::new();
        let exact = interest_for_period(-500_000, 1899, CompoundingScheme::Daily, 366 * 300);
        assert!(exact < i64::MIN as f64 || !exact.is_finite());
        assert_eq!(
            carry.accrue(-500_000, 1899, CompoundingScheme::Daily, 366 * 300),
            None
        );
        assert_eq!(carry.remainder(), 0.0);
    }

    #[test]
    fn test_carry_conserves_total_interest() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let mut carry = InterestCarry::new();
            let mut booked = 0i64;
            let mut exact = 0.0f64;
            for _ in 0..400 {
                let amount: f64 = rng.gen_range(0.0..3.0);
                booked += carry.book(amount).unwrap();
                exact += amount;
            }
            let drift = exact - booked as f64;
            assert!(
                drift > -1e-6 && drift < 1.0 + 1e-6,
                "booked {} vs exact {}",
                booked,
                exact
            );
        }
    }
}
