// Rates are annual percentages (`12.0` means 12%). Degenerate inputs return a
// fallback instead of NaN or infinity.

const MONTHS_PER_YEAR: f64 = 12.0;

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / MONTHS_PER_YEAR
}

pub fn whole_years(years: f64) -> u32 {
    if !years.is_finite() || years <= 0.0 {
        return 0;
    }
    years.floor().min(u32::MAX as f64) as u32
}

pub fn compound_future_value(principal: f64, annual_rate_percent: f64, years: f64) -> f64 {
    if years <= 0.0 || annual_rate_percent == 0.0 {
        return principal;
    }
    let growth = (1.0 + annual_rate_percent / 100.0).powf(years);
    finite_or(principal * growth, principal)
}

/// Ordinary annuity, compounded monthly at `annual_rate_percent / 12`.
pub fn annuity_future_value(
    monthly_contribution: f64,
    annual_rate_percent: f64,
    total_months: f64,
) -> f64 {
    if total_months <= 0.0 {
        return 0.0;
    }
    let simple_sum = monthly_contribution * total_months;
    if annual_rate_percent == 0.0 {
        return simple_sum;
    }
    let i = monthly_rate(annual_rate_percent);
    let value = monthly_contribution * ((1.0 + i).powf(total_months) - 1.0) / i;
    finite_or(value, simple_sum)
}

pub fn inflation_adjusted_cost(current_cost: f64, inflation_rate_percent: f64, years: f64) -> f64 {
    compound_future_value(current_cost, inflation_rate_percent, years)
}

/// Inverse of [`annuity_future_value`].
pub fn required_sip_for_target(
    target_future_value: f64,
    annual_rate_percent: f64,
    total_months: f64,
) -> f64 {
    if total_months <= 0.0 {
        return 0.0;
    }
    let even_split = target_future_value / total_months;
    if annual_rate_percent == 0.0 {
        return even_split;
    }
    let i = monthly_rate(annual_rate_percent);
    let accumulation = (1.0 + i).powf(total_months) - 1.0;
    if accumulation == 0.0 {
        return even_split;
    }
    finite_or(target_future_value * i / accumulation, even_split)
}

pub fn present_value(future_value: f64, annual_rate_percent: f64, years: f64) -> f64 {
    if years <= 0.0 || annual_rate_percent == 0.0 {
        return future_value;
    }
    let discount = (1.0 + annual_rate_percent / 100.0).powf(years);
    if discount == 0.0 {
        return 0.0;
    }
    finite_or(future_value / discount, 0.0)
}

pub fn cagr(beginning_value: f64, ending_value: f64, years: f64) -> f64 {
    if years <= 0.0 || beginning_value <= 0.0 || ending_value < 0.0 {
        return 0.0;
    }
    let rate = ((ending_value / beginning_value).powf(1.0 / years) - 1.0) * 100.0;
    finite_or(rate, 0.0)
}

pub fn inflated_expense_total(annual_expense: f64, inflation_rate_percent: f64, years: f64) -> f64 {
    (1..=whole_years(years))
        .map(|year| inflation_adjusted_cost(annual_expense, inflation_rate_percent, year as f64))
        .sum()
}

pub fn required_insurance_cover(
    outstanding_loans: f64,
    monthly_expenses: f64,
    inflation_rate_percent: f64,
    deposit_rate_percent: f64,
    years: f64,
) -> f64 {
    let expenses = inflated_expense_total(
        monthly_expenses * MONTHS_PER_YEAR,
        inflation_rate_percent,
        years,
    );
    outstanding_loans + present_value(expenses, deposit_rate_percent, years)
}

pub fn absolute_return(invested: f64, current_value: f64) -> f64 {
    if invested <= 0.0 {
        return 0.0;
    }
    finite_or((current_value - invested) / invested * 100.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn sip_scenario_matches_closed_form() {
        let fv = annuity_future_value(10_000.0, 12.0, 120.0);
        assert_approx_tol(fv, 2_300_386.89, 0.01);
    }

    #[test]
    fn lumpsum_scenario_round_trips_its_rate() {
        let fv = compound_future_value(500_000.0, 12.0, 10.0);
        assert_approx_tol(fv, 1_552_924.10, 0.01);
        assert_approx_tol(cagr(500_000.0, fv, 10.0), 12.0, 1e-9);
    }

    #[test]
    fn house_scenario_inflates_cost() {
        let future = inflation_adjusted_cost(5_000_000.0, 6.0, 10.0);
        assert_approx_tol(future, 8_954_238.48, 0.01);
    }

    #[test]
    fn zero_rate_fallbacks_avoid_division_by_zero() {
        assert_eq!(annuity_future_value(2_500.0, 0.0, 36.0), 90_000.0);
        assert_eq!(required_sip_for_target(90_000.0, 0.0, 36.0), 2_500.0);
        assert_eq!(compound_future_value(1_000.0, 0.0, 25.0), 1_000.0);
        assert_eq!(present_value(1_000.0, 0.0, 25.0), 1_000.0);
    }

    #[test]
    fn zero_duration_fallbacks() {
        assert_eq!(annuity_future_value(2_500.0, 12.0, 0.0), 0.0);
        assert_eq!(required_sip_for_target(90_000.0, 12.0, 0.0), 0.0);
        assert_eq!(present_value(1_000.0, 8.0, 0.0), 1_000.0);
        assert_eq!(cagr(1_000.0, 2_000.0, 0.0), 0.0);
        assert_eq!(inflated_expense_total(12_000.0, 6.0, 0.0), 0.0);
    }

    #[test]
    fn cagr_guards_degenerate_inputs() {
        assert_eq!(cagr(0.0, 2_000.0, 5.0), 0.0);
        assert_eq!(cagr(-10.0, 2_000.0, 5.0), 0.0);
        assert_eq!(cagr(1_000.0, -5.0, 5.0), 0.0);
        assert_approx_tol(cagr(1_000.0, 1_000.0, 5.0), 0.0, 1e-12);
    }

    #[test]
    fn insurance_cover_adds_discounted_inflated_expenses() {
        // One year: 10k a month inflated 5%, discounted back at 5%.
        let cover = required_insurance_cover(100_000.0, 10_000.0, 5.0, 5.0, 1.0);
        assert_approx_tol(cover, 220_000.0, 1e-6);

        let expenses = inflated_expense_total(120_000.0, 5.0, 3.0);
        assert_approx_tol(expenses, 120_000.0 * (1.05 + 1.1025 + 1.157625), 1e-6);
    }

    #[test]
    fn absolute_return_is_zero_without_investment() {
        assert_eq!(absolute_return(0.0, 500.0), 0.0);
        assert_approx_tol(absolute_return(1_000.0, 1_250.0), 25.0, 1e-12);
    }

    #[test]
    fn whole_years_truncates_and_guards() {
        assert_eq!(whole_years(3.9), 3);
        assert_eq!(whole_years(-1.0), 0);
        assert_eq!(whole_years(f64::NAN), 0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_zero_rate_annuity_is_simple_sum(
            monthly in 1u32..1_000_000,
            months in 1u32..600
        ) {
            let monthly = monthly as f64;
            let months = months as f64;
            prop_assert_eq!(annuity_future_value(monthly, 0.0, months), monthly * months);
        }

        #[test]
        fn prop_zero_duration_returns_principal(
            principal in -1_000_000i64..10_000_000,
            rate_bp in -5_000i32..5_000
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 100.0;
            prop_assert_eq!(compound_future_value(principal, rate, 0.0), principal);
        }

        #[test]
        fn prop_compound_growth_is_increasing_in_rate(
            principal in 1u32..10_000_000,
            years in 1u32..41,
            rate_bp in 1u32..3_000,
            delta_bp in 1u32..1_000
        ) {
            let principal = principal as f64;
            let years = years as f64;
            let low = rate_bp as f64 / 100.0;
            let high = (rate_bp + delta_bp) as f64 / 100.0;
            prop_assert!(
                compound_future_value(principal, high, years)
                    > compound_future_value(principal, low, years)
            );
        }

        #[test]
        fn prop_required_sip_inverts_annuity(
            monthly in 1u32..1_000_000,
            rate_bp in 1u32..3_000,
            months in 1u32..481
        ) {
            let monthly = monthly as f64;
            let rate = rate_bp as f64 / 100.0;
            let months = months as f64;
            let target = annuity_future_value(monthly, rate, months);
            let recovered = required_sip_for_target(target, rate, months);
            prop_assert!(((recovered - monthly) / monthly).abs() <= 1e-6);
        }

        #[test]
        fn prop_present_value_undoes_compounding(
            principal in 1u32..10_000_000,
            rate_bp in 1u32..3_000,
            years in 1u32..41
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 100.0;
            let years = years as f64;
            let grown = compound_future_value(principal, rate, years);
            let back = present_value(grown, rate, years);
            prop_assert!(((back - principal) / principal).abs() <= 1e-9);
        }
    }
}
