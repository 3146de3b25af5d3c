use super::types::{BandSlice, PayPeriods, TaxBand, TaxRateTable, TaxResult, UK_RATE_TABLE};

const MONTHS_PER_YEAR: f64 = 12.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Income tax and National Insurance for one tax year.
///
/// `pension_contribution` is treated as salary sacrifice: it comes off gross pay before
/// either levy is assessed. Callers are expected to keep it within `gross_income`.
pub fn calculate_tax(gross_income: f64, pension_contribution: f64) -> TaxResult {
    calculate_tax_with_table(gross_income, pension_contribution, &UK_RATE_TABLE)
}

fn calculate_tax_with_table(
    gross_income: f64,
    pension_contribution: f64,
    table: &TaxRateTable,
) -> TaxResult {
    let adjusted_income = gross_income - pension_contribution;

    let personal_allowance = tapered_allowance(adjusted_income, table);
    let (basic_income, higher_income, additional_income) =
        band_incomes(adjusted_income, personal_allowance, table);

    let basic_rate = basic_income * table.basic_rate;
    let higher_rate = higher_income * table.higher_rate;
    let additional_rate = additional_income * table.additional_rate;

    let income_tax = basic_rate + higher_rate + additional_rate;
    let national_insurance = national_insurance(adjusted_income, table);
    let total_deductible = income_tax + national_insurance + pension_contribution;
    let take_home_pay = gross_income - total_deductible;

    let effective_tax_rate = if gross_income > 0.0 {
        (income_tax + national_insurance) / gross_income * 100.0
    } else {
        0.0
    };

    TaxResult {
        take_home_pay,
        income_tax,
        national_insurance,
        total_deductible,
        effective_tax_rate,
        marginal_tax_rate: marginal_rate(adjusted_income, personal_allowance, table) * 100.0,
        total_income: gross_income,
        personal_allowance,
        basic_rate,
        higher_rate,
        additional_rate,
    }
}

/// Allowance after losing £1 for every whole £2 above the taper threshold.
fn tapered_allowance(adjusted_income: f64, table: &TaxRateTable) -> f64 {
    if adjusted_income <= table.allowance_taper_start {
        return table.personal_allowance;
    }
    let reduction = ((adjusted_income - table.allowance_taper_start) / 2.0).floor();
    (table.personal_allowance - reduction).max(0.0)
}

/// Upper edge of the basic band in adjusted-income terms.
fn basic_band_ceiling(personal_allowance: f64, table: &TaxRateTable) -> f64 {
    personal_allowance + table.basic_band_width
}

fn band_incomes(
    adjusted_income: f64,
    personal_allowance: f64,
    table: &TaxRateTable,
) -> (f64, f64, f64) {
    let basic_ceiling = basic_band_ceiling(personal_allowance, table);

    let basic = (adjusted_income.min(basic_ceiling) - personal_allowance).max(0.0);
    let higher = (adjusted_income.min(table.higher_rate_limit) - basic_ceiling).max(0.0);
    let additional = (adjusted_income - table.higher_rate_limit).max(0.0);

    (basic, higher, additional)
}

fn national_insurance(adjusted_income: f64, table: &TaxRateTable) -> f64 {
    if adjusted_income <= table.ni_primary_threshold {
        return 0.0;
    }
    let main_band = adjusted_income.min(table.ni_upper_threshold) - table.ni_primary_threshold;
    let upper_band = (adjusted_income - table.ni_upper_threshold).max(0.0);
    main_band * table.ni_main_rate + upper_band * table.ni_upper_rate
}

fn marginal_rate(adjusted_income: f64, personal_allowance: f64, table: &TaxRateTable) -> f64 {
    if adjusted_income <= personal_allowance {
        0.0
    } else if adjusted_income <= basic_band_ceiling(personal_allowance, table) {
        table.basic_rate
    } else if adjusted_income <= table.higher_rate_limit {
        table.higher_rate
    } else {
        table.additional_rate
    }
}

impl TaxResult {
    /// Income and tax per band, in band order, skipping bands with no income.
    pub fn band_breakdown(&self) -> Vec<BandSlice> {
        let table = &UK_RATE_TABLE;
        let adjusted_income = self.total_income - self.pension_contribution();
        let untaxed_income = self.personal_allowance.min(adjusted_income.max(0.0));
        [
            (TaxBand::PersonalAllowance, 0.0, untaxed_income, 0.0),
            (
                TaxBand::Basic,
                table.basic_rate,
                self.basic_rate / table.basic_rate,
                self.basic_rate,
            ),
            (
                TaxBand::Higher,
                table.higher_rate,
                self.higher_rate / table.higher_rate,
                self.higher_rate,
            ),
            (
                TaxBand::Additional,
                table.additional_rate,
                self.additional_rate / table.additional_rate,
                self.additional_rate,
            ),
        ]
        .into_iter()
        .filter(|(_, _, income, _)| *income > 0.0)
        .map(|(band, rate, income, tax)| BandSlice {
            band,
            rate: rate * 100.0,
            income,
            tax,
        })
        .collect()
    }

    pub fn pension_contribution(&self) -> f64 {
        self.total_deductible - self.income_tax - self.national_insurance
    }

    pub fn pay_periods(&self) -> PayPeriods {
        let pension = self.pension_contribution();
        PayPeriods {
            monthly_take_home: self.take_home_pay / MONTHS_PER_YEAR,
            weekly_take_home: self.take_home_pay / WEEKS_PER_YEAR,
            monthly_pension: pension / MONTHS_PER_YEAR,
            weekly_pension: pension / WEEKS_PER_YEAR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn golden_values_at_thirty_five_thousand() {
        let result = calculate_tax(35_000.0, 0.0);

        assert_approx(result.personal_allowance, 12_570.0);
        assert_approx(result.basic_rate, 4_486.0);
        assert_approx(result.higher_rate, 0.0);
        assert_approx(result.additional_rate, 0.0);
        assert_approx(result.income_tax, 4_486.0);
        assert_approx(result.national_insurance, 2_689.92);
        assert_approx(result.total_deductible, 7_175.92);
        assert_approx(result.take_home_pay, 27_824.08);
        assert_approx(result.marginal_tax_rate, 20.0);
        assert_approx(result.effective_tax_rate, 7_175.92 / 35_000.0 * 100.0);
        assert_approx(result.total_income, 35_000.0);
    }

    #[test]
    fn pension_contribution_reduces_taxable_income() {
        let result = calculate_tax(60_000.0, 10_000.0);

        assert_approx(result.basic_rate, (50_000.0 - 12_570.0) * 0.20);
        assert_approx(result.higher_rate, 0.0);
        assert_approx(result.national_insurance, (50_000.0 - 12_584.0) * 0.12);
        assert_approx(result.marginal_tax_rate, 20.0);
        assert_approx(result.pension_contribution(), 10_000.0);
        assert_approx(
            result.take_home_pay,
            60_000.0 - 10_000.0 - result.income_tax - result.national_insurance,
        );
    }

    #[test]
    fn zero_income_has_zero_rates() {
        let result = calculate_tax(0.0, 0.0);

        assert_approx(result.income_tax, 0.0);
        assert_approx(result.national_insurance, 0.0);
        assert_approx(result.take_home_pay, 0.0);
        assert_approx(result.effective_tax_rate, 0.0);
        assert_approx(result.marginal_tax_rate, 0.0);
        assert!(result.effective_tax_rate.is_finite());
    }

    #[test]
    fn allowance_taper_end_points() {
        assert_approx(calculate_tax(100_000.0, 0.0).personal_allowance, 12_570.0);
        assert_approx(calculate_tax(100_001.0, 0.0).personal_allowance, 12_570.0);
        assert_approx(calculate_tax(100_002.0, 0.0).personal_allowance, 12_569.0);
        assert_approx(calculate_tax(125_139.0, 0.0).personal_allowance, 1.0);
        assert_approx(calculate_tax(125_140.0, 0.0).personal_allowance, 0.0);
        assert_approx(calculate_tax(200_000.0, 0.0).personal_allowance, 0.0);
    }

    #[test]
    fn tapered_allowance_shifts_basic_band_without_widening_it() {
        let result = calculate_tax(110_000.0, 0.0);

        assert_approx(result.personal_allowance, 7_570.0);
        assert_approx(result.basic_rate, 37_700.0 * 0.20);
        assert_approx(result.higher_rate, (110_000.0 - 7_570.0 - 37_700.0) * 0.40);
        assert_approx(result.additional_rate, 0.0);
        assert_approx(result.marginal_tax_rate, 40.0);
    }

    #[test]
    fn tax_at_additional_rate_threshold() {
        let result = calculate_tax(125_140.0, 0.0);

        assert_approx(result.basic_rate, 7_540.0);
        assert_approx(result.higher_rate, 34_976.0);
        assert_approx(result.additional_rate, 0.0);
        assert_approx(result.income_tax, 42_516.0);
        assert_approx(result.marginal_tax_rate, 40.0);

        let above = calculate_tax(135_140.0, 0.0);
        assert_approx(above.additional_rate, 4_500.0);
        assert_approx(above.marginal_tax_rate, 45.0);
    }

    #[test]
    fn band_above_each_threshold_is_exactly_zero() {
        let at_allowance = calculate_tax(12_570.0, 0.0);
        assert_eq!(at_allowance.basic_rate, 0.0);
        assert_approx(at_allowance.marginal_tax_rate, 0.0);

        let at_basic_limit = calculate_tax(50_270.0, 0.0);
        assert_eq!(at_basic_limit.higher_rate, 0.0);
        assert_approx(at_basic_limit.marginal_tax_rate, 20.0);

        let at_higher_limit = calculate_tax(125_140.0, 0.0);
        assert_eq!(at_higher_limit.additional_rate, 0.0);
    }

    #[test]
    fn national_insurance_tiers() {
        assert_approx(calculate_tax(12_584.0, 0.0).national_insurance, 0.0);
        assert_approx(
            calculate_tax(50_268.0, 0.0).national_insurance,
            (50_268.0 - 12_584.0) * 0.12,
        );
        assert_approx(
            calculate_tax(60_268.0, 0.0).national_insurance,
            (50_268.0 - 12_584.0) * 0.12 + 10_000.0 * 0.02,
        );
    }

    #[test]
    fn band_breakdown_lists_populated_bands() {
        let slices = calculate_tax(60_000.0, 0.0).band_breakdown();
        let bands = slices.iter().map(|s| s.band).collect::<Vec<_>>();
        assert_eq!(
            bands,
            vec![TaxBand::PersonalAllowance, TaxBand::Basic, TaxBand::Higher]
        );
        assert_approx(slices[1].income, 37_700.0);
        assert_approx(slices[1].rate, 20.0);
        assert_approx(slices[2].income, 60_000.0 - 50_270.0);
        assert_approx(slices[2].tax, (60_000.0 - 50_270.0) * 0.40);
    }

    #[test]
    fn allowance_slice_is_limited_to_income_below_it() {
        let slices = calculate_tax(5_000.0, 0.0).band_breakdown();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].band, TaxBand::PersonalAllowance);
        assert_approx(slices[0].income, 5_000.0);

        let slices = calculate_tax(20_000.0, 16_000.0).band_breakdown();
        assert_eq!(slices.len(), 1);
        assert_approx(slices[0].income, 4_000.0);

        assert!(calculate_tax(0.0, 0.0).band_breakdown().is_empty());
    }

    #[test]
    fn basic_band_ceiling_follows_tapered_allowance() {
        assert_approx(basic_band_ceiling(12_570.0, &UK_RATE_TABLE), 50_270.0);
        assert_approx(basic_band_ceiling(0.0, &UK_RATE_TABLE), 37_700.0);
    }

    #[test]
    fn pay_periods_split_annual_figures() {
        let result = calculate_tax(52_000.0, 5_200.0);
        let periods = result.pay_periods();
        assert_approx(periods.monthly_take_home * 12.0, result.take_home_pay);
        assert_approx(periods.weekly_take_home * 52.0, result.take_home_pay);
        assert_approx(periods.monthly_pension, 5_200.0 / 12.0);
        assert_approx(periods.weekly_pension, 100.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_deductions_reconcile_with_gross(
            gross in 0u32..400_000,
            pension_share_bp in 0u32..10_001
        ) {
            let gross = gross as f64;
            let pension = gross * pension_share_bp as f64 / 10_000.0;
            let result = calculate_tax(gross, pension);

            let reconciled = result.take_home_pay
                + result.income_tax
                + result.national_insurance
                + pension;
            prop_assert!((reconciled - gross).abs() <= 1e-6 * gross.max(1.0));
            prop_assert!(
                (result.income_tax - (result.basic_rate + result.higher_rate + result.additional_rate)).abs() <= EPS
            );
            prop_assert!(result.income_tax >= 0.0);
            prop_assert!(result.national_insurance >= 0.0);
            prop_assert!(result.personal_allowance >= 0.0);
            prop_assert!(result.effective_tax_rate.is_finite());
        }

        #[test]
        fn prop_raising_income_never_lowers_tax_or_take_home(
            gross in 0u32..300_000,
            raise in 1u32..20_000,
            pension in 0u32..20_000
        ) {
            let pension = pension as f64;
            let lower = calculate_tax(gross as f64 + pension, pension);
            let higher = calculate_tax((gross + raise) as f64 + pension, pension);

            prop_assert!(higher.income_tax + EPS >= lower.income_tax);
            prop_assert!(higher.national_insurance + EPS >= lower.national_insurance);
            prop_assert!(higher.take_home_pay + EPS >= lower.take_home_pay);
            prop_assert!(higher.marginal_tax_rate >= lower.marginal_tax_rate);
        }

        #[test]
        fn prop_marginal_rate_is_a_known_band_rate(gross in 0u32..500_000) {
            let rate = calculate_tax(gross as f64, 0.0).marginal_tax_rate;
            prop_assert!([0.0, 20.0, 40.0, 45.0].contains(&rate));
        }

        #[test]
        fn prop_repeat_calls_are_bit_identical(gross in 0u32..500_000, pension in 0u32..50_000) {
            let first = calculate_tax(gross as f64, pension as f64);
            let second = calculate_tax(gross as f64, pension as f64);
            prop_assert_eq!(first.take_home_pay.to_bits(), second.take_home_pay.to_bits());
            prop_assert_eq!(first.income_tax.to_bits(), second.income_tax.to_bits());
            prop_assert_eq!(first.national_insurance.to_bits(), second.national_insurance.to_bits());
            prop_assert_eq!(first.effective_tax_rate.to_bits(), second.effective_tax_rate.to_bits());
        }
    }
}
