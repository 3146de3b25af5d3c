use serde::Serialize;

/// UK income tax and Class 1 employee National Insurance parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxRateTable {
    pub personal_allowance: f64,
    pub allowance_taper_start: f64,
    pub basic_band_width: f64,
    pub higher_rate_limit: f64,
    pub basic_rate: f64,
    pub higher_rate: f64,
    pub additional_rate: f64,
    pub ni_primary_threshold: f64,
    pub ni_upper_threshold: f64,
    pub ni_main_rate: f64,
    pub ni_upper_rate: f64,
}

pub const UK_RATE_TABLE: TaxRateTable = TaxRateTable {
    personal_allowance: 12_570.0,
    allowance_taper_start: 100_000.0,
    basic_band_width: 37_700.0,
    higher_rate_limit: 125_140.0,
    basic_rate: 0.20,
    higher_rate: 0.40,
    additional_rate: 0.45,
    ni_primary_threshold: 12_584.0,
    ni_upper_threshold: 50_268.0,
    ni_main_rate: 0.12,
    ni_upper_rate: 0.02,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub take_home_pay: f64,
    pub income_tax: f64,
    pub national_insurance: f64,
    pub total_deductible: f64,
    pub effective_tax_rate: f64,
    pub marginal_tax_rate: f64,
    pub total_income: f64,
    pub personal_allowance: f64,
    pub basic_rate: f64,
    pub higher_rate: f64,
    pub additional_rate: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaxBand {
    PersonalAllowance,
    Basic,
    Higher,
    Additional,
}

/// Income falling in one band and the tax it attracts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandSlice {
    pub band: TaxBand,
    pub rate: f64,
    pub income: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriods {
    pub monthly_take_home: f64,
    pub weekly_take_home: f64,
    pub monthly_pension: f64,
    pub weekly_pension: f64,
}

/// Inputs to the retirement projection. Rates are fractions (0.07 for 7%).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub current_salary: f64,
    pub pension_contribution: f64,
    pub employer_contribution_rate: f64,
    pub additional_investment: f64,
    pub investment_growth_rate: f64,
    pub inflation_rate: f64,
    pub wage_growth_rate: f64,
    pub withdrawal_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyProjection {
    pub age: u32,
    pub pension_pot: f64,
    pub investment_pot: f64,
    pub savings: f64,
    pub withdrawal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub total_at_retirement: f64,
    pub initial_withdrawal: f64,
    pub final_withdrawal: f64,
    pub pension_access_age: u32,
    pub real_return: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub years: Vec<YearlyProjection>,
    pub summary: ProjectionSummary,
}
