use super::error::ConfigError;
use super::types::{Projection, ProjectionInputs, ProjectionSummary, YearlyProjection};

/// Earliest age at which the pension pot can be drawn.
pub const PENSION_ACCESS_AGE: u32 = 57;
/// Last simulated age, inclusive.
pub const TERMINAL_AGE: u32 = 90;
/// Upper bound on nominal growth and inflation rates.
const MAX_ANNUAL_RATE: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
struct GrowthRates {
    real_return: f64,
    real_wage_growth: f64,
}

impl GrowthRates {
    fn from_inputs(inputs: &ProjectionInputs) -> Self {
        Self {
            real_return: real_rate(inputs.investment_growth_rate, inputs.inflation_rate),
            real_wage_growth: real_rate(inputs.wage_growth_rate, inputs.inflation_rate),
        }
    }
}

/// Balances carried from one year into the next. `salary` only feeds the employer match.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PotState {
    pension: f64,
    investment: f64,
    salary: f64,
}

impl PotState {
    fn total(self) -> f64 {
        self.pension + self.investment
    }
}

#[derive(Debug, Clone, Copy)]
struct YearOutcome {
    age: u32,
    end: PotState,
    withdrawal: f64,
}

impl YearOutcome {
    fn snapshot(self) -> YearlyProjection {
        let pension_pot = self.end.pension.round();
        let investment_pot = self.end.investment.round();
        YearlyProjection {
            age: self.age,
            pension_pot,
            investment_pot,
            savings: pension_pot + investment_pot,
            withdrawal: self.withdrawal.round(),
        }
    }
}

/// Fisher composition of a nominal rate and inflation.
pub fn real_rate(nominal: f64, inflation: f64) -> f64 {
    (1.0 + nominal) / (1.0 + inflation) - 1.0
}

/// Year-by-year pension and investment balances from `current_age` to age 90, in
/// today's money.
pub fn run_projection(inputs: &ProjectionInputs) -> Result<Projection, ConfigError> {
    validate_inputs(inputs)?;

    let rates = GrowthRates::from_inputs(inputs);
    let start = PotState {
        pension: 0.0,
        investment: 0.0,
        salary: inputs.current_salary,
    };

    let outcomes = (inputs.current_age..=TERMINAL_AGE)
        .scan(start, |state, age| {
            let outcome = step_year(inputs, &rates, *state, age);
            *state = outcome.end;
            Some(outcome)
        })
        .collect::<Vec<_>>();

    if let Some(outcome) = outcomes
        .iter()
        .find(|outcome| !outcome.end.total().is_finite() || !outcome.withdrawal.is_finite())
    {
        return Err(ConfigError::Overflow { age: outcome.age });
    }

    let total_at_retirement = outcomes
        .iter()
        .find(|outcome| outcome.age == inputs.retirement_age)
        .map(|outcome| outcome.end.total())
        .unwrap_or(0.0);

    let years = outcomes
        .into_iter()
        .map(YearOutcome::snapshot)
        .collect::<Vec<_>>();

    let initial_withdrawal = years
        .iter()
        .map(|year| year.withdrawal)
        .find(|withdrawal| *withdrawal > 0.0)
        .unwrap_or(0.0);
    let final_withdrawal = years.last().map(|year| year.withdrawal).unwrap_or(0.0);

    Ok(Projection {
        years,
        summary: ProjectionSummary {
            total_at_retirement,
            initial_withdrawal,
            final_withdrawal,
            pension_access_age: PENSION_ACCESS_AGE,
            real_return: rates.real_return,
        },
    })
}

fn validate_inputs(inputs: &ProjectionInputs) -> Result<(), ConfigError> {
    if inputs.current_age > TERMINAL_AGE {
        return Err(ConfigError::invalid(
            "current_age",
            format!("must be <= {TERMINAL_AGE}"),
        ));
    }

    if inputs.retirement_age <= inputs.current_age {
        return Err(ConfigError::invalid(
            "retirement_age",
            "must be > current_age",
        ));
    }

    if inputs.retirement_age > TERMINAL_AGE {
        return Err(ConfigError::invalid(
            "retirement_age",
            format!("must be <= {TERMINAL_AGE}"),
        ));
    }

    for (field, amount) in [
        ("current_salary", inputs.current_salary),
        ("pension_contribution", inputs.pension_contribution),
        ("additional_investment", inputs.additional_investment),
    ] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ConfigError::invalid(field, "must be a finite amount >= 0"));
        }
    }

    for (field, rate) in [
        ("investment_growth_rate", inputs.investment_growth_rate),
        ("inflation_rate", inputs.inflation_rate),
        ("wage_growth_rate", inputs.wage_growth_rate),
    ] {
        if !rate.is_finite() || rate <= -1.0 || rate > MAX_ANNUAL_RATE {
            return Err(ConfigError::invalid(
                field,
                "must be > -100% and <= 100%",
            ));
        }
    }

    for (field, rate) in [
        ("employer_contribution_rate", inputs.employer_contribution_rate),
        ("withdrawal_rate", inputs.withdrawal_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::invalid(field, "must be between 0% and 100%"));
        }
    }

    Ok(())
}

fn step_year(
    inputs: &ProjectionInputs,
    rates: &GrowthRates,
    state: PotState,
    age: u32,
) -> YearOutcome {
    if age <= inputs.retirement_age {
        accumulation_year(inputs, rates, state, age)
    } else {
        drawdown_year(inputs, rates, state, age)
    }
}

fn grow(balance: f64, rate: f64) -> f64 {
    (balance * (1.0 + rate)).max(0.0)
}

fn accumulation_year(
    inputs: &ProjectionInputs,
    rates: &GrowthRates,
    state: PotState,
    age: u32,
) -> YearOutcome {
    let employer_contribution = state.salary * inputs.employer_contribution_rate;
    let pension_in = inputs.pension_contribution + employer_contribution;

    YearOutcome {
        age,
        end: PotState {
            pension: grow(state.pension + pension_in, rates.real_return),
            investment: grow(
                state.investment + inputs.additional_investment,
                rates.real_return,
            ),
            salary: state.salary * (1.0 + rates.real_wage_growth),
        },
        withdrawal: 0.0,
    }
}

fn drawdown_year(
    inputs: &ProjectionInputs,
    rates: &GrowthRates,
    state: PotState,
    age: u32,
) -> YearOutcome {
    let target = inputs.withdrawal_rate * state.total();
    let (pension_request, investment_request) =
        allocate_withdrawal(target, state, age >= PENSION_ACCESS_AGE);

    let pension_taken = pension_request.min(state.pension).max(0.0);
    let investment_taken = investment_request.min(state.investment).max(0.0);

    YearOutcome {
        age,
        end: PotState {
            pension: grow(state.pension - pension_taken, rates.real_return),
            investment: grow(state.investment - investment_taken, rates.real_return),
            salary: state.salary,
        },
        withdrawal: pension_taken + investment_taken,
    }
}

/// Splits a withdrawal target into (pension, investment) requests. Before the pension
/// is accessible the whole target falls on the investment pot.
fn allocate_withdrawal(target: f64, state: PotState, pension_accessible: bool) -> (f64, f64) {
    if !pension_accessible {
        return (0.0, target);
    }

    let total = state.total();
    if total <= 0.0 {
        return (0.0, 0.0);
    }
    (
        target * state.pension / total,
        target * state.investment / total,
    )
}
