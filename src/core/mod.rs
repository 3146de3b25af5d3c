mod error;
mod projection;
mod tax;
mod types;

pub use error::ConfigError;
pub use projection::{PENSION_ACCESS_AGE, TERMINAL_AGE, real_rate, run_projection};
pub use tax::calculate_tax;
pub use types::{
    BandSlice, PayPeriods, Projection, ProjectionInputs, ProjectionSummary, TaxBand,
    TaxRateTable, TaxResult, UK_RATE_TABLE, YearlyProjection,
};
