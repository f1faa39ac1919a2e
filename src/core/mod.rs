mod engine;
mod insights;
mod types;

pub use engine::compute;
pub use insights::{BandPosition, BreakdownInsights, BreakdownSlice, SliceKind};
pub use types::{SalaryInputs, StudentLoanPlan, TaxBreakdown, TaxRates, TaxYear};
