//! Plain-language summaries of a computed breakdown.
//!
//! Summaries are advisory. Nothing here feeds back into the numbers, and
//! every failure path ends in [`SUMMARY_UNAVAILABLE`] rather than an error
//! the caller has to handle.

mod debounce;
mod http;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{SalaryInputs, TaxBreakdown, TaxYear};

pub use debounce::{DEFAULT_SETTLE_DELAY, SummaryDebouncer, SummaryState};
pub use http::HttpSummarizer;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summary request failed: {0}")]
    Transport(String),
    #[error("summary endpoint returned HTTP {status}")]
    Status { status: u16 },
    #[error("summary response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PensionStrategy {
    AutoEnrolment,
    Custom { percent: f64 },
}

impl fmt::Display for PensionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PensionStrategy::AutoEnrolment => f.write_str("Auto-enrolment"),
            PensionStrategy::Custom { percent } => write!(f, "Custom {percent}%"),
        }
    }
}

/// The handful of figures a summary is written from.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryFacts {
    pub gross_salary: f64,
    pub tax_year: TaxYear,
    pub net_pay: f64,
    pub take_home_monthly: f64,
    pub tax_paid: f64,
    pub ni_paid: f64,
    pub pension_strategy: PensionStrategy,
    pub isa_contribution: f64,
}

impl SummaryFacts {
    pub fn new(inputs: &SalaryInputs, breakdown: &TaxBreakdown) -> Self {
        let pension_strategy = if inputs.use_auto_enrolment {
            PensionStrategy::AutoEnrolment
        } else {
            PensionStrategy::Custom {
                percent: inputs.pension_contribution,
            }
        };
        Self {
            gross_salary: breakdown.gross,
            tax_year: inputs.tax_year,
            net_pay: breakdown.net_pay,
            take_home_monthly: breakdown.take_home_monthly,
            tax_paid: breakdown.tax_paid,
            ni_paid: breakdown.ni_paid,
            pension_strategy,
            isa_contribution: breakdown.isa_contribution,
        }
    }

    /// Request text for a language-model backed summarizer.
    pub fn to_prompt(&self) -> String {
        format!(
            "Provide a 3-bullet point financial summary for this UK salary profile.\n\
             Profile: £{gross:.0} ({year}), Net: £{net:.0}, Monthly: £{monthly:.0}.\n\
             Pension Strategy: {pension}.\n\
             ISA: £{isa:.0} tax-free allocation.\n\
             Format: Return ONLY the 3 bullet points. No markdown bolding, no headers. Use simple bullet symbols.",
            gross = self.gross_salary,
            year = self.tax_year,
            net = self.net_pay,
            monthly = self.take_home_monthly,
            pension = self.pension_strategy,
            isa = self.isa_contribution,
        )
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, facts: &SummaryFacts) -> Result<String, SummaryError>;
}

/// Offline summarizer that fills a fixed three-bullet template.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

#[async_trait]
impl Summarizer for TemplateSummarizer {
    async fn summarize(&self, facts: &SummaryFacts) -> Result<String, SummaryError> {
        Ok(template_summary(facts))
    }
}

pub fn template_summary(facts: &SummaryFacts) -> String {
    let deductions = facts.tax_paid + facts.ni_paid;
    let share = if facts.gross_salary > 0.0 {
        deductions / facts.gross_salary * 100.0
    } else {
        0.0
    };
    format!(
        "• Take-home of {net} a year ({monthly} a month) from {gross} gross in {year}.\n\
         • Income tax and National Insurance total {deductions}, {share:.1}% of gross.\n\
         • Pension: {pension}; ISA: {isa} set aside tax-free.",
        net = format_gbp(facts.net_pay),
        monthly = format_gbp(facts.take_home_monthly),
        gross = format_gbp(facts.gross_salary),
        year = facts.tax_year,
        deductions = format_gbp(deductions),
        pension = facts.pension_strategy,
        isa = format_gbp(facts.isa_contribution),
    )
}

/// Whole pounds with thousands separators, e.g. `£40,807`.
pub fn format_gbp(value: f64) -> String {
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}£{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TaxRates, compute};
    use crate::rates::default_rates;

    fn default_facts() -> SummaryFacts {
        let inputs = SalaryInputs::default();
        let rates: TaxRates = default_rates(inputs.tax_year);
        let breakdown = compute(&inputs, &rates);
        SummaryFacts::new(&inputs, &breakdown)
    }

    #[test]
    fn format_gbp_groups_thousands_and_rounds() {
        assert_eq!(format_gbp(0.0), "£0");
        assert_eq!(format_gbp(999.4), "£999");
        assert_eq!(format_gbp(40_807.4), "£40,807");
        assert_eq!(format_gbp(1_234_567.8), "£1,234,568");
        assert_eq!(format_gbp(-2_500.0), "-£2,500");
    }

    #[test]
    fn facts_describe_pension_strategy() {
        let facts = default_facts();
        assert_eq!(facts.pension_strategy.to_string(), "Custom 5%");

        let inputs = SalaryInputs {
            use_auto_enrolment: true,
            ..SalaryInputs::default()
        };
        let breakdown = compute(&inputs, &default_rates(inputs.tax_year));
        let facts = SummaryFacts::new(&inputs, &breakdown);
        assert_eq!(facts.pension_strategy.to_string(), "Auto-enrolment");
    }

    #[test]
    fn prompt_contains_profile_figures() {
        let prompt = default_facts().to_prompt();
        assert!(prompt.contains("Profile: £55000 (2024/25), Net: £40807, Monthly: £3401."));
        assert!(prompt.contains("Pension Strategy: Custom 5%."));
        assert!(prompt.contains("ISA: £0 tax-free allocation."));
    }

    #[tokio::test]
    async fn template_summary_has_three_bullets() {
        let text = TemplateSummarizer
            .summarize(&default_facts())
            .await
            .expect("template never fails");
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().all(|line| line.starts_with('•')));
        assert!(text.contains("£40,807 a year"));
        assert!(text.contains("£11,443"));
        assert!(text.contains("20.8% of gross"));
    }
}
