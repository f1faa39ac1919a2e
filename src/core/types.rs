use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TaxYear {
    #[serde(rename = "2023/24", alias = "2023-24", alias = "2023_24")]
    Y2023To24,
    #[default]
    #[serde(rename = "2024/25", alias = "2024-25", alias = "2024_25")]
    Y2024To25,
    #[serde(rename = "2025/26", alias = "2025-26", alias = "2025_26")]
    Y2025To26,
}

impl TaxYear {
    pub const ALL: [TaxYear; 3] = [TaxYear::Y2023To24, TaxYear::Y2024To25, TaxYear::Y2025To26];

    pub fn label(self) -> &'static str {
        match self {
            TaxYear::Y2023To24 => "2023/24",
            TaxYear::Y2024To25 => "2024/25",
            TaxYear::Y2025To26 => "2025/26",
        }
    }
}

impl fmt::Display for TaxYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaxYear {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace(['-', '_'], "/");
        TaxYear::ALL
            .into_iter()
            .find(|year| year.label() == normalized)
            .ok_or_else(|| format!("unknown tax year '{s}', expected one of 2023/24, 2024/25, 2025/26"))
    }
}

/// Student loan repayment plan. Keys that do not name a known plan
/// deserialise to [`StudentLoanPlan::Plan2`], whose threshold is the
/// documented fallback for unrecognised plans.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum StudentLoanPlan {
    #[default]
    None,
    Plan1,
    Plan2,
    Plan4,
    Plan5,
    Postgrad,
}

impl StudentLoanPlan {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "" | "none" => StudentLoanPlan::None,
            "plan1" => StudentLoanPlan::Plan1,
            "plan2" => StudentLoanPlan::Plan2,
            "plan4" => StudentLoanPlan::Plan4,
            "plan5" => StudentLoanPlan::Plan5,
            "postgrad" => StudentLoanPlan::Postgrad,
            _ => StudentLoanPlan::Plan2,
        }
    }

    /// Annual earnings above which repayments are taken. `None` for no loan.
    pub fn threshold(self) -> Option<f64> {
        match self {
            StudentLoanPlan::None => None,
            StudentLoanPlan::Plan1 => Some(24_990.0),
            StudentLoanPlan::Plan2 => Some(27_295.0),
            StudentLoanPlan::Plan4 => Some(31_395.0),
            StudentLoanPlan::Plan5 => Some(25_000.0),
            StudentLoanPlan::Postgrad => Some(21_000.0),
        }
    }

    pub fn repayment_rate(self) -> f64 {
        match self {
            StudentLoanPlan::None => 0.0,
            StudentLoanPlan::Postgrad => 0.06,
            _ => 0.09,
        }
    }
}

impl From<String> for StudentLoanPlan {
    fn from(value: String) -> Self {
        StudentLoanPlan::from_key(&value)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxRates {
    pub personal_allowance: f64,
    pub basic_rate_threshold: f64,
    pub higher_rate_threshold: f64,
    pub additional_rate_threshold: f64,
    pub basic_rate: f64,
    pub higher_rate: f64,
    pub additional_rate: f64,
    pub ni_threshold: f64,
    pub ni_rate: f64,
    pub ni_upper_limit: f64,
    pub ni_upper_rate: f64,
}

impl TaxRates {
    pub fn validate(&self) -> Result<(), String> {
        let amounts = [
            ("personalAllowance", self.personal_allowance),
            ("basicRateThreshold", self.basic_rate_threshold),
            ("higherRateThreshold", self.higher_rate_threshold),
            ("additionalRateThreshold", self.additional_rate_threshold),
            ("niThreshold", self.ni_threshold),
            ("niUpperLimit", self.ni_upper_limit),
        ];
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a finite amount >= 0"));
            }
        }

        let rates = [
            ("basicRate", self.basic_rate),
            ("higherRate", self.higher_rate),
            ("additionalRate", self.additional_rate),
            ("niRate", self.ni_rate),
            ("niUpperRate", self.ni_upper_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be between 0 and 1"));
            }
        }

        if self.higher_rate_threshold < self.basic_rate_threshold {
            return Err("higherRateThreshold must be >= basicRateThreshold".to_string());
        }
        if self.additional_rate_threshold < self.higher_rate_threshold {
            return Err("additionalRateThreshold must be >= higherRateThreshold".to_string());
        }
        if self.ni_upper_limit < self.ni_threshold {
            return Err("niUpperLimit must be >= niThreshold".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryInputs {
    pub gross_salary: f64,
    /// Employee contribution in percent of gross; ignored under auto-enrolment.
    pub pension_contribution: f64,
    /// Employer contribution in percent of gross; ignored under auto-enrolment.
    pub employer_pension_contribution: f64,
    pub use_auto_enrolment: bool,
    pub student_loan_plan: StudentLoanPlan,
    /// Carried through but not used by the calculation.
    pub is_scottish: bool,
    pub tax_year: TaxYear,
    pub tax_code: String,
    pub gift_aid: f64,
    pub eis_relief: f64,
    pub seis_relief: f64,
    pub isa_contribution: f64,
}

impl Default for SalaryInputs {
    fn default() -> Self {
        Self {
            gross_salary: 55_000.0,
            pension_contribution: 5.0,
            employer_pension_contribution: 3.0,
            use_auto_enrolment: false,
            student_loan_plan: StudentLoanPlan::None,
            is_scottish: false,
            tax_year: TaxYear::Y2024To25,
            tax_code: "1257L".to_string(),
            gift_aid: 0.0,
            eis_relief: 0.0,
            seis_relief: 0.0,
            isa_contribution: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub gross: f64,
    pub pension: f64,
    pub employer_pension: f64,
    pub taxable_income: f64,
    pub income_for_tax: f64,
    pub tax_paid: f64,
    pub ni_paid: f64,
    pub student_loan_paid: f64,
    pub net_pay: f64,
    pub take_home_monthly: f64,
    pub total_cost_to_employer: f64,
    pub applied_personal_allowance: f64,
    pub basic_band_limit: f64,
    pub higher_band_limit: f64,
    pub gift_aid_extension: f64,
    pub investment_credit: f64,
    pub total_tax_savings: f64,
    pub isa_contribution: f64,
    pub is_auto_enrolment: bool,
}
