use serde::Serialize;

use super::types::TaxBreakdown;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BandPosition {
    Allowance,
    Basic,
    Higher,
    Additional,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SliceKind {
    TakeHome,
    IncomeTax,
    NationalInsurance,
    Pension,
    StudentLoan,
    IsaSavings,
}

impl SliceKind {
    pub fn label(self) -> &'static str {
        match self {
            SliceKind::TakeHome => "Take Home",
            SliceKind::IncomeTax => "Income Tax",
            SliceKind::NationalInsurance => "National Insurance",
            SliceKind::Pension => "Pension (Emp)",
            SliceKind::StudentLoan => "Student Loan",
            SliceKind::IsaSavings => "ISA Savings",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownSlice {
    pub kind: SliceKind,
    pub label: &'static str,
    pub value: f64,
}

/// Display-side figures derived from a [`TaxBreakdown`]: ratios, the
/// non-empty parts of gross pay, and where taxable income sits in the bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownInsights {
    pub retention_rate: f64,
    pub effective_tax_rate: f64,
    pub band_position: BandPosition,
    pub gift_aid_reclaimed: f64,
    pub has_reliefs: bool,
    pub slices: Vec<BreakdownSlice>,
}

impl BreakdownInsights {
    pub fn from_breakdown(breakdown: &TaxBreakdown) -> Self {
        let retention_rate = ratio(breakdown.net_pay, breakdown.gross);
        let effective_tax_rate = ratio(breakdown.tax_paid + breakdown.ni_paid, breakdown.gross);

        let slices = [
            (SliceKind::TakeHome, breakdown.net_pay),
            (SliceKind::IncomeTax, breakdown.tax_paid),
            (SliceKind::NationalInsurance, breakdown.ni_paid),
            (SliceKind::Pension, breakdown.pension),
            (SliceKind::StudentLoan, breakdown.student_loan_paid),
            (SliceKind::IsaSavings, breakdown.isa_contribution),
        ]
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(kind, value)| BreakdownSlice {
            kind,
            label: kind.label(),
            value,
        })
        .collect();

        Self {
            retention_rate,
            effective_tax_rate,
            band_position: band_position(breakdown),
            gift_aid_reclaimed: (breakdown.total_tax_savings - breakdown.investment_credit).max(0.0),
            has_reliefs: breakdown.gift_aid_extension > 0.0
                || breakdown.investment_credit > 0.0
                || breakdown.isa_contribution > 0.0,
            slices,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn band_position(breakdown: &TaxBreakdown) -> BandPosition {
    let income = breakdown.taxable_income;
    if income <= breakdown.applied_personal_allowance {
        BandPosition::Allowance
    } else if income <= breakdown.basic_band_limit {
        BandPosition::Basic
    } else if income <= breakdown.higher_band_limit {
        BandPosition::Higher
    } else {
        BandPosition::Additional
    }
}
