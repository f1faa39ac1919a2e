use super::types::{SalaryInputs, StudentLoanPlan, TaxBreakdown, TaxRates, TaxYear};

// Auto-enrolment qualifying earnings band and minimum contribution rates.
// These are statutory minimums and do not vary with the supplied `TaxRates`.
const AUTO_ENROLMENT_LOWER_LIMIT: f64 = 6_240.0;
const AUTO_ENROLMENT_UPPER_LIMIT: f64 = 50_270.0;
const AUTO_ENROLMENT_EMPLOYEE_RATE: f64 = 0.05;
const AUTO_ENROLMENT_EMPLOYER_RATE: f64 = 0.03;

const ALLOWANCE_TAPER_START: f64 = 100_000.0;
const GIFT_AID_NET_FRACTION: f64 = 0.8;
const EIS_CREDIT_RATE: f64 = 0.30;
const SEIS_CREDIT_RATE: f64 = 0.50;
const NI_MAIN_RATE_2023_24: f64 = 0.10;

#[derive(Debug, Clone, Copy)]
struct PensionSplit {
    employee: f64,
    employer: f64,
}

#[derive(Debug, Clone, Copy)]
struct BandLimits {
    basic: f64,
    higher: f64,
}

/// Everything the band calculation needs besides the limits, so the
/// with-relief and without-relief passes share one code path.
#[derive(Debug, Clone, Copy)]
struct BandTaxBase {
    taxable_income: f64,
    income_for_tax: f64,
    allowance: f64,
    basic_rate: f64,
    higher_rate: f64,
    additional_rate: f64,
}

/// Computes the full take-home breakdown for one salary scenario.
///
/// Total over its inputs: negative or non-finite amounts are treated as
/// zero, percentages are held to 0..=100 and rates to 0..=1. The result
/// always satisfies
/// `net_pay == gross - pension - tax_paid - ni_paid - student_loan_paid`.
pub fn compute(inputs: &SalaryInputs, rates: &TaxRates) -> TaxBreakdown {
    let gross = non_negative(inputs.gross_salary);
    let isa_contribution = non_negative(inputs.isa_contribution);

    let pension = pension_contributions(inputs, gross);
    let taxable_income = (gross - pension.employee - isa_contribution).max(0.0);

    let base_allowance = base_personal_allowance(&inputs.tax_code, rates);
    let allowance = tapered_allowance(base_allowance, taxable_income);
    let income_for_tax = (taxable_income - allowance).max(0.0);

    let gift_aid_extension = non_negative(inputs.gift_aid) / GIFT_AID_NET_FRACTION;
    let standard_limits = BandLimits {
        basic: non_negative(rates.basic_rate_threshold),
        higher: non_negative(rates.higher_rate_threshold),
    };
    let extended_limits = BandLimits {
        basic: standard_limits.basic + gift_aid_extension,
        higher: standard_limits.higher + gift_aid_extension,
    };

    let base = BandTaxBase {
        taxable_income,
        income_for_tax,
        allowance,
        basic_rate: unit_rate(rates.basic_rate),
        higher_rate: unit_rate(rates.higher_rate),
        additional_rate: unit_rate(rates.additional_rate),
    };
    let tax_without_reliefs = band_tax(base, standard_limits);
    let investment_credit = non_negative(inputs.eis_relief) * EIS_CREDIT_RATE
        + non_negative(inputs.seis_relief) * SEIS_CREDIT_RATE;
    let tax_paid = (band_tax(base, extended_limits) - investment_credit).max(0.0);

    let ni_paid = national_insurance(gross, inputs.tax_year, rates);
    let student_loan_paid = student_loan_repayment(gross, inputs.student_loan_plan);

    let net_pay = gross - pension.employee - tax_paid - ni_paid - student_loan_paid;

    TaxBreakdown {
        gross,
        pension: pension.employee,
        employer_pension: pension.employer,
        taxable_income,
        income_for_tax,
        tax_paid,
        ni_paid,
        student_loan_paid,
        net_pay,
        take_home_monthly: net_pay / 12.0,
        total_cost_to_employer: gross + pension.employer,
        applied_personal_allowance: allowance,
        basic_band_limit: extended_limits.basic,
        higher_band_limit: extended_limits.higher,
        gift_aid_extension,
        investment_credit,
        total_tax_savings: tax_without_reliefs - tax_paid,
        isa_contribution,
        is_auto_enrolment: inputs.use_auto_enrolment,
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn unit_rate(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0) / 100.0
    } else {
        0.0
    }
}

fn pension_contributions(inputs: &SalaryInputs, gross: f64) -> PensionSplit {
    if inputs.use_auto_enrolment {
        let qualifying = (gross.min(AUTO_ENROLMENT_UPPER_LIMIT) - AUTO_ENROLMENT_LOWER_LIMIT).max(0.0);
        PensionSplit {
            employee: qualifying * AUTO_ENROLMENT_EMPLOYEE_RATE,
            employer: qualifying * AUTO_ENROLMENT_EMPLOYER_RATE,
        }
    } else {
        PensionSplit {
            employee: gross * percent(inputs.pension_contribution),
            employer: gross * percent(inputs.employer_pension_contribution),
        }
    }
}

fn base_personal_allowance(tax_code: &str, rates: &TaxRates) -> f64 {
    allowance_from_tax_code(tax_code).unwrap_or_else(|| non_negative(rates.personal_allowance))
}

/// Reads the first run of digits in a tax code as tens of pounds of
/// allowance, e.g. `1257L` gives 12,570 and `K475` gives 4,750.
pub(crate) fn allowance_from_tax_code(tax_code: &str) -> Option<f64> {
    let digits: String = tax_code
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits
        .bytes()
        .fold(0.0_f64, |acc, b| acc * 10.0 + f64::from(b - b'0'));
    Some(value * 10.0)
}

fn tapered_allowance(base_allowance: f64, taxable_income: f64) -> f64 {
    if taxable_income > ALLOWANCE_TAPER_START {
        (base_allowance - (taxable_income - ALLOWANCE_TAPER_START) / 2.0).max(0.0)
    } else {
        base_allowance
    }
}

// Band membership is decided on taxable income (before the allowance),
// while the basic band is sized net of the allowance already applied.
fn band_tax(base: BandTaxBase, limits: BandLimits) -> f64 {
    if base.income_for_tax <= 0.0 {
        return 0.0;
    }

    let basic_band = (limits.basic - base.allowance).max(0.0);
    if base.taxable_income <= limits.basic {
        base.income_for_tax * base.basic_rate
    } else if base.taxable_income <= limits.higher {
        basic_band * base.basic_rate + (base.taxable_income - limits.basic) * base.higher_rate
    } else {
        let higher_band = (limits.higher - limits.basic).max(0.0);
        basic_band * base.basic_rate
            + higher_band * base.higher_rate
            + (base.taxable_income - limits.higher) * base.additional_rate
    }
}

fn national_insurance(gross: f64, tax_year: TaxYear, rates: &TaxRates) -> f64 {
    let threshold = non_negative(rates.ni_threshold);
    let upper_limit = non_negative(rates.ni_upper_limit);
    let applicable = (gross - threshold).max(0.0);
    if applicable <= 0.0 {
        return 0.0;
    }

    let main_rate = match tax_year {
        TaxYear::Y2023To24 => NI_MAIN_RATE_2023_24,
        TaxYear::Y2024To25 | TaxYear::Y2025To26 => unit_rate(rates.ni_rate),
    };
    let main_range = applicable.min((upper_limit - threshold).max(0.0));
    let upper_range = (gross - upper_limit).max(0.0);

    main_range * main_rate + upper_range * unit_rate(rates.ni_upper_rate)
}

fn student_loan_repayment(gross: f64, plan: StudentLoanPlan) -> f64 {
    match plan.threshold() {
        Some(threshold) => ((gross - threshold) * plan.repayment_rate()).max(0.0),
        None => 0.0,
    }
}
