use super::domain::{ApplicationId, LoanApplicationSubmission, LoanProfile};

/// Validation errors raised by the intake guard. A lending decision is never
/// produced from partial data, so every rejection names the offending field.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("required field missing: {field}")]
    MissingField { field: &'static str },
    #[error("field {field} must be positive (found {value})")]
    NonPositive { field: &'static str, value: f64 },
}

impl IntakeError {
    pub fn field(&self) -> &'static str {
        match self {
            IntakeError::MissingField { field } => field,
            IntakeError::NonPositive { field, .. } => field,
        }
    }
}

fn require(field: &'static str, value: Option<f64>) -> Result<f64, IntakeError> {
    let value = value.ok_or(IntakeError::MissingField { field })?;
    if value <= 0.0 || !value.is_finite() {
        return Err(IntakeError::NonPositive { field, value });
    }
    Ok(value)
}

/// Guard responsible for producing `LoanProfile` instances from raw
/// submissions: enforces required fields and resolves the derived ratios.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    /// Convert an inbound submission into a validated loan profile.
    ///
    /// Pre-computed derived metrics win over recomputation so that upstream
    /// verified figures are not silently replaced. Reserves remain
    /// unavailable when neither a reserve figure nor the liquid-assets and
    /// housing-payment pair was supplied; the policy bundle decides how an
    /// unavailable metric classifies.
    pub fn profile_from_submission(
        &self,
        submission: LoanApplicationSubmission,
    ) -> Result<LoanProfile, IntakeError> {
        let credit_score = submission
            .credit_score
            .ok_or(IntakeError::MissingField {
                field: "credit_score",
            })?;
        let annual_income = require("annual_income", submission.annual_income)?;
        let loan_amount = require("loan_amount", submission.loan_amount)?;
        let property_value = require("property_value", submission.property_value)?;
        let monthly_debt_payments = submission
            .monthly_debt_payments
            .ok_or(IntakeError::MissingField {
                field: "monthly_debt_payments",
            })?;
        if monthly_debt_payments < 0.0 || !monthly_debt_payments.is_finite() {
            return Err(IntakeError::NonPositive {
                field: "monthly_debt_payments",
                value: monthly_debt_payments,
            });
        }

        let derived = submission.derived.unwrap_or_default();

        let dti_ratio = match derived.dti_ratio {
            Some(ratio) => ratio,
            None => monthly_debt_payments / (annual_income / 12.0) * 100.0,
        };
        let ltv_ratio = match derived.ltv_ratio {
            Some(ratio) => ratio,
            None => loan_amount / property_value * 100.0,
        };
        let reserves_months = derived.reserves_months.or_else(|| {
            match (
                submission.liquid_assets,
                submission.estimated_monthly_housing_payment,
            ) {
                (Some(liquid), Some(payment)) if payment > 0.0 => Some(liquid / payment),
                _ => None,
            }
        });

        Ok(LoanProfile {
            // Placeholder until the service assigns a sequence id.
            application_id: ApplicationId(String::new()),
            applicant_name: submission.applicant_name,
            application_date: submission.application_date,
            employment: submission.employment,
            annual_income,
            loan_amount,
            loan_purpose: submission.loan_purpose,
            loan_term_months: submission.loan_term_months,
            property_value,
            property_type: submission.property_type,
            occupancy: submission.occupancy,
            total_assets: submission.total_assets,
            liquid_assets: submission.liquid_assets,
            monthly_debt_payments,
            credit_score,
            dti_ratio,
            ltv_ratio,
            reserves_months,
            declarations: submission.declarations,
        })
    }
}
