use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for submitted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// The five metrics the risk rubric scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    CreditScore,
    DebtToIncome,
    LoanToValue,
    EmploymentStability,
    Reserves,
}

impl Metric {
    /// Every metric, in rubric order.
    pub const ALL: [Metric; 5] = [
        Metric::CreditScore,
        Metric::DebtToIncome,
        Metric::LoanToValue,
        Metric::EmploymentStability,
        Metric::Reserves,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Metric::CreditScore => "credit_score",
            Metric::DebtToIncome => "debt_to_income",
            Metric::LoanToValue => "loan_to_value",
            Metric::EmploymentStability => "employment_stability",
            Metric::Reserves => "reserves",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk classification for a metric or for the whole file, ordered from most
/// to least favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    FullTime,
    PartTime,
    SelfEmployed,
    Retired,
    Unemployed,
}

/// Employment snapshot as extracted from the application documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub status: EmploymentStatus,
    #[serde(default)]
    pub employer_name: Option<String>,
    /// Years with the current employer (or in the current line of business
    /// for self-employed applicants). May be unknown at intake.
    #[serde(default)]
    pub years_in_role: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPurpose {
    Purchase,
    Refinance,
    CashOutRefinance,
    Construction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    SingleFamily,
    Condominium,
    MultiFamily,
    Manufactured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyType {
    PrimaryResidence,
    SecondHome,
    Investment,
}

/// Declaration answers collected uniformly on every application. A `false`
/// answer on any lookback question is a hard override during assessment, not
/// a weighted factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declarations {
    pub no_foreclosure_7_years: bool,
    pub no_bankruptcy_7_years: bool,
    pub no_pending_lawsuits: bool,
    pub us_citizen_or_permanent_resident: bool,
}

/// Derived ratios that an upstream extraction step may have pre-computed.
/// Intake recomputes anything absent from the raw figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(default)]
    pub dti_ratio: Option<f64>,
    #[serde(default)]
    pub ltv_ratio: Option<f64>,
    #[serde(default)]
    pub reserves_months: Option<f64>,
}

/// Raw loan application as decoded from the document-extraction collaborator.
/// Scoring-relevant fields are optional at the wire level; the intake guard
/// enforces which ones are required before any score is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplicationSubmission {
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub ssn_last_4: Option<String>,
    #[serde(default)]
    pub application_date: Option<NaiveDate>,
    pub employment: EmploymentRecord,
    #[serde(default)]
    pub annual_income: Option<f64>,
    #[serde(default)]
    pub loan_amount: Option<f64>,
    pub loan_purpose: LoanPurpose,
    #[serde(default)]
    pub loan_term_months: Option<u32>,
    #[serde(default)]
    pub property_value: Option<f64>,
    pub property_type: PropertyType,
    pub occupancy: OccupancyType,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub liquid_assets: Option<f64>,
    #[serde(default)]
    pub monthly_debt_payments: Option<f64>,
    /// Principal, interest, taxes, and insurance estimate used only to turn
    /// liquid assets into months of reserves.
    #[serde(default)]
    pub estimated_monthly_housing_payment: Option<f64>,
    #[serde(default)]
    pub credit_score: Option<u16>,
    pub declarations: Declarations,
    #[serde(default)]
    pub derived: Option<DerivedMetrics>,
}

/// Validated application produced by the intake guard. Required figures are
/// present and positive, and the derived ratios are resolved; reserves stay
/// `None` when the data to compute them was never supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProfile {
    pub application_id: ApplicationId,
    pub applicant_name: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub employment: EmploymentRecord,
    pub annual_income: f64,
    pub loan_amount: f64,
    pub loan_purpose: LoanPurpose,
    pub loan_term_months: Option<u32>,
    pub property_value: f64,
    pub property_type: PropertyType,
    pub occupancy: OccupancyType,
    pub total_assets: Option<f64>,
    pub liquid_assets: Option<f64>,
    pub monthly_debt_payments: f64,
    pub credit_score: u16,
    pub dti_ratio: f64,
    pub ltv_ratio: f64,
    pub reserves_months: Option<f64>,
    pub declarations: Declarations,
}

/// High level status tracked throughout the loan application workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanApplicationStatus {
    Submitted,
    UnderReview,
    Escalated,
    Approved,
    Denied,
}

impl LoanApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanApplicationStatus::Submitted => "submitted",
            LoanApplicationStatus::UnderReview => "under_review",
            LoanApplicationStatus::Escalated => "escalated",
            LoanApplicationStatus::Approved => "approved",
            LoanApplicationStatus::Denied => "denied",
        }
    }
}
