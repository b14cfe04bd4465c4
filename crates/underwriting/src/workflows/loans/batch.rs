//! Bulk intake of extracted loan applications from a CSV export.
//!
//! The document-extraction pipeline delivers its structured output as a flat
//! CSV; this importer turns each row into a [`LoanApplicationSubmission`]
//! ready for the intake guard. Parsing is lenient only about optional
//! columns; malformed enumerations are row-level errors, never defaults.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::applications::domain::{
    Declarations, EmploymentRecord, EmploymentStatus, LoanApplicationSubmission, LoanPurpose,
    OccupancyType, PropertyType,
};

#[derive(Debug, thiserror::Error)]
pub enum BatchImportError {
    #[error("failed to read application export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid application CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
}

pub struct LoanBatchImporter;

impl LoanBatchImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<LoanApplicationSubmission>, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<LoanApplicationSubmission>, BatchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut submissions = Vec::new();
        for (index, record) in csv_reader.deserialize::<ApplicationRow>().enumerate() {
            let row = record?;
            // Header row is line 1.
            let submission = row.into_submission().map_err(|reason| {
                BatchImportError::Row {
                    row: index + 2,
                    reason,
                }
            })?;
            submissions.push(submission);
        }

        Ok(submissions)
    }
}

#[derive(Debug, Deserialize)]
struct ApplicationRow {
    #[serde(default)]
    applicant_name: Option<String>,
    #[serde(default)]
    credit_score: Option<u16>,
    #[serde(default)]
    annual_income: Option<f64>,
    #[serde(default)]
    loan_amount: Option<f64>,
    #[serde(default)]
    property_value: Option<f64>,
    #[serde(default)]
    monthly_debt_payments: Option<f64>,
    #[serde(default)]
    liquid_assets: Option<f64>,
    #[serde(default)]
    estimated_monthly_housing_payment: Option<f64>,
    employment_status: String,
    #[serde(default)]
    employment_years: Option<f64>,
    loan_purpose: String,
    property_type: String,
    occupancy: String,
    #[serde(default = "default_true")]
    no_foreclosure_7_years: bool,
    #[serde(default = "default_true")]
    no_bankruptcy_7_years: bool,
    #[serde(default = "default_true")]
    no_pending_lawsuits: bool,
    #[serde(default = "default_true")]
    us_citizen_or_permanent_resident: bool,
}

fn default_true() -> bool {
    true
}

impl ApplicationRow {
    fn into_submission(self) -> Result<LoanApplicationSubmission, String> {
        let status = parse_employment_status(&self.employment_status)?;
        let purpose = parse_loan_purpose(&self.loan_purpose)?;
        let property_type = parse_property_type(&self.property_type)?;
        let occupancy = parse_occupancy(&self.occupancy)?;

        Ok(LoanApplicationSubmission {
            applicant_name: self.applicant_name,
            ssn_last_4: None,
            application_date: None,
            employment: EmploymentRecord {
                status,
                employer_name: None,
                years_in_role: self.employment_years,
            },
            annual_income: self.annual_income,
            loan_amount: self.loan_amount,
            loan_purpose: purpose,
            loan_term_months: None,
            property_value: self.property_value,
            property_type,
            occupancy,
            total_assets: None,
            liquid_assets: self.liquid_assets,
            monthly_debt_payments: self.monthly_debt_payments,
            estimated_monthly_housing_payment: self.estimated_monthly_housing_payment,
            credit_score: self.credit_score,
            declarations: Declarations {
                no_foreclosure_7_years: self.no_foreclosure_7_years,
                no_bankruptcy_7_years: self.no_bankruptcy_7_years,
                no_pending_lawsuits: self.no_pending_lawsuits,
                us_citizen_or_permanent_resident: self.us_citizen_or_permanent_resident,
            },
            derived: None,
        })
    }
}

fn parse_employment_status(raw: &str) -> Result<EmploymentStatus, String> {
    match raw.to_ascii_lowercase().replace('-', "_").as_str() {
        "full_time" | "employed" => Ok(EmploymentStatus::FullTime),
        "part_time" => Ok(EmploymentStatus::PartTime),
        "self_employed" => Ok(EmploymentStatus::SelfEmployed),
        "retired" => Ok(EmploymentStatus::Retired),
        "unemployed" => Ok(EmploymentStatus::Unemployed),
        other => Err(format!("unknown employment status '{other}'")),
    }
}

fn parse_loan_purpose(raw: &str) -> Result<LoanPurpose, String> {
    match raw.to_ascii_lowercase().replace('-', "_").as_str() {
        "purchase" => Ok(LoanPurpose::Purchase),
        "refinance" => Ok(LoanPurpose::Refinance),
        "cash_out_refinance" => Ok(LoanPurpose::CashOutRefinance),
        "construction" => Ok(LoanPurpose::Construction),
        other => Err(format!("unknown loan purpose '{other}'")),
    }
}

fn parse_property_type(raw: &str) -> Result<PropertyType, String> {
    match raw.to_ascii_lowercase().replace('-', "_").as_str() {
        "single_family" => Ok(PropertyType::SingleFamily),
        "condominium" | "condo" => Ok(PropertyType::Condominium),
        "multi_family" => Ok(PropertyType::MultiFamily),
        "manufactured" => Ok(PropertyType::Manufactured),
        other => Err(format!("unknown property type '{other}'")),
    }
}

fn parse_occupancy(raw: &str) -> Result<OccupancyType, String> {
    match raw.to_ascii_lowercase().replace('-', "_").as_str() {
        "primary_residence" | "primary" => Ok(OccupancyType::PrimaryResidence),
        "second_home" => Ok(OccupancyType::SecondHome),
        "investment" => Ok(OccupancyType::Investment),
        other => Err(format!("unknown occupancy '{other}'")),
    }
}
