use crate::infra::{InMemoryApplicationRepository, InMemoryNoticePublisher};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use underwriting::error::AppError;
use underwriting::workflows::loans::applications::{
    ApplicationId, AssessmentEngine, Declarations, EmploymentRecord, EmploymentStatus,
    IntakeGuard, LoanApplicationService, LoanApplicationSubmission, LoanPurpose,
    LoanServiceError, OccupancyType, PolicyBundle, PropertyType,
};
use underwriting::workflows::loans::batch::LoanBatchImporter;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Path to a loan application JSON file
    #[arg(long)]
    pub(crate) application: PathBuf,
    /// Optional policy bundle JSON; defaults to the built-in standard bundle
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional CSV export of extracted applications to run instead of the
    /// bundled samples
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Optional policy bundle JSON; defaults to the built-in standard bundle
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
}

fn load_policy(path: Option<&PathBuf>) -> Result<PolicyBundle, AppError> {
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            Ok(PolicyBundle::from_reader(file)?)
        }
        None => Ok(PolicyBundle::standard()),
    }
}

/// One-shot assessment for scripting: application JSON in, result JSON out.
pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.application)?;
    let submission: LoanApplicationSubmission = serde_json::from_str(&raw)?;

    let bundle = load_policy(args.policy.as_ref())?;
    let engine = AssessmentEngine::new(bundle)?;

    let mut profile = IntakeGuard
        .profile_from_submission(submission)
        .map_err(LoanServiceError::Intake)?;
    profile.application_id = ApplicationId("cli-000001".to_string());

    let result = engine
        .assess(&profile)
        .map_err(LoanServiceError::Assessment)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Walk sample (or imported) applications through the full service:
/// intake, assessment, persistence, and decision notices.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let bundle = load_policy(args.policy.as_ref())?;
    let policy_version = bundle.version.clone();

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let notices = InMemoryNoticePublisher::default();
    let service = LoanApplicationService::new(repository, Arc::new(notices.clone()), bundle)?;

    let submissions = match &args.csv {
        Some(path) => LoanBatchImporter::from_path(path)?,
        None => sample_submissions(),
    };

    println!("== Loan underwriting demo (policy {policy_version}) ==");
    for submission in submissions {
        let applicant = submission
            .applicant_name
            .clone()
            .unwrap_or_else(|| "<unnamed>".to_string());

        let record = match service.submit(submission) {
            Ok(record) => record,
            Err(err) => {
                println!("- {applicant}: rejected at intake ({err})");
                continue;
            }
        };

        let result = service.assess(&record.profile.application_id)?;
        println!(
            "- {applicant} [{}]: {} (base {:.1}, adjusted {:.1}, overall {})",
            record.profile.application_id.0,
            result.recommendation.label(),
            result.base_score,
            result.adjusted_score,
            result.overall_risk_level,
        );
        for factor in &result.applied_factors {
            println!("    factor {:+.1} {}: {}", factor.delta, factor.name, factor.rationale);
        }
        for flag in &result.risk_flags {
            println!("    flag [{}] {}", flag.severity, flag.message);
        }
    }

    let events = notices.events();
    println!("{} decision notice(s) dispatched", events.len());
    for event in events {
        println!("    {} -> {}", event.application_id.0, event.template);
    }

    Ok(())
}

fn base_submission() -> LoanApplicationSubmission {
    LoanApplicationSubmission {
        applicant_name: None,
        ssn_last_4: None,
        application_date: None,
        employment: EmploymentRecord {
            status: EmploymentStatus::FullTime,
            employer_name: None,
            years_in_role: None,
        },
        annual_income: None,
        loan_amount: None,
        loan_purpose: LoanPurpose::Purchase,
        loan_term_months: Some(360),
        property_value: None,
        property_type: PropertyType::SingleFamily,
        occupancy: OccupancyType::PrimaryResidence,
        total_assets: None,
        liquid_assets: None,
        monthly_debt_payments: None,
        estimated_monthly_housing_payment: None,
        credit_score: None,
        declarations: Declarations {
            no_foreclosure_7_years: true,
            no_bankruptcy_7_years: true,
            no_pending_lawsuits: true,
            us_citizen_or_permanent_resident: true,
        },
        derived: None,
    }
}

fn sample_submissions() -> Vec<LoanApplicationSubmission> {
    let strong = LoanApplicationSubmission {
        applicant_name: Some("Jane Doe".to_string()),
        employment: EmploymentRecord {
            status: EmploymentStatus::FullTime,
            employer_name: Some("Contoso Manufacturing".to_string()),
            years_in_role: Some(4.0),
        },
        annual_income: Some(96_000.0),
        loan_amount: Some(235_000.0),
        property_value: Some(300_000.0),
        liquid_assets: Some(22_000.0),
        monthly_debt_payments: Some(1_800.0),
        estimated_monthly_housing_payment: Some(2_750.0),
        credit_score: Some(745),
        ..base_submission()
    };

    let stretched = LoanApplicationSubmission {
        applicant_name: Some("Rex Marginal".to_string()),
        employment: EmploymentRecord {
            status: EmploymentStatus::PartTime,
            employer_name: None,
            years_in_role: Some(1.0),
        },
        annual_income: Some(52_000.0),
        loan_amount: Some(190_000.0),
        property_value: Some(200_000.0),
        liquid_assets: Some(2_600.0),
        monthly_debt_payments: Some(2_080.0),
        estimated_monthly_housing_payment: Some(2_600.0),
        credit_score: Some(580),
        ..base_submission()
    };

    let mut post_bankruptcy = LoanApplicationSubmission {
        applicant_name: Some("Avery Rebuild".to_string()),
        employment: EmploymentRecord {
            status: EmploymentStatus::FullTime,
            employer_name: Some("Fabrikam Logistics".to_string()),
            years_in_role: Some(6.0),
        },
        annual_income: Some(110_000.0),
        loan_amount: Some(250_000.0),
        property_value: Some(340_000.0),
        liquid_assets: Some(30_000.0),
        monthly_debt_payments: Some(1_500.0),
        estimated_monthly_housing_payment: Some(2_500.0),
        credit_score: Some(765),
        ..base_submission()
    };
    post_bankruptcy.declarations.no_bankruptcy_7_years = false;

    vec![strong, stretched, post_bankruptcy]
}
