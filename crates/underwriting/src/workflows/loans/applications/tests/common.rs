use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::workflows::loans::applications::assessment::PolicyBundle;
use crate::workflows::loans::applications::domain::{
    ApplicationId, Declarations, EmploymentRecord, EmploymentStatus, LoanApplicationStatus,
    LoanApplicationSubmission, LoanProfile, LoanPurpose, OccupancyType, PropertyType,
};
use crate::workflows::loans::applications::intake::IntakeGuard;
use crate::workflows::loans::applications::repository::{
    ApplicationRecord, ApplicationRepository, DecisionNotice, NoticeError, NoticePublisher,
    RepositoryError,
};
use crate::workflows::loans::applications::service::LoanApplicationService;

pub(super) fn policy() -> PolicyBundle {
    PolicyBundle::standard()
}

pub(super) fn clean_declarations() -> Declarations {
    Declarations {
        no_foreclosure_7_years: true,
        no_bankruptcy_7_years: true,
        no_pending_lawsuits: true,
        us_citizen_or_permanent_resident: true,
    }
}

/// Strong file: credit 745, DTI 22.5%, LTV ~78.3%, 8 months reserves,
/// four years of full-time employment.
pub(super) fn strong_submission() -> LoanApplicationSubmission {
    LoanApplicationSubmission {
        applicant_name: Some("Jane Doe".to_string()),
        ssn_last_4: Some("1234".to_string()),
        application_date: None,
        employment: EmploymentRecord {
            status: EmploymentStatus::FullTime,
            employer_name: Some("Contoso Manufacturing".to_string()),
            years_in_role: Some(4.0),
        },
        annual_income: Some(96_000.0),
        loan_amount: Some(235_000.0),
        loan_purpose: LoanPurpose::Purchase,
        loan_term_months: Some(360),
        property_value: Some(300_000.0),
        property_type: PropertyType::SingleFamily,
        occupancy: OccupancyType::PrimaryResidence,
        total_assets: Some(48_000.0),
        liquid_assets: Some(22_000.0),
        monthly_debt_payments: Some(1_800.0),
        estimated_monthly_housing_payment: Some(2_750.0),
        credit_score: Some(745),
        declarations: clean_declarations(),
        derived: None,
    }
}

/// Weak file: credit 580, DTI 48%, LTV 95%, one month of reserves.
pub(super) fn weak_submission() -> LoanApplicationSubmission {
    LoanApplicationSubmission {
        applicant_name: Some("Rex Marginal".to_string()),
        employment: EmploymentRecord {
            status: EmploymentStatus::PartTime,
            employer_name: None,
            years_in_role: Some(1.0),
        },
        annual_income: Some(52_000.0),
        loan_amount: Some(190_000.0),
        property_value: Some(200_000.0),
        monthly_debt_payments: Some(2_080.0),
        liquid_assets: Some(2_600.0),
        estimated_monthly_housing_payment: Some(2_600.0),
        credit_score: Some(580),
        ..strong_submission()
    }
}

pub(super) fn strong_profile(suffix: &str) -> LoanProfile {
    let mut profile = IntakeGuard
        .profile_from_submission(strong_submission())
        .expect("strong submission validates");
    profile.application_id = ApplicationId(format!("loan-test-{suffix}"));
    profile
}

pub(super) fn weak_profile(suffix: &str) -> LoanProfile {
    let mut profile = IntakeGuard
        .profile_from_submission(weak_submission())
        .expect("weak submission validates");
    profile.application_id = ApplicationId(format!("loan-test-{suffix}"));
    profile
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.profile.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.application_id) {
            guard.insert(record.profile.application_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn pending(&self, _limit: usize) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status == LoanApplicationStatus::Submitted)
            .cloned()
            .collect())
    }
}

/// Repository that reports every insert as a duplicate.
pub(super) struct ConflictRepository;

impl ApplicationRepository for ConflictRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(None)
    }

    fn pending(&self, _limit: usize) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(Vec::new())
    }
}

/// Repository that is always down.
pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("backing store offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("backing store offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("backing store offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("backing store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotices {
    events: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl MemoryNotices {
    pub(super) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

impl NoticePublisher for MemoryNotices {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NoticeError> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

pub(super) fn build_service() -> (
    Arc<LoanApplicationService<MemoryRepository, MemoryNotices>>,
    MemoryRepository,
    MemoryNotices,
) {
    let repository = MemoryRepository::default();
    let notices = MemoryNotices::default();
    let service = LoanApplicationService::new(
        Arc::new(repository.clone()),
        Arc::new(notices.clone()),
        policy(),
    )
    .expect("standard policy validates");
    (Arc::new(service), repository, notices)
}
