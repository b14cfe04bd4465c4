use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Local;

use super::assessment::{
    AssessmentEngine, AssessmentError, PolicyBundle, PolicyError, RecommendationAction,
    RiskAssessmentResult,
};
use super::domain::{ApplicationId, LoanApplicationStatus, LoanApplicationSubmission};
use super::intake::{IntakeError, IntakeGuard};
use super::repository::{
    ApplicationRecord, ApplicationRepository, DecisionNotice, NoticeError, NoticePublisher,
    RepositoryError,
};

/// Service composing the intake guard, repository, notices, and the
/// assessment engine.
pub struct LoanApplicationService<R, N> {
    guard: IntakeGuard,
    repository: Arc<R>,
    notices: Arc<N>,
    engine: Arc<AssessmentEngine>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("loan-{id:06}"))
}

impl<R, N> LoanApplicationService<R, N>
where
    R: ApplicationRepository + 'static,
    N: NoticePublisher + 'static,
{
    /// Build the service; the policy bundle is validated here, before any
    /// application is accepted.
    pub fn new(
        repository: Arc<R>,
        notices: Arc<N>,
        bundle: PolicyBundle,
    ) -> Result<Self, PolicyError> {
        let engine = Arc::new(AssessmentEngine::new(bundle)?);
        Ok(Self {
            guard: IntakeGuard,
            repository,
            notices,
            engine,
        })
    }

    pub fn engine(&self) -> &AssessmentEngine {
        &self.engine
    }

    /// Submit a new application, returning the repository-backed record.
    pub fn submit(
        &self,
        submission: LoanApplicationSubmission,
    ) -> Result<ApplicationRecord, LoanServiceError> {
        let mut profile = self.guard.profile_from_submission(submission)?;
        profile.application_id = next_application_id();

        let record = ApplicationRecord {
            profile,
            status: LoanApplicationStatus::Submitted,
            assessment: None,
            assessed_on: None,
        };

        let stored = self.repository.insert(record)?;
        Ok(stored)
    }

    /// Assess a stored application and persist the outcome. Re-running is
    /// idempotent against the same policy bundle.
    pub fn assess(
        &self,
        application_id: &ApplicationId,
    ) -> Result<RiskAssessmentResult, LoanServiceError> {
        let mut record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        let result = self.engine.assess(&record.profile)?;

        record.status = match result.recommendation {
            RecommendationAction::Approve | RecommendationAction::ApproveWithConditions => {
                LoanApplicationStatus::Approved
            }
            RecommendationAction::Deny => LoanApplicationStatus::Denied,
            RecommendationAction::Escalate => LoanApplicationStatus::Escalated,
            RecommendationAction::Review => LoanApplicationStatus::UnderReview,
        };
        record.assessed_on = Some(Local::now().date_naive());
        record.assessment = Some(result.clone());

        self.repository.update(record)?;

        match result.recommendation {
            RecommendationAction::Approve | RecommendationAction::ApproveWithConditions => {
                self.publish_notice("loan_approved", &result)?;
            }
            RecommendationAction::Deny => {
                self.publish_notice("adverse_action", &result)?;
            }
            _ => {}
        }

        Ok(result)
    }

    fn publish_notice(
        &self,
        template: &str,
        result: &RiskAssessmentResult,
    ) -> Result<(), LoanServiceError> {
        let mut details = BTreeMap::new();
        details.insert(
            "recommendation".to_string(),
            result.recommendation.label().to_string(),
        );
        details.insert(
            "adjusted_score".to_string(),
            format!("{:.1}", result.adjusted_score),
        );
        details.insert("policy_version".to_string(), result.policy_version.clone());

        self.notices.publish(DecisionNotice {
            template: template.to_string(),
            application_id: result.application_id.clone(),
            details,
        })?;
        Ok(())
    }

    /// Fetch an application and current status for API responses.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, LoanServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }
}

/// Error raised by the loan application service.
#[derive(Debug, thiserror::Error)]
pub enum LoanServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notice(#[from] NoticeError),
}
