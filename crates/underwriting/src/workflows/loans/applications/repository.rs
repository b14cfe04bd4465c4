use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::assessment::RiskAssessmentResult;
use super::domain::{ApplicationId, LoanApplicationStatus, LoanProfile};

/// Repository record containing the profile, latest assessment, and status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub profile: LoanProfile,
    pub status: LoanApplicationStatus,
    pub assessment: Option<RiskAssessmentResult>,
    pub assessed_on: Option<NaiveDate>,
}

impl ApplicationRecord {
    pub fn decision_rationale(&self) -> String {
        match &self.assessment {
            Some(result) => format!(
                "{} (adjusted score {:.1}, policy {})",
                result.recommendation.label(),
                result.adjusted_score,
                result.policy_version
            ),
            None => "pending assessment".to_string(),
        }
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.profile.application_id.clone(),
            status: self.status.label(),
            decision_rationale: self.decision_rationale(),
            adjusted_score: self
                .assessment
                .as_ref()
                .map(|result| result.adjusted_score),
            recommendation: self
                .assessment
                .as_ref()
                .map(|result| result.recommendation.label()),
        }
    }
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<ApplicationRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook for decision notices (approval letters,
/// adverse-action trails).
pub trait NoticePublisher: Send + Sync {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NoticeError>;
}

/// Notice payload so routes/tests can assert integration boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub template: String,
    pub application_id: ApplicationId,
    pub details: BTreeMap<String, String>,
}

/// Notice dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NoticeError {
    #[error("notice transport unavailable: {0}")]
    Transport(String),
}

/// Sanitized representation of an application's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub decision_rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<&'static str>,
}
