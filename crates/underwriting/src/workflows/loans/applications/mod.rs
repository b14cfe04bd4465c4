//! Loan application intake, risk assessment, and decision workflows.
//!
//! The assessment engine is deliberately pure: intake produces a validated
//! [`LoanProfile`], the engine scores it against an immutable
//! [`assessment::PolicyBundle`], and the service persists the outcome and
//! dispatches decision notices. Retrieval of policy text and precedent data
//! happens upstream; this module only consumes resolved structured inputs.

pub mod assessment;
pub mod domain;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use assessment::{
    AppliedFactor, AssessmentEngine, AssessmentError, MetricAssessment, PolicyBundle, PolicyError,
    RecommendationAction, RiskAssessmentResult, RiskFlag,
};
pub use domain::{
    ApplicationId, Declarations, DerivedMetrics, EmploymentRecord, EmploymentStatus,
    LoanApplicationStatus, LoanApplicationSubmission, LoanProfile, LoanPurpose, Metric,
    OccupancyType, PropertyType, RiskLevel,
};
pub use intake::{IntakeError, IntakeGuard};
pub use repository::{
    ApplicationRecord, ApplicationRepository, ApplicationStatusView, DecisionNotice, NoticeError,
    NoticePublisher, RepositoryError,
};
pub use router::application_router;
pub use service::{LoanApplicationService, LoanServiceError};
