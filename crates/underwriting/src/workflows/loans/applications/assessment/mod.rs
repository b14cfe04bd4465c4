mod config;
mod policy;
mod rules;

pub use config::{
    DecisionRule, FactorDefinition, FactorKind, FactorTrigger, LevelScores, MetricBands,
    OverallBand, PolicyBundle, PolicyError, RiskBand, ScoringWeights, UnavailableRule,
};
pub use policy::{RecommendationAction, RiskFlag};

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, LoanProfile, Metric, RiskLevel};

/// Stateless engine applying one validated policy bundle to loan profiles.
///
/// `assess` is a pure function of `(profile, bundle)`: identical inputs yield
/// identical results, which keeps every decision replayable for audit. The
/// engine holds no mutable state, so it is safe to share across concurrent
/// assessments.
#[derive(Debug)]
pub struct AssessmentEngine {
    bundle: PolicyBundle,
}

impl AssessmentEngine {
    /// Build an engine, validating the bundle up front. A malformed policy is
    /// rejected here, before any application is scored.
    pub fn new(bundle: PolicyBundle) -> Result<Self, PolicyError> {
        bundle.validate()?;
        Ok(Self { bundle })
    }

    pub fn bundle(&self) -> &PolicyBundle {
        &self.bundle
    }

    /// Run the full rubric: classify each metric, fold the weighted base
    /// score, apply compensating/negative factors, map to a recommendation,
    /// then apply declaration overrides.
    pub fn assess(&self, profile: &LoanProfile) -> Result<RiskAssessmentResult, AssessmentError> {
        let (metrics, base_score) = rules::score_profile(profile, &self.bundle)?;
        let (adjusted_score, applied_factors) =
            rules::apply_factors(base_score, profile, &self.bundle);

        let mut risk_flags = policy::metric_flags(&metrics);
        let declaration_flags = policy::declaration_flags(profile);
        let has_overrides = !declaration_flags.is_empty();
        risk_flags.extend(declaration_flags);

        let recommendation = policy::cap_for_overrides(
            policy::recommend(adjusted_score, &self.bundle.decision_table),
            has_overrides,
        );
        let overall_risk_level = if has_overrides {
            RiskLevel::Critical
        } else {
            policy::overall_level(adjusted_score, &self.bundle.overall_bands)
        };

        Ok(RiskAssessmentResult {
            application_id: profile.application_id.clone(),
            policy_version: self.bundle.version.clone(),
            metrics,
            base_score,
            adjusted_score,
            overall_risk_level,
            recommendation,
            applied_factors,
            risk_flags,
        })
    }
}

/// One metric's contribution, traceable to the policy clause that classified
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAssessment {
    pub metric: Metric,
    /// `None` when the metric was unavailable and the policy's fallback
    /// classification applied.
    pub value: Option<f64>,
    pub level: RiskLevel,
    pub weight: f64,
    pub sub_score: f64,
    pub policy_reference: String,
}

/// A factor whose trigger matched, in policy declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactor {
    pub name: String,
    pub kind: FactorKind,
    pub delta: f64,
    pub rationale: String,
}

/// Complete assessment output for one application against one policy version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessmentResult {
    pub application_id: ApplicationId,
    pub policy_version: String,
    pub metrics: Vec<MetricAssessment>,
    pub base_score: f64,
    pub adjusted_score: f64,
    pub overall_risk_level: RiskLevel,
    pub recommendation: RecommendationAction,
    pub applied_factors: Vec<AppliedFactor>,
    pub risk_flags: Vec<RiskFlag>,
}

/// Deterministic assessment failures. None of these are retried; each names
/// the metric so the gap is visible to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("{metric} value {value} falls outside every configured risk band")]
    OutOfRange { metric: Metric, value: f64 },
    #[error("{metric} is unavailable and the policy has no fallback classification")]
    UnavailableMetric { metric: Metric },
}
