use serde::{Deserialize, Serialize};

use super::super::domain::{LoanProfile, Metric, RiskLevel};
use super::config::{DecisionRule, OverallBand};
use super::MetricAssessment;

/// Final recommendation for an assessed application, ordered from most to
/// least favorable so override caps can use `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationAction {
    Approve,
    ApproveWithConditions,
    Review,
    Escalate,
    Deny,
}

impl RecommendationAction {
    pub const fn label(self) -> &'static str {
        match self {
            RecommendationAction::Approve => "approve",
            RecommendationAction::ApproveWithConditions => "approve_with_conditions",
            RecommendationAction::Review => "review",
            RecommendationAction::Escalate => "escalate",
            RecommendationAction::Deny => "deny",
        }
    }
}

/// Audit-facing warning attached to an assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// What raised the flag: a metric clause or a declaration answer.
    pub source: String,
    pub severity: RiskLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

/// First decision rule whose floor the adjusted score reaches. Table shape is
/// validated at bundle load, so a rule always matches.
pub(crate) fn recommend(adjusted_score: f64, table: &[DecisionRule]) -> RecommendationAction {
    table
        .iter()
        .find(|rule| adjusted_score >= rule.min_score)
        .map(|rule| rule.action)
        .unwrap_or(RecommendationAction::Deny)
}

pub(crate) fn overall_level(adjusted_score: f64, bands: &[OverallBand]) -> RiskLevel {
    bands
        .iter()
        .find(|band| adjusted_score >= band.min_score)
        .map(|band| band.level)
        .unwrap_or(RiskLevel::Critical)
}

fn suggested_mitigation(metric: Metric) -> &'static str {
    match metric {
        Metric::CreditScore => "obtain a full tri-merge credit report and letter of explanation",
        Metric::DebtToIncome => "document additional income or pay down revolving balances",
        Metric::LoanToValue => "increase down payment or obtain mortgage insurance",
        Metric::EmploymentStability => "collect employment verification covering two years",
        Metric::Reserves => "verify additional liquid assets or gift funds",
    }
}

/// One flag per metric classified at high or critical risk.
pub(crate) fn metric_flags(assessments: &[MetricAssessment]) -> Vec<RiskFlag> {
    assessments
        .iter()
        .filter(|assessment| assessment.level >= RiskLevel::High)
        .map(|assessment| RiskFlag {
            source: assessment.policy_reference.clone(),
            severity: assessment.level,
            message: match assessment.value {
                Some(value) => format!(
                    "{} of {value:.2} classified {}",
                    assessment.metric, assessment.level
                ),
                None => format!("{} unavailable, classified {}", assessment.metric, assessment.level),
            },
            mitigation: Some(suggested_mitigation(assessment.metric).to_string()),
        })
        .collect()
}

/// Declaration answers that force a critical flag and cap the recommendation
/// at escalate. This is a hard override on top of the weighted score, never a
/// scored factor.
pub(crate) fn declaration_flags(profile: &LoanProfile) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    let declarations = &profile.declarations;

    let mut flag = |source: &str, message: &str| {
        flags.push(RiskFlag {
            source: source.to_string(),
            severity: RiskLevel::Critical,
            message: message.to_string(),
            mitigation: Some("route to a senior underwriter for manual review".to_string()),
        });
    };

    if !declarations.no_foreclosure_7_years {
        flag(
            "declaration.foreclosure",
            "foreclosure disclosed within the seven year lookback window",
        );
    }
    if !declarations.no_bankruptcy_7_years {
        flag(
            "declaration.bankruptcy",
            "bankruptcy disclosed within the seven year lookback window",
        );
    }
    if !declarations.no_pending_lawsuits {
        flag(
            "declaration.lawsuit",
            "applicant is party to a pending lawsuit",
        );
    }

    flags
}

/// Cap the recommendation at escalate when any declaration override applies;
/// a deny stays a deny.
pub(crate) fn cap_for_overrides(
    action: RecommendationAction,
    has_declaration_flags: bool,
) -> RecommendationAction {
    if has_declaration_flags {
        action.max(RecommendationAction::Escalate)
    } else {
        action
    }
}
