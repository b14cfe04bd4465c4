use super::super::domain::{EmploymentStatus, LoanProfile, Metric, RiskLevel};
use super::config::{FactorDefinition, FactorKind, FactorTrigger, MetricBands, PolicyBundle};
use super::{AppliedFactor, AssessmentError, MetricAssessment};

/// Resolve the numeric reading for a metric. `None` means the datum was
/// legitimately unavailable (reserves never documented, tenure unknown);
/// required figures were already enforced at intake.
fn metric_value(profile: &LoanProfile, metric: Metric) -> Option<f64> {
    match metric {
        Metric::CreditScore => Some(f64::from(profile.credit_score)),
        Metric::DebtToIncome => Some(profile.dti_ratio),
        Metric::LoanToValue => Some(profile.ltv_ratio),
        Metric::EmploymentStability => match profile.employment.status {
            // No tenure can make an unemployed applicant look stable.
            EmploymentStatus::Unemployed => Some(0.0),
            _ => profile.employment.years_in_role,
        },
        Metric::Reserves => profile.reserves_months,
    }
}

/// Classify one metric value against its band set. First containing band in
/// declaration order wins, which places shared boundary values in the more
/// favorable tier.
pub(crate) fn classify_metric(
    metric: Metric,
    value: f64,
    bands: &MetricBands,
) -> Result<(RiskLevel, &str), AssessmentError> {
    bands
        .bands
        .iter()
        .find(|band| band.contains(value))
        .map(|band| (band.level, band.clause.as_str()))
        .ok_or(AssessmentError::OutOfRange { metric, value })
}

/// Classify all five metrics and fold them into the weighted base score.
pub(crate) fn score_profile(
    profile: &LoanProfile,
    bundle: &PolicyBundle,
) -> Result<(Vec<MetricAssessment>, f64), AssessmentError> {
    let mut assessments = Vec::with_capacity(Metric::ALL.len());
    let mut base_score = 0.0;

    for metric in Metric::ALL {
        let bands = bundle
            .thresholds
            .get(&metric)
            .ok_or(AssessmentError::UnavailableMetric { metric })?;

        let value = metric_value(profile, metric);
        let (level, clause) = match value {
            Some(value) => classify_metric(metric, value, bands)?,
            None => {
                let rule = bands
                    .unavailable
                    .as_ref()
                    .ok_or(AssessmentError::UnavailableMetric { metric })?;
                (rule.level, rule.clause.as_str())
            }
        };

        let weight = bundle.weights.weight_for(metric);
        let sub_score = bundle.level_scores.score_for(level);
        base_score += sub_score * weight;

        assessments.push(MetricAssessment {
            metric,
            value,
            level,
            weight,
            sub_score,
            policy_reference: clause.to_string(),
        });
    }

    Ok((assessments, base_score.clamp(0.0, 100.0)))
}

fn trigger_matches(trigger: &FactorTrigger, profile: &LoanProfile) -> bool {
    match trigger {
        FactorTrigger::ReservesAtLeast { months } => profile
            .reserves_months
            .map(|reserves| reserves >= *months)
            .unwrap_or(false),
        FactorTrigger::ReservesBelow { months } => profile
            .reserves_months
            .map(|reserves| reserves < *months)
            .unwrap_or(false),
        FactorTrigger::CreditScoreAtLeast { score } => profile.credit_score >= *score,
        FactorTrigger::CreditScoreBelow { score } => profile.credit_score < *score,
        FactorTrigger::DtiAtMost { percent } => profile.dti_ratio <= *percent,
        FactorTrigger::DtiAbove { percent } => profile.dti_ratio > *percent,
        FactorTrigger::LtvAtMost { percent } => profile.ltv_ratio <= *percent,
        FactorTrigger::LtvAbove { percent } => profile.ltv_ratio > *percent,
        FactorTrigger::EmploymentYearsAtLeast { years } => profile
            .employment
            .years_in_role
            .map(|tenure| tenure >= *years)
            .unwrap_or(false),
        FactorTrigger::LiquidAssetsAtLeast { amount } => profile
            .liquid_assets
            .map(|liquid| liquid >= *amount)
            .unwrap_or(false),
        FactorTrigger::SelfEmployed => {
            profile.employment.status == EmploymentStatus::SelfEmployed
        }
        FactorTrigger::OccupancyIs { occupancy } => profile.occupancy == *occupancy,
    }
}

fn apply_matching(
    factors: &[FactorDefinition],
    kind: FactorKind,
    profile: &LoanProfile,
    score: &mut f64,
    applied: &mut Vec<AppliedFactor>,
) {
    for factor in factors {
        if trigger_matches(&factor.trigger, profile) {
            *score += factor.delta;
            applied.push(AppliedFactor {
                name: factor.name.clone(),
                kind,
                delta: factor.delta,
                rationale: factor.rationale.clone(),
            });
        }
    }
}

/// Apply compensating then negative factors to the base score and clamp to
/// [0, 100]. Addition commutes, so ordering only matters for the audit trail:
/// the applied list preserves declaration order.
pub(crate) fn apply_factors(
    base_score: f64,
    profile: &LoanProfile,
    bundle: &PolicyBundle,
) -> (f64, Vec<AppliedFactor>) {
    let mut adjusted = base_score;
    let mut applied = Vec::new();

    apply_matching(
        &bundle.compensating_factors,
        FactorKind::Compensating,
        profile,
        &mut adjusted,
        &mut applied,
    );
    apply_matching(
        &bundle.negative_factors,
        FactorKind::Negative,
        profile,
        &mut adjusted,
        &mut applied,
    );

    (adjusted.clamp(0.0, 100.0), applied)
}
