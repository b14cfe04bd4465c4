use super::common::*;
use crate::workflows::loans::applications::assessment::{
    AssessmentEngine, AssessmentError, DecisionRule, FactorKind, PolicyError,
    RecommendationAction, RiskBand,
};
use crate::workflows::loans::applications::domain::{
    DerivedMetrics, Metric, RiskLevel,
};
use crate::workflows::loans::applications::intake::IntakeGuard;

fn engine() -> AssessmentEngine {
    AssessmentEngine::new(policy()).expect("standard policy validates")
}

fn metric_level(
    result: &crate::workflows::loans::applications::RiskAssessmentResult,
    metric: Metric,
) -> RiskLevel {
    result
        .metrics
        .iter()
        .find(|assessment| assessment.metric == metric)
        .unwrap_or_else(|| panic!("metric {metric} missing from result"))
        .level
}

#[test]
fn strong_file_approves_with_low_overall_risk() {
    let result = engine()
        .assess(&strong_profile("strong"))
        .expect("strong profile assesses");

    assert_eq!(result.recommendation, RecommendationAction::Approve);
    assert_eq!(result.overall_risk_level, RiskLevel::Low);
    assert!((result.base_score - 91.0).abs() < 1e-9);
    assert!((result.adjusted_score - 96.0).abs() < 1e-9);
    assert!(result
        .applied_factors
        .iter()
        .any(|factor| factor.name == "deep_reserves" && factor.kind == FactorKind::Compensating));
    assert!(result.risk_flags.is_empty());
}

#[test]
fn weak_file_denies_below_forty() {
    let result = engine()
        .assess(&weak_profile("weak"))
        .expect("weak profile assesses");

    assert_eq!(result.recommendation, RecommendationAction::Deny);
    assert!(result.adjusted_score < 40.0);
    assert_eq!(result.overall_risk_level, RiskLevel::Critical);
    assert_eq!(metric_level(&result, Metric::CreditScore), RiskLevel::High);
    assert_eq!(metric_level(&result, Metric::DebtToIncome), RiskLevel::High);
    assert!(result
        .applied_factors
        .iter()
        .any(|factor| factor.name == "dti_above_qm" && factor.delta < 0.0));
    // High metrics each carry an audit flag with a suggested mitigation.
    assert!(result
        .risk_flags
        .iter()
        .any(|flag| flag.source == "credit.high" && flag.mitigation.is_some()));
}

#[test]
fn recent_bankruptcy_caps_recommendation_at_escalate() {
    let mut profile = strong_profile("bankruptcy");
    profile.declarations.no_bankruptcy_7_years = false;

    let result = engine().assess(&profile).expect("profile assesses");

    // The raw score would approve; the declaration override caps it.
    assert!(result.adjusted_score >= 85.0);
    assert_eq!(result.recommendation, RecommendationAction::Escalate);
    assert_eq!(result.overall_risk_level, RiskLevel::Critical);
    assert!(result.risk_flags.iter().any(|flag| {
        flag.source == "declaration.bankruptcy" && flag.severity == RiskLevel::Critical
    }));
}

#[test]
fn denied_file_stays_denied_under_declaration_override() {
    let mut profile = weak_profile("deny-override");
    profile.declarations.no_foreclosure_7_years = false;

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(result.recommendation, RecommendationAction::Deny);
}

#[test]
fn assessment_is_deterministic() {
    let profile = strong_profile("determinism");
    let engine = engine();

    let first = engine.assess(&profile).expect("assesses");
    let second = engine.assess(&profile).expect("assesses");

    let first_json = serde_json::to_string(&first).expect("serializes");
    let second_json = serde_json::to_string(&second).expect("serializes");
    assert_eq!(first_json, second_json);
}

#[test]
fn boundary_values_take_the_more_favorable_tier() {
    let mut profile = strong_profile("boundaries");
    profile.credit_score = 750;
    profile.dti_ratio = 36.0;
    profile.ltv_ratio = 80.0;

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(metric_level(&result, Metric::CreditScore), RiskLevel::Low);
    assert_eq!(metric_level(&result, Metric::DebtToIncome), RiskLevel::Low);
    assert_eq!(metric_level(&result, Metric::LoanToValue), RiskLevel::Low);
}

#[test]
fn dti_at_forty_three_is_medium_not_high() {
    let mut profile = strong_profile("dti-43");
    profile.dti_ratio = 43.0;

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(metric_level(&result, Metric::DebtToIncome), RiskLevel::Medium);
}

#[test]
fn adjusted_score_clamps_at_one_hundred() {
    let mut profile = strong_profile("clamp-high");
    profile.credit_score = 800;
    profile.dti_ratio = 20.0;
    profile.ltv_ratio = 55.0;
    profile.employment.years_in_role = Some(6.0);
    profile.reserves_months = Some(12.0);

    let result = engine().assess(&profile).expect("profile assesses");

    // Base 100 plus four +5 compensating factors raw-sums to 120.
    assert_eq!(result.base_score, 100.0);
    assert_eq!(result.adjusted_score, 100.0);
    assert!(result.applied_factors.len() >= 4);
}

#[test]
fn adjusted_score_clamps_at_zero() {
    let mut profile = weak_profile("clamp-low");
    profile.credit_score = 400;
    profile.dti_ratio = 60.0;
    profile.ltv_ratio = 98.0;
    profile.employment.years_in_role = Some(0.1);
    profile.reserves_months = Some(0.5);

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(result.base_score, 10.0);
    assert_eq!(result.adjusted_score, 0.0);
    assert_eq!(result.recommendation, RecommendationAction::Deny);
}

#[test]
fn applied_factors_preserve_declaration_order() {
    let mut profile = strong_profile("factor-order");
    profile.credit_score = 800;
    profile.ltv_ratio = 55.0;
    profile.employment.years_in_role = Some(6.0);
    profile.reserves_months = Some(12.0);

    let result = engine().assess(&profile).expect("profile assesses");

    let names: Vec<&str> = result
        .applied_factors
        .iter()
        .map(|factor| factor.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "deep_reserves",
            "long_employment",
            "strong_credit",
            "substantial_equity"
        ]
    );
}

#[test]
fn unavailable_reserves_use_the_policy_fallback() {
    let mut submission = strong_submission();
    submission.liquid_assets = None;
    submission.estimated_monthly_housing_payment = None;
    let mut profile = IntakeGuard
        .profile_from_submission(submission)
        .expect("submission validates");
    profile.application_id =
        crate::workflows::loans::applications::ApplicationId("loan-test-fallback".to_string());

    let result = engine().assess(&profile).expect("profile assesses");

    let reserves = result
        .metrics
        .iter()
        .find(|assessment| assessment.metric == Metric::Reserves)
        .expect("reserves assessed");
    assert_eq!(reserves.value, None);
    assert_eq!(reserves.level, RiskLevel::High);
    assert_eq!(reserves.policy_reference, "reserves.unverified");
}

#[test]
fn out_of_range_value_names_the_metric() {
    // The credit band floor is 300; a reading below it matches no band.
    let mut profile = strong_profile("out-of-range");
    profile.credit_score = 250;

    let error = engine()
        .assess(&profile)
        .expect_err("value beyond every band");

    match error {
        AssessmentError::OutOfRange { metric, value } => {
            assert_eq!(metric, Metric::CreditScore);
            assert_eq!(value, 250.0);
        }
        other => panic!("expected out-of-range error, got {other:?}"),
    }
}

#[test]
fn deep_reserves_beyond_any_cap_still_classify_low() {
    // A wealthy file: $500k liquid against a $2k payment is 250 months of
    // reserves, which must land in the open-ended low band, not error out.
    let mut submission = strong_submission();
    submission.credit_score = Some(800);
    submission.loan_amount = Some(66_000.0);
    submission.liquid_assets = Some(500_000.0);
    submission.estimated_monthly_housing_payment = Some(2_000.0);
    let mut profile = IntakeGuard
        .profile_from_submission(submission)
        .expect("submission validates");
    profile.application_id =
        crate::workflows::loans::applications::ApplicationId("loan-test-wealthy".to_string());

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(metric_level(&result, Metric::Reserves), RiskLevel::Low);
    assert_eq!(result.recommendation, RecommendationAction::Approve);
}

#[test]
fn extreme_unfavorable_readings_classify_into_terminal_bands() {
    let mut profile = weak_profile("extreme");
    profile.dti_ratio = 130.0;
    profile.ltv_ratio = 140.0;
    profile.employment.years_in_role = Some(45.0);

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(metric_level(&result, Metric::DebtToIncome), RiskLevel::Critical);
    assert_eq!(metric_level(&result, Metric::LoanToValue), RiskLevel::Critical);
    assert_eq!(
        metric_level(&result, Metric::EmploymentStability),
        RiskLevel::Low
    );
}

#[test]
fn weights_not_summing_to_one_fail_at_load() {
    let mut bundle = policy();
    bundle.weights.reserves = 0.2;

    let error = AssessmentEngine::new(bundle).expect_err("weights are invalid");

    match error {
        PolicyError::WeightSum { found } => assert!((found - 1.1).abs() < 1e-9),
        other => panic!("expected weight sum error, got {other:?}"),
    }
}

#[test]
fn band_gaps_fail_at_load() {
    let mut bundle = policy();
    let bands = bundle
        .thresholds
        .get_mut(&Metric::CreditScore)
        .expect("credit bands exist");
    bands.bands.retain(|band| band.level != RiskLevel::High);

    let error = AssessmentEngine::new(bundle).expect_err("gap between 580 and 660");

    match error {
        PolicyError::BandGap { metric, .. } => assert_eq!(metric, Metric::CreditScore),
        other => panic!("expected band gap error, got {other:?}"),
    }
}

#[test]
fn band_declaration_must_run_most_to_least_favorable() {
    let mut bundle = policy();
    let bands = bundle
        .thresholds
        .get_mut(&Metric::DebtToIncome)
        .expect("dti bands exist");
    bands.bands.reverse();

    let error = AssessmentEngine::new(bundle).expect_err("declaration order is invalid");

    match error {
        PolicyError::BandOrder { metric } => assert_eq!(metric, Metric::DebtToIncome),
        other => panic!("expected band order error, got {other:?}"),
    }
}

#[test]
fn inverted_band_fails_at_load() {
    let mut bundle = policy();
    let bands = bundle
        .thresholds
        .get_mut(&Metric::Reserves)
        .expect("reserve bands exist");
    bands.bands[0] = RiskBand {
        min: 120.0,
        max: Some(6.0),
        level: RiskLevel::Low,
        clause: "reserves.low".to_string(),
    };

    let error = AssessmentEngine::new(bundle).expect_err("band is inverted");

    assert!(matches!(error, PolicyError::InvertedBand { .. }));
}

#[test]
fn overlapping_bands_fail_at_load_as_overlap() {
    let mut bundle = policy();
    let bands = bundle
        .thresholds
        .get_mut(&Metric::LoanToValue)
        .expect("ltv bands exist");
    // Medium now starts inside the low band.
    bands.bands[1].min = 75.0;

    let error = AssessmentEngine::new(bundle).expect_err("bands overlap");

    match error {
        PolicyError::BandOverlap { metric, .. } => assert_eq!(metric, Metric::LoanToValue),
        other => panic!("expected band overlap error, got {other:?}"),
    }
}

#[test]
fn only_the_topmost_band_may_be_open_ended() {
    let mut bundle = policy();
    let bands = bundle
        .thresholds
        .get_mut(&Metric::DebtToIncome)
        .expect("dti bands exist");
    bands.bands[1].max = None;

    let error = AssessmentEngine::new(bundle).expect_err("mid band cannot run open");

    assert!(matches!(error, PolicyError::BandOverlap { .. }));
}

#[test]
fn decision_table_without_floor_fails_at_load() {
    let mut bundle = policy();
    bundle.decision_table.pop();

    let error = AssessmentEngine::new(bundle).expect_err("table has no zero floor");

    match error {
        PolicyError::DecisionTableFloor { found } => assert_eq!(found, 40.0),
        other => panic!("expected decision table floor error, got {other:?}"),
    }
}

#[test]
fn decision_table_must_descend() {
    let mut bundle = policy();
    bundle.decision_table.swap(0, 1);

    let error = AssessmentEngine::new(bundle).expect_err("table is unsorted");

    assert!(matches!(error, PolicyError::DecisionTableOrder { .. }));
}

#[test]
fn custom_decision_table_drives_the_recommendation() {
    let mut bundle = policy();
    bundle.decision_table = vec![
        DecisionRule {
            min_score: 95.0,
            action: RecommendationAction::Approve,
        },
        DecisionRule {
            min_score: 0.0,
            action: RecommendationAction::Review,
        },
    ];
    let engine = AssessmentEngine::new(bundle).expect("custom table validates");

    let result = engine
        .assess(&strong_profile("custom-table"))
        .expect("profile assesses");

    // Adjusted 96 clears the stricter 95 floor.
    assert_eq!(result.recommendation, RecommendationAction::Approve);
}

#[test]
fn derived_overrides_flow_through_to_classification() {
    let mut submission = strong_submission();
    submission.derived = Some(DerivedMetrics {
        dti_ratio: Some(48.0),
        ltv_ratio: None,
        reserves_months: None,
    });
    let mut profile = IntakeGuard
        .profile_from_submission(submission)
        .expect("submission validates");
    profile.application_id =
        crate::workflows::loans::applications::ApplicationId("loan-test-derived".to_string());

    let result = engine().assess(&profile).expect("profile assesses");

    assert_eq!(metric_level(&result, Metric::DebtToIncome), RiskLevel::High);
}
