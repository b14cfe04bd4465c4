use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::super::domain::{Metric, OccupancyType, RiskLevel};
use super::policy::RecommendationAction;

const WEIGHT_TOLERANCE: f64 = 1e-6;
const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// One classification range for a metric. Bounds are inclusive; bands are
/// declared from most to least favorable and the first containing band wins,
/// so a value sitting exactly on a shared boundary always resolves to the
/// more favorable tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskBand {
    pub min: f64,
    /// Inclusive upper bound; `None` leaves the band open-ended. Exactly the
    /// topmost band of a metric may be unbounded, so extreme but legitimate
    /// readings (say, hundreds of months of reserves) still classify.
    #[serde(default)]
    pub max: Option<f64>,
    pub level: RiskLevel,
    /// Policy clause cited in the assessment output, e.g. `credit.low`.
    pub clause: String,
}

impl RiskBand {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

/// Classification to apply when a metric the policy tolerates being absent
/// (reserves, employment tenure) was never supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableRule {
    pub level: RiskLevel,
    pub clause: String,
}

/// Band set for a single metric plus the optional unavailable fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBands {
    pub bands: Vec<RiskBand>,
    #[serde(default)]
    pub unavailable: Option<UnavailableRule>,
}

/// Weight per metric; must sum to 1.0 within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub credit_score: f64,
    pub debt_to_income: f64,
    pub loan_to_value: f64,
    pub employment_stability: f64,
    pub reserves: f64,
}

impl ScoringWeights {
    pub fn weight_for(&self, metric: Metric) -> f64 {
        match metric {
            Metric::CreditScore => self.credit_score,
            Metric::DebtToIncome => self.debt_to_income,
            Metric::LoanToValue => self.loan_to_value,
            Metric::EmploymentStability => self.employment_stability,
            Metric::Reserves => self.reserves,
        }
    }

    pub fn sum(&self) -> f64 {
        self.credit_score
            + self.debt_to_income
            + self.loan_to_value
            + self.employment_stability
            + self.reserves
    }
}

/// Numeric sub-score per risk level; policy data, never code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelScores {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl LevelScores {
    pub fn score_for(&self, level: RiskLevel) -> f64 {
        match level {
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Compensating,
    Negative,
}

/// Declarative trigger predicate so factor definitions stay plain data a
/// policy author can express in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FactorTrigger {
    ReservesAtLeast { months: f64 },
    ReservesBelow { months: f64 },
    CreditScoreAtLeast { score: u16 },
    CreditScoreBelow { score: u16 },
    DtiAtMost { percent: f64 },
    DtiAbove { percent: f64 },
    LtvAtMost { percent: f64 },
    LtvAbove { percent: f64 },
    EmploymentYearsAtLeast { years: f64 },
    LiquidAssetsAtLeast { amount: f64 },
    SelfEmployed,
    OccupancyIs { occupancy: OccupancyType },
}

/// Named score adjustment with its trigger and the rationale quoted in the
/// assessment output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorDefinition {
    pub name: String,
    pub rationale: String,
    /// Point delta applied to the base score; positive for compensating
    /// factors, negative for negative factors.
    pub delta: f64,
    pub trigger: FactorTrigger,
}

/// One row of the decision table: first rule whose floor the adjusted score
/// reaches wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRule {
    pub min_score: f64,
    pub action: RecommendationAction,
}

/// Maps the adjusted score to the file-level risk classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallBand {
    pub min_score: f64,
    pub level: RiskLevel,
}

/// Complete, immutable policy configuration for one assessment run.
///
/// Validated exhaustively by [`PolicyBundle::validate`] before the engine
/// accepts it; a malformed bundle fails at load, never mid-assessment, and
/// never silently falls back to defaults. Hot reload means swapping an entire
/// freshly-validated bundle, so no assessment observes a mix of versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyBundle {
    pub version: String,
    pub thresholds: BTreeMap<Metric, MetricBands>,
    pub weights: ScoringWeights,
    pub level_scores: LevelScores,
    pub compensating_factors: Vec<FactorDefinition>,
    pub negative_factors: Vec<FactorDefinition>,
    pub decision_table: Vec<DecisionRule>,
    pub overall_bands: Vec<OverallBand>,
}

/// Errors detected while loading or validating a policy bundle.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("metric weights must sum to 1.0 within 1e-6 (found {found:.6})")]
    WeightSum { found: f64 },
    #[error("no risk bands configured for metric {metric}")]
    MissingBands { metric: Metric },
    #[error("risk band for {metric} is inverted (min {min} above max {max})")]
    InvertedBand { metric: Metric, min: f64, max: f64 },
    #[error("risk bands for {metric} must be declared from most to least favorable")]
    BandOrder { metric: Metric },
    #[error("risk bands for {metric} leave a gap between {upper} and {lower}")]
    BandGap {
        metric: Metric,
        upper: f64,
        lower: f64,
    },
    #[error("risk bands for {metric} overlap (one runs to {first_max}, the next starts at {next_min})")]
    BandOverlap {
        metric: Metric,
        first_max: f64,
        next_min: f64,
    },
    #[error("decision table is empty")]
    EmptyDecisionTable,
    #[error("decision table thresholds must strictly descend ({previous} then {current})")]
    DecisionTableOrder { previous: f64, current: f64 },
    #[error("decision table must end at a floor of 0 (found {found})")]
    DecisionTableFloor { found: f64 },
    #[error("overall risk bands are empty")]
    EmptyOverallBands,
    #[error("overall risk bands must strictly descend and end at a floor of 0")]
    OverallBandShape,
    #[error("failed to parse policy bundle: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PolicyBundle {
    /// Read and validate a bundle from a JSON source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PolicyError> {
        let bundle: PolicyBundle = serde_json::from_reader(reader)?;
        bundle.validate()?;
        Ok(bundle)
    }

    pub fn bands_for(&self, metric: Metric) -> Result<&MetricBands, PolicyError> {
        self.thresholds
            .get(&metric)
            .ok_or(PolicyError::MissingBands { metric })
    }

    /// Check every structural invariant the engine relies on.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let weight_sum = self.weights.sum();
        if (weight_sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(PolicyError::WeightSum { found: weight_sum });
        }

        for metric in Metric::ALL {
            let bands = self.bands_for(metric)?;
            validate_bands(metric, &bands.bands)?;
        }

        validate_decision_table(&self.decision_table)?;
        validate_overall_bands(&self.overall_bands)?;

        Ok(())
    }
}

fn validate_bands(metric: Metric, bands: &[RiskBand]) -> Result<(), PolicyError> {
    if bands.is_empty() {
        return Err(PolicyError::MissingBands { metric });
    }

    for band in bands {
        if let Some(max) = band.max {
            if band.min > max {
                return Err(PolicyError::InvertedBand {
                    metric,
                    min: band.min,
                    max,
                });
            }
        }
    }

    // Declaration order encodes favorability; first match wins at boundaries.
    for pair in bands.windows(2) {
        if pair[1].level < pair[0].level {
            return Err(PolicyError::BandOrder { metric });
        }
    }

    // Sorted by lower bound the bands must tile the domain: each band starts
    // exactly where its neighbor ends, and only the topmost one may run open.
    let mut sorted: Vec<&RiskBand> = bands.iter().collect();
    sorted.sort_by(|a, b| a.min.total_cmp(&b.min));
    for pair in sorted.windows(2) {
        let Some(upper) = pair[0].max else {
            return Err(PolicyError::BandOverlap {
                metric,
                first_max: f64::INFINITY,
                next_min: pair[1].min,
            });
        };
        let step = pair[1].min - upper;
        if step > BOUNDARY_TOLERANCE {
            return Err(PolicyError::BandGap {
                metric,
                upper,
                lower: pair[1].min,
            });
        }
        if step < -BOUNDARY_TOLERANCE {
            return Err(PolicyError::BandOverlap {
                metric,
                first_max: upper,
                next_min: pair[1].min,
            });
        }
    }

    Ok(())
}

fn validate_decision_table(table: &[DecisionRule]) -> Result<(), PolicyError> {
    let last = table.last().ok_or(PolicyError::EmptyDecisionTable)?;
    for pair in table.windows(2) {
        if pair[1].min_score >= pair[0].min_score {
            return Err(PolicyError::DecisionTableOrder {
                previous: pair[0].min_score,
                current: pair[1].min_score,
            });
        }
    }
    if last.min_score != 0.0 {
        return Err(PolicyError::DecisionTableFloor {
            found: last.min_score,
        });
    }
    Ok(())
}

fn validate_overall_bands(bands: &[OverallBand]) -> Result<(), PolicyError> {
    let last = bands.last().ok_or(PolicyError::EmptyOverallBands)?;
    for pair in bands.windows(2) {
        if pair[1].min_score >= pair[0].min_score {
            return Err(PolicyError::OverallBandShape);
        }
    }
    if last.min_score != 0.0 {
        return Err(PolicyError::OverallBandShape);
    }
    Ok(())
}

fn band(min: f64, max: f64, level: RiskLevel, clause: &str) -> RiskBand {
    RiskBand {
        min,
        max: Some(max),
        level,
        clause: clause.to_string(),
    }
}

fn open_band(min: f64, level: RiskLevel, clause: &str) -> RiskBand {
    RiskBand {
        min,
        max: None,
        level,
        clause: clause.to_string(),
    }
}

impl PolicyBundle {
    /// Built-in standard lending policy. Mirrors the documented underwriting
    /// guidelines: credit 750+/DTI ≤36/LTV ≤80 are the favorable tiers, the
    /// decision floor is 85/70/55/40, and QM-style negative factors pull down
    /// marginal files.
    pub fn standard() -> Self {
        let mut thresholds = BTreeMap::new();

        thresholds.insert(
            Metric::CreditScore,
            MetricBands {
                bands: vec![
                    open_band(750.0, RiskLevel::Low, "credit.low"),
                    band(660.0, 750.0, RiskLevel::Medium, "credit.medium"),
                    band(580.0, 660.0, RiskLevel::High, "credit.high"),
                    band(300.0, 580.0, RiskLevel::Critical, "credit.critical"),
                ],
                unavailable: None,
            },
        );

        thresholds.insert(
            Metric::DebtToIncome,
            MetricBands {
                bands: vec![
                    band(0.0, 36.0, RiskLevel::Low, "dti.low"),
                    band(36.0, 43.0, RiskLevel::Medium, "dti.medium"),
                    band(43.0, 50.0, RiskLevel::High, "dti.high"),
                    open_band(50.0, RiskLevel::Critical, "dti.critical"),
                ],
                unavailable: None,
            },
        );

        thresholds.insert(
            Metric::LoanToValue,
            MetricBands {
                bands: vec![
                    band(0.0, 80.0, RiskLevel::Low, "ltv.low"),
                    band(80.0, 90.0, RiskLevel::Medium, "ltv.medium"),
                    band(90.0, 95.0, RiskLevel::High, "ltv.high"),
                    open_band(95.0, RiskLevel::Critical, "ltv.critical"),
                ],
                unavailable: None,
            },
        );

        thresholds.insert(
            Metric::EmploymentStability,
            MetricBands {
                bands: vec![
                    open_band(2.0, RiskLevel::Low, "employment.low"),
                    band(1.0, 2.0, RiskLevel::Medium, "employment.medium"),
                    band(0.25, 1.0, RiskLevel::High, "employment.high"),
                    band(0.0, 0.25, RiskLevel::Critical, "employment.critical"),
                ],
                unavailable: Some(UnavailableRule {
                    level: RiskLevel::High,
                    clause: "employment.unverified".to_string(),
                }),
            },
        );

        thresholds.insert(
            Metric::Reserves,
            MetricBands {
                bands: vec![
                    open_band(6.0, RiskLevel::Low, "reserves.low"),
                    band(3.0, 6.0, RiskLevel::Medium, "reserves.medium"),
                    band(1.0, 3.0, RiskLevel::High, "reserves.high"),
                    band(0.0, 1.0, RiskLevel::Critical, "reserves.critical"),
                ],
                unavailable: Some(UnavailableRule {
                    level: RiskLevel::High,
                    clause: "reserves.unverified".to_string(),
                }),
            },
        );

        Self {
            version: "2025.1-standard".to_string(),
            thresholds,
            weights: ScoringWeights {
                credit_score: 0.30,
                debt_to_income: 0.25,
                loan_to_value: 0.20,
                employment_stability: 0.15,
                reserves: 0.10,
            },
            level_scores: LevelScores {
                low: 100.0,
                medium: 70.0,
                high: 40.0,
                critical: 10.0,
            },
            compensating_factors: vec![
                FactorDefinition {
                    name: "deep_reserves".to_string(),
                    rationale: "liquid reserves cover six or more months of housing payments"
                        .to_string(),
                    delta: 5.0,
                    trigger: FactorTrigger::ReservesAtLeast { months: 6.0 },
                },
                FactorDefinition {
                    name: "long_employment".to_string(),
                    rationale: "five or more years with the current employer".to_string(),
                    delta: 5.0,
                    trigger: FactorTrigger::EmploymentYearsAtLeast { years: 5.0 },
                },
                FactorDefinition {
                    name: "strong_credit".to_string(),
                    rationale: "credit score of 780 or above".to_string(),
                    delta: 5.0,
                    trigger: FactorTrigger::CreditScoreAtLeast { score: 780 },
                },
                FactorDefinition {
                    name: "substantial_equity".to_string(),
                    rationale: "loan-to-value of 60% or below".to_string(),
                    delta: 5.0,
                    trigger: FactorTrigger::LtvAtMost { percent: 60.0 },
                },
            ],
            negative_factors: vec![
                FactorDefinition {
                    name: "subprime_credit".to_string(),
                    rationale: "credit score below 620".to_string(),
                    delta: -10.0,
                    trigger: FactorTrigger::CreditScoreBelow { score: 620 },
                },
                FactorDefinition {
                    name: "dti_above_qm".to_string(),
                    rationale: "debt-to-income exceeds the 43% qualified mortgage threshold"
                        .to_string(),
                    delta: -10.0,
                    trigger: FactorTrigger::DtiAbove { percent: 43.0 },
                },
                FactorDefinition {
                    name: "minimal_reserves".to_string(),
                    rationale: "fewer than two months of reserves".to_string(),
                    delta: -5.0,
                    trigger: FactorTrigger::ReservesBelow { months: 2.0 },
                },
                FactorDefinition {
                    name: "investment_occupancy".to_string(),
                    rationale: "non-owner-occupied property".to_string(),
                    delta: -5.0,
                    trigger: FactorTrigger::OccupancyIs {
                        occupancy: OccupancyType::Investment,
                    },
                },
            ],
            decision_table: vec![
                DecisionRule {
                    min_score: 85.0,
                    action: RecommendationAction::Approve,
                },
                DecisionRule {
                    min_score: 70.0,
                    action: RecommendationAction::ApproveWithConditions,
                },
                DecisionRule {
                    min_score: 55.0,
                    action: RecommendationAction::Review,
                },
                DecisionRule {
                    min_score: 40.0,
                    action: RecommendationAction::Escalate,
                },
                DecisionRule {
                    min_score: 0.0,
                    action: RecommendationAction::Deny,
                },
            ],
            overall_bands: vec![
                OverallBand {
                    min_score: 80.0,
                    level: RiskLevel::Low,
                },
                OverallBand {
                    min_score: 60.0,
                    level: RiskLevel::Medium,
                },
                OverallBand {
                    min_score: 40.0,
                    level: RiskLevel::High,
                },
                OverallBand {
                    min_score: 0.0,
                    level: RiskLevel::Critical,
                },
            ],
        }
    }
}
