use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::penalties::PenaltyKind;
use crate::config::{ConfigError, WeightConfig};

/// Human-facing grade band.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Caution,
    Poor,
}

/// Ordered grade bands, strictly descending by minimum score and covering
/// [0, 1] without gaps. Validated at configuration load, never at match time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub bands: Vec<(Grade, f64)>,
}

impl GradeThresholds {
    pub fn standard() -> Self {
        Self {
            bands: vec![
                (Grade::Excellent, 0.85),
                (Grade::Good, 0.70),
                (Grade::Fair, 0.55),
                (Grade::Caution, 0.40),
                (Grade::Poor, 0.0),
            ],
        }
    }

    /// First band whose minimum is at or below the score. Boundaries are
    /// inclusive on the lower bound.
    pub fn classify(&self, score: f64) -> Grade {
        for (grade, minimum) in &self.bands {
            if score >= *minimum {
                return *grade;
            }
        }
        // Coverage invariant guarantees the last minimum is 0.0; negative
        // scores cannot reach here because aggregation clamps at zero.
        self.bands.last().map(|(g, _)| *g).unwrap_or(Grade::Poor)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.is_empty() {
            return Err(ConfigError::GradeCoverage { last_minimum: f64::NAN });
        }
        for window in self.bands.windows(2) {
            let (_, upper) = window[0];
            let (_, lower) = window[1];
            if lower >= upper {
                return Err(ConfigError::GradeOrder {
                    upper,
                    lower,
                });
            }
        }
        for (_, minimum) in &self.bands {
            if !(0.0..=1.0).contains(minimum) || minimum.is_nan() {
                return Err(ConfigError::GradeRange { minimum: *minimum });
            }
        }
        let (_, last) = self.bands[self.bands.len() - 1];
        if last != 0.0 {
            return Err(ConfigError::GradeCoverage { last_minimum: last });
        }
        Ok(())
    }
}

/// One category's score with the weight it carried in aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub weight: f64,
}

/// Per-category breakdown of a detailed evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub required: CategoryScore,
    pub preferred: CategoryScore,
    pub experience: CategoryScore,
    pub overall_similarity: CategoryScore,
    pub education: CategoryScore,
    pub certification: CategoryScore,
}

impl CategoryScores {
    pub fn new(
        weights: &WeightConfig,
        required: f64,
        preferred: f64,
        experience: f64,
        overall_similarity: f64,
        education: f64,
        certification: f64,
    ) -> Self {
        let entry = |score, weight| CategoryScore { score, weight };
        Self {
            required: entry(required, weights.required),
            preferred: entry(preferred, weights.preferred),
            experience: entry(experience, weights.experience),
            overall_similarity: entry(overall_similarity, weights.overall),
            education: entry(education, weights.education),
            certification: entry(certification, weights.certification),
        }
    }

    fn weighted_sum(&self) -> f64 {
        [
            self.required,
            self.preferred,
            self.experience,
            self.overall_similarity,
            self.education,
            self.certification,
        ]
        .iter()
        .map(|c| c.score * c.weight)
        .sum()
    }
}

/// Convex combination of category scores minus applied penalties, clamped to
/// [0, 1].
pub fn aggregate(scores: &CategoryScores, penalties: &BTreeMap<PenaltyKind, f64>) -> f64 {
    let penalty_sum: f64 = penalties.values().sum();
    (scores.weighted_sum() - penalty_sum).clamp(0.0, 1.0)
}

/// 0-100 percentage rounded to one decimal, for external reporting.
pub fn to_percentage(score: f64) -> f64 {
    (score * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(weights: &WeightConfig, values: [f64; 6]) -> CategoryScores {
        CategoryScores::new(
            weights, values[0], values[1], values[2], values[3], values[4], values[5],
        )
    }

    #[test]
    fn aggregation_is_a_convex_combination() {
        let weights = WeightConfig::sectional();
        let all_ones = scores(&weights, [1.0; 6]);
        assert!((aggregate(&all_ones, &BTreeMap::new()) - 1.0).abs() < 1e-9);

        let all_zero = scores(&weights, [0.0; 6]);
        assert_eq!(aggregate(&all_zero, &BTreeMap::new()), 0.0);
    }

    #[test]
    fn upweighting_a_category_moves_overall_toward_it() {
        let mut weights = WeightConfig::sectional();
        let base = aggregate(&scores(&weights, [1.0, 0.0, 0.5, 0.5, 0.5, 0.5]), &BTreeMap::new());

        // Shift weight from preferred (score 0.0) to required (score 1.0).
        weights.required += 0.05;
        weights.preferred -= 0.05;
        let shifted =
            aggregate(&scores(&weights, [1.0, 0.0, 0.5, 0.5, 0.5, 0.5]), &BTreeMap::new());

        assert!(shifted > base);
    }

    #[test]
    fn penalties_subtract_and_clamp_at_zero() {
        let weights = WeightConfig::sectional();
        let low = scores(&weights, [0.1; 6]);
        let mut penalties = BTreeMap::new();
        penalties.insert(PenaltyKind::DomainMismatch, 0.2);
        penalties.insert(PenaltyKind::RoleMismatch, 0.15);

        assert_eq!(aggregate(&low, &penalties), 0.0);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert_eq!(to_percentage(0.8149), 81.5);
        assert_eq!(to_percentage(0.81), 81.0);
        assert_eq!(to_percentage(1.0), 100.0);
    }

    #[test]
    fn grade_boundary_is_inclusive() {
        let grades = GradeThresholds::standard();
        assert_eq!(grades.classify(0.85), Grade::Excellent);
        assert_eq!(grades.classify(0.8499), Grade::Good);
        assert_eq!(grades.classify(0.70), Grade::Good);
        assert_eq!(grades.classify(0.0), Grade::Poor);
        assert_eq!(grades.classify(1.0), Grade::Excellent);
    }

    #[test]
    fn non_descending_bands_fail_validation() {
        let grades = GradeThresholds {
            bands: vec![(Grade::Excellent, 0.7), (Grade::Good, 0.7), (Grade::Poor, 0.0)],
        };
        assert!(matches!(grades.validate(), Err(ConfigError::GradeOrder { .. })));
    }

    #[test]
    fn bands_must_cover_down_to_zero() {
        let grades = GradeThresholds {
            bands: vec![(Grade::Excellent, 0.85), (Grade::Good, 0.4)],
        };
        assert!(matches!(
            grades.validate(),
            Err(ConfigError::GradeCoverage { .. })
        ));
    }

    #[test]
    fn standard_bands_validate() {
        assert!(GradeThresholds::standard().validate().is_ok());
    }
}
