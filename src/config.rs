use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::penalties::PenaltyRules;
use crate::matching::scoring::GradeThresholds;
use crate::matching::thresholds::ThresholdTable;

/// Invalid engine configuration. Raised once at load, never during a match.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("category weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },
    #[error("category weight {name} is out of [0, 1]: {value}")]
    WeightRange { name: &'static str, value: f64 },
    #[error("similarity threshold for {token} is out of [0, 1]: {value}")]
    ThresholdRange { token: String, value: f64 },
    #[error("token {token} belongs to conflict groups {first} and {second}")]
    DuplicateGroupMember {
        token: String,
        first: String,
        second: String,
    },
    #[error("penalty magnitude {name} is out of [0, 1]: {value}")]
    PenaltyRange { name: &'static str, value: f64 },
    #[error("grade bands must be strictly descending, got {upper} then {lower}")]
    GradeOrder { upper: f64, lower: f64 },
    #[error("grade band minimum is out of [0, 1]: {minimum}")]
    GradeRange { minimum: f64 },
    #[error("grade bands must end at 0.0, last minimum is {last_minimum}")]
    GradeCoverage { last_minimum: f64 },
}

/// Relative weights of the score categories. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub required: f64,
    pub preferred: f64,
    pub experience: f64,
    pub overall: f64,
    pub education: f64,
    pub certification: f64,
}

impl WeightConfig {
    /// Default scheme. Explicit requirement coverage dominates; the overall
    /// narrative similarity acts as a tiebreaker.
    pub fn sectional() -> Self {
        Self {
            required: 0.40,
            preferred: 0.08,
            experience: 0.30,
            overall: 0.20,
            education: 0.015,
            certification: 0.005,
        }
    }

    /// Alternative scheme led by whole-profile similarity, for positions
    /// whose requirement lists are thin or unreliable.
    pub fn holistic() -> Self {
        Self {
            required: 0.20,
            preferred: 0.0,
            experience: 0.15,
            overall: 0.50,
            education: 0.10,
            certification: 0.05,
        }
    }

    pub fn sum(&self) -> f64 {
        self.required
            + self.preferred
            + self.experience
            + self.overall
            + self.education
            + self.certification
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("required", self.required),
            ("preferred", self.preferred),
            ("experience", self.experience),
            ("overall", self.overall),
            ("education", self.education),
            ("certification", self.certification),
        ];
        for (name, value) in entries {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::WeightRange { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Tunables for experience evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceConfig {
    /// Fraction of the required minimum below which the candidate counts as
    /// significantly lacking.
    pub lacking_ratio: f64,
    /// Score reduction applied when the tier gap exceeds one level.
    pub level_mismatch_reduction: f64,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            lacking_ratio: 0.7,
            level_mismatch_reduction: 0.25,
        }
    }
}

impl ExperienceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("lacking_ratio", self.lacking_ratio),
            ("level_mismatch_reduction", self.level_mismatch_reduction),
        ];
        for (name, value) in entries {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::PenaltyRange { name, value });
            }
        }
        Ok(())
    }
}

/// Full engine configuration. The version string is echoed in every result so
/// scores stay attributable to the rule set that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version: String,
    pub weights: WeightConfig,
    pub thresholds: ThresholdTable,
    pub penalties: PenaltyRules,
    pub grades: GradeThresholds,
    pub experience: ExperienceConfig,
    /// Weight multiplier for critical requirement items.
    pub critical_weight: f64,
}

impl EngineConfig {
    /// Validates every sub-table before handing the configuration out.
    pub fn new(
        version: impl Into<String>,
        weights: WeightConfig,
        thresholds: ThresholdTable,
        penalties: PenaltyRules,
        grades: GradeThresholds,
        experience: ExperienceConfig,
        critical_weight: f64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            version: version.into(),
            weights,
            thresholds,
            penalties,
            grades,
            experience,
            critical_weight,
        };
        config.validate()?;
        Ok(config)
    }

    /// Full load-time check across every sub-table. Configurations arriving
    /// through deserialization or field mutation bypass `new`, so the engine
    /// re-runs this before accepting a config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.penalties.validate()?;
        self.grades.validate()?;
        self.experience.validate()?;
        if !(1.0..=10.0).contains(&self.critical_weight) || self.critical_weight.is_nan() {
            return Err(ConfigError::PenaltyRange {
                name: "critical_weight",
                value: self.critical_weight,
            });
        }
        Ok(())
    }

    /// Built-in rule set. Known valid, so construction cannot fail.
    pub fn standard() -> Self {
        Self {
            version: "standard-v2".into(),
            weights: WeightConfig::sectional(),
            thresholds: ThresholdTable::standard(),
            penalties: PenaltyRules::standard(),
            grades: GradeThresholds::standard(),
            experience: ExperienceConfig::default(),
            critical_weight: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_sum_to_one() {
        assert!(WeightConfig::sectional().validate().is_ok());
        assert!(WeightConfig::holistic().validate().is_ok());
    }

    #[test]
    fn off_by_more_than_epsilon_fails() {
        let mut weights = WeightConfig::sectional();
        weights.required += 0.01;
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn negative_weight_fails_before_sum_check() {
        let mut weights = WeightConfig::sectional();
        weights.preferred = -0.08;
        weights.required += 0.16;
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightRange { name: "preferred", .. })
        ));
    }

    #[test]
    fn standard_config_is_valid() {
        let standard = EngineConfig::standard();
        let rebuilt = EngineConfig::new(
            standard.version.clone(),
            standard.weights,
            standard.thresholds.clone(),
            standard.penalties,
            standard.grades.clone(),
            standard.experience,
            standard.critical_weight,
        );
        assert!(rebuilt.is_ok());
    }

    #[test]
    fn invalid_subtable_is_rejected_at_construction() {
        let mut penalties = PenaltyRules::standard();
        penalties.role_mismatch = -0.1;
        let result = EngineConfig::new(
            "broken",
            WeightConfig::sectional(),
            ThresholdTable::standard(),
            penalties,
            GradeThresholds::standard(),
            ExperienceConfig::default(),
            2.0,
        );
        assert!(matches!(result, Err(ConfigError::PenaltyRange { .. })));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::standard();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(back.validate().is_ok());
    }

    #[test]
    fn deserialization_does_not_launder_invalid_configs() {
        let mut broken = EngineConfig::standard();
        broken.weights.required += 0.2;
        let json = serde_json::to_string(&broken).unwrap();

        // serde accepts the shape; validate still catches the content.
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.validate(), Err(ConfigError::WeightSum { .. })));
    }
}
