use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ExperienceConfig;
use crate::{CandidateProfile, PositionProfile};

/// Mismatch flags raised during experience evaluation; the penalty engine
/// turns these into deductions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceFlags {
    pub level_mismatch: bool,
    pub significantly_lacking: bool,
}

/// Experience fit for one candidate/position pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceOutcome {
    pub score: f64,
    pub flags: ExperienceFlags,
    pub candidate_years: f64,
    pub required_min_years: Option<f64>,
    pub details: String,
}

/// Score starts at 1.0 and only goes down. Shortfall against the required
/// minimum reduces it proportionally; a tier gap of more than one level costs
/// a fixed fraction. Overqualification is neutral.
pub fn evaluate_experience(
    position: &PositionProfile,
    candidate: &CandidateProfile,
    config: &ExperienceConfig,
) -> ExperienceOutcome {
    let mut score: f64 = 1.0;
    let mut flags = ExperienceFlags::default();
    let candidate_years = candidate.experience_years.unwrap_or(0.0);

    let mut details = match position.min_experience_years {
        Some(min) if min > 0.0 => {
            if candidate_years < min {
                score = (candidate_years / min).max(0.0);
                if candidate_years < min * config.lacking_ratio {
                    flags.significantly_lacking = true;
                }
                format!("{candidate_years:.1}y vs required {min:.1}y minimum")
            } else {
                // Years above the maximum never penalize.
                format!("{candidate_years:.1}y meets required {min:.1}y minimum")
            }
        }
        _ => format!("{candidate_years:.1}y, no minimum required"),
    };

    if let (Some(required_tier), Some(candidate_tier)) =
        (position.experience_tier, candidate.experience_tier)
    {
        if required_tier.distance(candidate_tier) > 1 {
            flags.level_mismatch = true;
            score = (score - config.level_mismatch_reduction).max(0.0);
            details.push_str(&format!(
                "; tier {candidate_tier} vs required {required_tier}"
            ));
        }
    }

    debug!(
        score,
        level_mismatch = flags.level_mismatch,
        significantly_lacking = flags.significantly_lacking,
        "experience match"
    );

    ExperienceOutcome {
        score,
        flags,
        candidate_years,
        required_min_years: position.min_experience_years,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExperienceTier;

    fn position(min: Option<f64>, max: Option<f64>, tier: Option<ExperienceTier>) -> PositionProfile {
        PositionProfile {
            min_experience_years: min,
            max_experience_years: max,
            experience_tier: tier,
            ..PositionProfile::default()
        }
    }

    fn candidate(years: Option<f64>, tier: Option<ExperienceTier>) -> CandidateProfile {
        CandidateProfile {
            experience_years: years,
            experience_tier: tier,
            ..CandidateProfile::default()
        }
    }

    #[test]
    fn meeting_the_minimum_scores_full() {
        let outcome = evaluate_experience(
            &position(Some(3.0), None, None),
            &candidate(Some(5.0), None),
            &ExperienceConfig::default(),
        );
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.flags, ExperienceFlags::default());
    }

    #[test]
    fn shortfall_reduces_proportionally() {
        let outcome = evaluate_experience(
            &position(Some(4.0), None, None),
            &candidate(Some(3.0), None),
            &ExperienceConfig::default(),
        );
        assert!((outcome.score - 0.75).abs() < 1e-9);
        // 3/4 = 0.75 >= lacking_ratio 0.7, so no flag
        assert!(!outcome.flags.significantly_lacking);
    }

    #[test]
    fn deep_shortfall_raises_lacking_flag() {
        let outcome = evaluate_experience(
            &position(Some(10.0), None, None),
            &candidate(Some(2.0), None),
            &ExperienceConfig::default(),
        );
        assert!((outcome.score - 0.2).abs() < 1e-9);
        assert!(outcome.flags.significantly_lacking);
    }

    #[test]
    fn overqualification_is_neutral() {
        let outcome = evaluate_experience(
            &position(Some(3.0), Some(6.0), None),
            &candidate(Some(15.0), None),
            &ExperienceConfig::default(),
        );
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn adjacent_tiers_do_not_mismatch() {
        let outcome = evaluate_experience(
            &position(None, None, Some(ExperienceTier::Senior)),
            &candidate(Some(5.0), Some(ExperienceTier::Mid)),
            &ExperienceConfig::default(),
        );
        assert!(!outcome.flags.level_mismatch);
        assert_eq!(outcome.score, 1.0);
    }

    #[test]
    fn two_tier_gap_mismatches_and_reduces() {
        let config = ExperienceConfig::default();
        let outcome = evaluate_experience(
            &position(None, None, Some(ExperienceTier::Senior)),
            &candidate(Some(1.0), Some(ExperienceTier::Junior)),
            &config,
        );
        assert!(outcome.flags.level_mismatch);
        assert!((outcome.score - (1.0 - config.level_mismatch_reduction)).abs() < 1e-9);
    }

    #[test]
    fn missing_candidate_years_count_as_zero() {
        let outcome = evaluate_experience(
            &position(Some(5.0), None, None),
            &candidate(None, None),
            &ExperienceConfig::default(),
        );
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.flags.significantly_lacking);
    }

    #[test]
    fn no_requirement_is_a_perfect_fit() {
        let outcome = evaluate_experience(
            &position(None, None, None),
            &candidate(Some(1.0), None),
            &ExperienceConfig::default(),
        );
        assert_eq!(outcome.score, 1.0);
    }
}
