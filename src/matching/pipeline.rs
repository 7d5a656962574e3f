use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::experience::{evaluate_experience, ExperienceOutcome};
use super::penalties::{apply_penalties, PenaltyKind};
use super::scoring::{aggregate, to_percentage, CategoryScores, Grade};
use super::sectional::{SectionOutcome, SectionalMatcher};
use crate::config::{ConfigError, EngineConfig};
use crate::error::MatchError;
use crate::similarity::cosine_similarity;
use crate::{CandidateProfile, PositionProfile};

/// Version of the matching algorithm itself, independent of the rule set
/// version carried by the configuration.
pub const ALGORITHM_VERSION: &str = "2.0.0";

/// Categories without model support score a fixed neutral value so they
/// neither reward nor punish any candidate.
const NEUTRAL_CATEGORY_SCORE: f64 = 0.5;

/// Tunables for the fast screening stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningConfig {
    pub max_candidates: usize,
    /// Overall-similarity cutoff for the shortlist.
    pub min_similarity: f64,
    /// Candidates within this margin below the cutoff are kept and flagged
    /// as near misses instead of being dropped silently.
    pub near_miss_margin: f64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            max_candidates: 500,
            min_similarity: 0.3,
            near_miss_margin: 0.05,
        }
    }
}

/// One shortlist entry from the screening stage. `index` points back into the
/// caller's candidate slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningHit {
    pub index: usize,
    pub candidate_id: Option<i64>,
    pub similarity: f64,
    pub near_miss: bool,
}

/// Requirement-level and experience evidence backing a result's scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub sections: SectionOutcome,
    pub experience: ExperienceOutcome,
}

/// Full explainable result of a detailed evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub position_id: Option<i64>,
    pub candidate_id: Option<i64>,
    /// 0-100, one decimal.
    pub overall_score: f64,
    pub grade: Grade,
    pub category_scores: CategoryScores,
    pub evidence: MatchEvidence,
    pub penalties: BTreeMap<PenaltyKind, f64>,
    pub algorithm_version: String,
    pub config_version: String,
    pub calculated_at: DateTime<Utc>,
    pub calculation_time_ms: u64,
}

/// Two-stage matcher: a cheap whole-profile screen over many candidates, then
/// a detailed per-requirement evaluation of the shortlist. Both stages derive
/// the overall similarity from the same vectors with the same formula, so a
/// candidate's screening rank never contradicts its detailed overall category.
pub struct MatchEngine {
    config: EngineConfig,
}

impl MatchEngine {
    /// Re-validates the configuration: deserialized or hand-mutated configs
    /// reach the engine through here without passing `EngineConfig::new`.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn standard() -> Self {
        // The built-in rule set is known valid.
        Self {
            config: EngineConfig::standard(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fast screen: overall-embedding similarity only, sorted descending,
    /// truncated to the shortlist size.
    pub fn screen(
        &self,
        position: &PositionProfile,
        candidates: &[CandidateProfile],
        screening: &ScreeningConfig,
    ) -> Result<Vec<ScreeningHit>, MatchError> {
        let floor = screening.min_similarity - screening.near_miss_margin;

        let mut hits = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            let similarity = overall_similarity(position, candidate)?;
            if similarity < floor {
                continue;
            }
            hits.push(ScreeningHit {
                index,
                candidate_id: candidate.id,
                similarity,
                near_miss: similarity < screening.min_similarity,
            });
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(screening.max_candidates);

        info!(
            position_id = ?position.id,
            screened = candidates.len(),
            shortlisted = hits.len(),
            "screening complete"
        );
        Ok(hits)
    }

    /// Detailed evaluation of a single pair.
    pub fn evaluate(
        &self,
        position: &PositionProfile,
        candidate: &CandidateProfile,
    ) -> Result<MatchResult, MatchError> {
        let started = Instant::now();

        let overall = overall_similarity(position, candidate)?;
        let matcher = SectionalMatcher::new(&self.config.thresholds, self.config.critical_weight);
        let sections = matcher.match_requirements(&position.requirements, candidate)?;
        let experience = evaluate_experience(position, candidate, &self.config.experience);

        let category_scores = CategoryScores::new(
            &self.config.weights,
            sections.required.score,
            sections.preferred.score,
            experience.score,
            overall,
            NEUTRAL_CATEGORY_SCORE,
            NEUTRAL_CATEGORY_SCORE,
        );

        let penalties = apply_penalties(
            &sections,
            &experience,
            position,
            candidate,
            &self.config.penalties,
        );
        let score = aggregate(&category_scores, &penalties);
        let grade = self.config.grades.classify(score);

        debug!(
            position_id = ?position.id,
            candidate_id = ?candidate.id,
            score,
            grade = %grade,
            penalties = penalties.len(),
            "detailed evaluation"
        );

        Ok(MatchResult {
            position_id: position.id,
            candidate_id: candidate.id,
            overall_score: to_percentage(score),
            grade,
            category_scores,
            evidence: MatchEvidence {
                sections,
                experience,
            },
            penalties,
            algorithm_version: ALGORITHM_VERSION.to_string(),
            config_version: self.config.version.clone(),
            calculated_at: Utc::now(),
            calculation_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Screen then evaluate the shortlist, preserving screening order.
    pub fn match_position(
        &self,
        position: &PositionProfile,
        candidates: &[CandidateProfile],
        screening: &ScreeningConfig,
    ) -> Result<Vec<MatchResult>, MatchError> {
        let hits = self.screen(position, candidates, screening)?;
        hits.iter()
            .map(|hit| self.evaluate(position, &candidates[hit.index]))
            .collect()
    }
}

/// Whole-profile similarity used by both stages. Negative cosine is floored
/// at zero so it behaves as a score.
fn overall_similarity(
    position: &PositionProfile,
    candidate: &CandidateProfile,
) -> Result<f64, MatchError> {
    cosine_similarity(&position.overall_embedding, &candidate.overall_embedding)
        .map(|sim| sim.max(0.0))
        .map_err(|source| MatchError::dimension("overall", source))
}
