use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use super::experience::ExperienceOutcome;
use super::sectional::SectionOutcome;
use crate::config::ConfigError;
use crate::skill_normalizer::normalize_skill_set;
use crate::{CandidateProfile, PositionProfile};

/// Score deductions the engine can apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PenaltyKind {
    ExperienceLevelMismatch,
    ExperienceSignificantlyLacking,
    DomainMismatch,
    RoleMismatch,
    RequiredSkillMissing,
    RequiredSkillCriticalMissing,
}

/// Deduction magnitudes per penalty kind, plus the cap on combined
/// experience-origin deductions.
///
/// Experience penalties are capped so that strong skill alignment can offset
/// a borderline experience shortfall; skill, domain, and role penalties are
/// never capped collectively — a missing explicitly-required capability stays
/// a hard signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRules {
    pub experience_level_mismatch: f64,
    pub experience_significantly_lacking: f64,
    pub domain_mismatch: f64,
    pub role_mismatch: f64,
    pub required_skill_missing: f64,
    pub required_skill_critical_missing: f64,
    pub experience_penalty_cap: f64,
    /// Unmatched weighted share of required items above which the bulk
    /// missing penalty fires.
    pub required_missing_ratio: f64,
}

impl PenaltyRules {
    pub fn standard() -> Self {
        Self {
            experience_level_mismatch: 0.25,
            experience_significantly_lacking: 0.20,
            domain_mismatch: 0.20,
            role_mismatch: 0.15,
            required_skill_missing: 0.15,
            required_skill_critical_missing: 0.25,
            experience_penalty_cap: 0.15,
            required_missing_ratio: 0.5,
        }
    }

    pub fn magnitude(&self, kind: PenaltyKind) -> f64 {
        match kind {
            PenaltyKind::ExperienceLevelMismatch => self.experience_level_mismatch,
            PenaltyKind::ExperienceSignificantlyLacking => self.experience_significantly_lacking,
            PenaltyKind::DomainMismatch => self.domain_mismatch,
            PenaltyKind::RoleMismatch => self.role_mismatch,
            PenaltyKind::RequiredSkillMissing => self.required_skill_missing,
            PenaltyKind::RequiredSkillCriticalMissing => self.required_skill_critical_missing,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let magnitudes = [
            ("experience_level_mismatch", self.experience_level_mismatch),
            (
                "experience_significantly_lacking",
                self.experience_significantly_lacking,
            ),
            ("domain_mismatch", self.domain_mismatch),
            ("role_mismatch", self.role_mismatch),
            ("required_skill_missing", self.required_skill_missing),
            (
                "required_skill_critical_missing",
                self.required_skill_critical_missing,
            ),
            ("experience_penalty_cap", self.experience_penalty_cap),
            ("required_missing_ratio", self.required_missing_ratio),
        ];
        for (name, value) in magnitudes {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::PenaltyRange { name, value });
            }
        }
        Ok(())
    }
}

const EXPERIENCE_KINDS: [PenaltyKind; 2] = [
    PenaltyKind::ExperienceLevelMismatch,
    PenaltyKind::ExperienceSignificantlyLacking,
];

/// Applied penalties, already capped. Each kind fires independently from its
/// triggering condition; the two experience kinds are then scaled down
/// proportionally so their sum never exceeds `experience_penalty_cap`.
pub fn apply_penalties(
    sections: &SectionOutcome,
    experience: &ExperienceOutcome,
    position: &PositionProfile,
    candidate: &CandidateProfile,
    rules: &PenaltyRules,
) -> BTreeMap<PenaltyKind, f64> {
    let mut penalties = BTreeMap::new();
    let mut fire = |kind: PenaltyKind| {
        let magnitude = rules.magnitude(kind);
        debug!(kind = %kind, magnitude, "penalty applied");
        penalties.insert(kind, magnitude);
    };

    if experience.flags.level_mismatch {
        fire(PenaltyKind::ExperienceLevelMismatch);
    }
    if experience.flags.significantly_lacking {
        fire(PenaltyKind::ExperienceSignificantlyLacking);
    }
    if domain_mismatch(position, candidate) {
        fire(PenaltyKind::DomainMismatch);
    }
    if role_mismatch(position, candidate) {
        fire(PenaltyKind::RoleMismatch);
    }
    if sections.required.missing_weight_ratio() > rules.required_missing_ratio {
        fire(PenaltyKind::RequiredSkillMissing);
    }
    if sections.required.any_critical_missing() {
        fire(PenaltyKind::RequiredSkillCriticalMissing);
    }

    let experience_sum: f64 = EXPERIENCE_KINDS
        .iter()
        .filter_map(|kind| penalties.get(kind))
        .sum();
    if experience_sum > rules.experience_penalty_cap {
        let scale = rules.experience_penalty_cap / experience_sum;
        for kind in EXPERIENCE_KINDS {
            if let Some(value) = penalties.get_mut(&kind) {
                *value *= scale;
            }
        }
        debug!(scale, cap = rules.experience_penalty_cap, "experience penalties capped");
    }

    penalties
}

fn domain_mismatch(position: &PositionProfile, candidate: &CandidateProfile) -> bool {
    if position.domain_tags.is_empty() || candidate.domain_tags.is_empty() {
        return false;
    }
    let position_tags = normalize_skill_set(&position.domain_tags);
    let candidate_tags = normalize_skill_set(&candidate.domain_tags);
    position_tags.is_disjoint(&candidate_tags)
}

fn role_mismatch(position: &PositionProfile, candidate: &CandidateProfile) -> bool {
    match (&position.role, &candidate.role) {
        (Some(required), Some(actual)) => {
            crate::skill_normalizer::normalize_skill(required)
                != crate::skill_normalizer::normalize_skill(actual)
        }
        _ => false,
    }
}
