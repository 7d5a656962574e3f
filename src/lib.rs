pub mod config;
pub mod error;
pub mod logging;
pub mod matching;
pub mod similarity;
pub mod skill_normalizer;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Candidate experience tier, ordered junior < mid < senior.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExperienceTier {
    Junior,
    Mid,
    Senior,
}

impl ExperienceTier {
    /// Distance in tiers (0 = same, 2 = junior vs senior).
    pub fn distance(self, other: ExperienceTier) -> u8 {
        (self as i8 - other as i8).unsigned_abs()
    }
}

/// One pre-embedded sentence of a candidate narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedSentence {
    pub idx: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// One candidate-side section: a section-level vector plus the sentence-level
/// vectors the embedding provider produced for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub embedding: Vec<f32>,
    pub sentences: Vec<EmbeddedSentence>,
}

/// An extracted candidate skill: the surface token, the narrative snippet it
/// was extracted from, and that snippet's context vector.
///
/// Skill matching compares context vectors, not bare tokens; the snippet text
/// is what lexical confirmation inspects during the conflict veto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub token: String,
    pub context: String,
    pub embedding: Vec<f32>,
}

/// Candidate-side input to the engine. Vectors are produced upstream by the
/// embedding provider and never mutated here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Option<i64>,
    pub overall_embedding: Vec<f32>,
    pub skills_section: Option<SectionContent>,
    pub experience_section: Option<SectionContent>,
    pub projects_section: Option<SectionContent>,
    pub skills: Vec<CandidateSkill>,
    pub experience_years: Option<f64>,
    pub experience_tier: Option<ExperienceTier>,
    pub domain_tags: Vec<String>,
    pub role: Option<String>,
}

impl CandidateProfile {
    /// All narrative sentences across present sections, in section order.
    /// Best-effort alignment for sentence requirements scans this pool.
    pub fn narrative_sentences(&self) -> impl Iterator<Item = &EmbeddedSentence> {
        [
            self.skills_section.as_ref(),
            self.experience_section.as_ref(),
            self.projects_section.as_ref(),
        ]
        .into_iter()
        .flatten()
        .flat_map(|section| section.sentences.iter())
    }
}

/// Whether a requirement item is a hard requirement or a nice-to-have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementLevel {
    Required,
    Preferred,
}

/// The body of a requirement item: an extracted skill token or a free-text
/// qualification sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "text")]
pub enum RequirementBody {
    Skill(String),
    Sentence(String),
}

impl RequirementBody {
    pub fn text(&self) -> &str {
        match self {
            RequirementBody::Skill(s) | RequirementBody::Sentence(s) => s,
        }
    }
}

/// One required or preferred item of a position, with its context vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementItem {
    pub body: RequirementBody,
    pub level: RequirementLevel,
    /// Critical items carry a higher weight in the section score and trigger
    /// the critical-missing penalty when unmatched. Only meaningful on
    /// required items.
    pub critical: bool,
    pub embedding: Vec<f32>,
}

impl RequirementItem {
    pub fn required_skill(token: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            body: RequirementBody::Skill(token.into()),
            level: RequirementLevel::Required,
            critical: false,
            embedding,
        }
    }

    pub fn preferred_skill(token: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            body: RequirementBody::Skill(token.into()),
            level: RequirementLevel::Preferred,
            critical: false,
            embedding,
        }
    }

    pub fn required_sentence(text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            body: RequirementBody::Sentence(text.into()),
            level: RequirementLevel::Required,
            critical: false,
            embedding,
        }
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// Position-side input to the engine; mirrors `CandidateProfile` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionProfile {
    pub id: Option<i64>,
    pub overall_embedding: Vec<f32>,
    pub description_embedding: Vec<f32>,
    pub requirements: Vec<RequirementItem>,
    pub min_experience_years: Option<f64>,
    pub max_experience_years: Option<f64>,
    pub experience_tier: Option<ExperienceTier>,
    pub domain_tags: Vec<String>,
    pub role: Option<String>,
}

impl PositionProfile {
    pub fn required_items(&self) -> impl Iterator<Item = &RequirementItem> {
        self.requirements
            .iter()
            .filter(|item| item.level == RequirementLevel::Required)
    }

    pub fn preferred_items(&self) -> impl Iterator<Item = &RequirementItem> {
        self.requirements
            .iter()
            .filter(|item| item.level == RequirementLevel::Preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_distance_is_symmetric() {
        assert_eq!(ExperienceTier::Junior.distance(ExperienceTier::Senior), 2);
        assert_eq!(ExperienceTier::Senior.distance(ExperienceTier::Junior), 2);
        assert_eq!(ExperienceTier::Mid.distance(ExperienceTier::Mid), 0);
    }

    #[test]
    fn tier_parses_from_lowercase() {
        assert_eq!("senior".parse::<ExperienceTier>().unwrap(), ExperienceTier::Senior);
        assert_eq!(ExperienceTier::Mid.to_string(), "mid");
    }

    #[test]
    fn narrative_sentences_skip_absent_sections() {
        let candidate = CandidateProfile {
            skills_section: Some(SectionContent {
                embedding: vec![],
                sentences: vec![EmbeddedSentence {
                    idx: 0,
                    text: "built services".into(),
                    embedding: vec![1.0],
                }],
            }),
            ..CandidateProfile::default()
        };

        assert_eq!(candidate.narrative_sentences().count(), 1);
    }

    #[test]
    fn requirement_builders_set_level_and_critical() {
        let item = RequirementItem::required_skill("python", vec![]).critical();
        assert_eq!(item.level, RequirementLevel::Required);
        assert!(item.critical);
        assert_eq!(item.body.text(), "python");

        let pref = RequirementItem::preferred_skill("aws", vec![]);
        assert_eq!(pref.level, RequirementLevel::Preferred);
        assert!(!pref.critical);
    }
}
