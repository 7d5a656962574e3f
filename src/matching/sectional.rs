use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::thresholds::{veto_applies, ThresholdTable};
use crate::error::MatchError;
use crate::similarity::cosine_similarity;
use crate::skill_normalizer::{self, expand};
use crate::{CandidateProfile, CandidateSkill, RequirementBody, RequirementItem, RequirementLevel};

/// Match status of a single requirement item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub label: String,
    pub matched: bool,
    /// Best similarity observed against the candidate, regardless of outcome.
    pub similarity: f64,
    /// Candidate skill token or sentence the item matched against.
    pub matched_against: Option<String>,
    pub critical: bool,
    /// True when similarity cleared the threshold but the conflict veto
    /// rejected the match.
    pub vetoed: bool,
}

impl ItemOutcome {
    fn weight(&self, critical_weight: f64) -> f64 {
        if self.critical {
            critical_weight
        } else {
            1.0
        }
    }
}

/// Aggregate result for one requirement pool (required or preferred).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub score: f64,
    pub items: Vec<ItemOutcome>,
    /// The candidate had no content at all for a non-empty requirement.
    pub missing_section: bool,
    critical_weight: f64,
}

impl SectionScore {
    fn empty() -> Self {
        // Nothing to fail: positions omitting a section are not penalized.
        Self {
            score: 1.0,
            items: vec![],
            missing_section: false,
            critical_weight: 1.0,
        }
    }

    /// Unmatched share of the pool, weighted. 0.0 = all matched.
    pub fn missing_weight_ratio(&self) -> f64 {
        let total: f64 = self.items.iter().map(|i| i.weight(self.critical_weight)).sum();
        if total == 0.0 {
            return 0.0;
        }
        let missing: f64 = self
            .items
            .iter()
            .filter(|i| !i.matched)
            .map(|i| i.weight(self.critical_weight))
            .sum();
        missing / total
    }

    pub fn any_critical_missing(&self) -> bool {
        self.items.iter().any(|i| i.critical && !i.matched)
    }

    pub fn matched_labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| i.matched)
            .map(|i| i.label.as_str())
            .collect()
    }

    pub fn missing_labels(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !i.matched)
            .map(|i| i.label.as_str())
            .collect()
    }
}

/// Required and preferred pools scored independently; preferred items never
/// contribute to the required score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub required: SectionScore,
    pub preferred: SectionScore,
}

/// Matches a position's requirement items against one candidate.
pub struct SectionalMatcher<'a> {
    thresholds: &'a ThresholdTable,
    critical_weight: f64,
}

impl<'a> SectionalMatcher<'a> {
    pub fn new(thresholds: &'a ThresholdTable, critical_weight: f64) -> Self {
        Self {
            thresholds,
            critical_weight,
        }
    }

    pub fn match_requirements(
        &self,
        requirements: &[RequirementItem],
        candidate: &CandidateProfile,
    ) -> Result<SectionOutcome, MatchError> {
        let required = self.score_pool(requirements, RequirementLevel::Required, candidate)?;
        let preferred = self.score_pool(requirements, RequirementLevel::Preferred, candidate)?;

        debug!(
            required = required.score,
            preferred = preferred.score,
            required_missing = required.missing_labels().len(),
            "sectional match"
        );

        Ok(SectionOutcome { required, preferred })
    }

    fn score_pool(
        &self,
        requirements: &[RequirementItem],
        level: RequirementLevel,
        candidate: &CandidateProfile,
    ) -> Result<SectionScore, MatchError> {
        let category = match level {
            RequirementLevel::Required => "required",
            RequirementLevel::Preferred => "preferred",
        };

        let pool: Vec<&RequirementItem> =
            requirements.iter().filter(|i| i.level == level).collect();
        if pool.is_empty() {
            return Ok(SectionScore::empty());
        }

        let candidate_is_empty =
            candidate.skills.is_empty() && candidate.narrative_sentences().next().is_none();

        let mut items = Vec::with_capacity(pool.len());
        for item in pool {
            let outcome = match &item.body {
                RequirementBody::Skill(token) => {
                    self.match_skill_item(token, item, candidate, category)?
                }
                RequirementBody::Sentence(text) => {
                    self.match_sentence_item(text, item, candidate, category)?
                }
            };
            items.push(outcome);
        }

        let total: f64 = items.iter().map(|i| i.weight(self.critical_weight)).sum();
        let matched: f64 = items
            .iter()
            .filter(|i| i.matched)
            .map(|i| i.weight(self.critical_weight))
            .sum();
        let score = if total > 0.0 { matched / total } else { 1.0 };

        Ok(SectionScore {
            score,
            items,
            missing_section: candidate_is_empty,
            critical_weight: self.critical_weight,
        })
    }

    fn match_skill_item(
        &self,
        token_text: &str,
        item: &RequirementItem,
        candidate: &CandidateProfile,
        category: &'static str,
    ) -> Result<ItemOutcome, MatchError> {
        let token = expand(token_text);
        let resolved = self.thresholds.resolve(&token.canonical);

        let mut best: Option<(&CandidateSkill, f64)> = None;
        let mut lexical: Option<(&CandidateSkill, f64)> = None;

        for skill in &candidate.skills {
            let sim = cosine_similarity(&item.embedding, &skill.embedding)
                .map_err(|source| MatchError::dimension(category, source))?;

            let is_lexical = skill_normalizer::normalize_skill(&skill.token) == token.canonical
                || skill_normalizer::appears_in(&token, &skill.context);
            if is_lexical && lexical.as_ref().is_none_or(|(_, s)| sim > *s) {
                lexical = Some((skill, sim));
            }
            if best.as_ref().is_none_or(|(_, s)| sim > *s) {
                best = Some((skill, sim));
            }
        }

        // Exact or alias overlap is always accepted; the veto only guards
        // embedding-only matches.
        if let Some((skill, sim)) = lexical {
            return Ok(ItemOutcome {
                label: token_text.to_string(),
                matched: true,
                similarity: sim,
                matched_against: Some(skill.token.clone()),
                critical: item.critical,
                vetoed: false,
            });
        }

        let Some((skill, sim)) = best else {
            return Ok(ItemOutcome {
                label: token_text.to_string(),
                matched: false,
                similarity: 0.0,
                matched_against: None,
                critical: item.critical,
                vetoed: false,
            });
        };

        if sim < resolved.threshold {
            return Ok(ItemOutcome {
                label: token_text.to_string(),
                matched: false,
                similarity: sim,
                matched_against: None,
                critical: item.critical,
                vetoed: false,
            });
        }

        let candidate_canonical = skill_normalizer::match_known(&skill.token)
            .or_else(|| skill_normalizer::dominant_token(&skill.context));
        let candidate_group =
            candidate_canonical.and_then(|c| self.thresholds.resolve(c).group);

        let candidate_text = format!("{} {}", skill.token, skill.context);
        let vetoed = veto_applies(&token, resolved.group, candidate_group, &candidate_text);
        if vetoed {
            debug!(
                token = %token.canonical,
                candidate = %skill.token,
                similarity = sim,
                "conflict veto rejected embedding match"
            );
        }

        Ok(ItemOutcome {
            label: token_text.to_string(),
            matched: !vetoed,
            similarity: sim,
            matched_against: (!vetoed).then(|| skill.token.clone()),
            critical: item.critical,
            vetoed,
        })
    }

    fn match_sentence_item(
        &self,
        text: &str,
        item: &RequirementItem,
        candidate: &CandidateProfile,
        category: &'static str,
    ) -> Result<ItemOutcome, MatchError> {
        // Threshold keyed by the sentence's dominant technology token, global
        // default when none is detected.
        let threshold = skill_normalizer::dominant_token(text)
            .map(|token| self.thresholds.resolve(token).threshold)
            .unwrap_or(self.thresholds.default_threshold);

        let mut best: Option<(&str, f64)> = None;
        for sentence in candidate.narrative_sentences() {
            let sim = cosine_similarity(&item.embedding, &sentence.embedding)
                .map_err(|source| MatchError::dimension(category, source))?;
            if best.as_ref().is_none_or(|(_, s)| sim > *s) {
                best = Some((&sentence.text, sim));
            }
        }

        let (matched, similarity, matched_against) = match best {
            Some((sentence, sim)) if sim >= threshold => (true, sim, Some(sentence.to_string())),
            Some((_, sim)) => (false, sim, None),
            None => (false, 0.0, None),
        };

        Ok(ItemOutcome {
            label: text.to_string(),
            matched,
            similarity,
            matched_against,
            critical: item.critical,
            vetoed: false,
        })
    }
}

static SENTENCE_CHUNKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?\n]+").expect("static sentence regex"));

/// Fallback sentence splitter for callers without an upstream splitter.
/// Keeps chunks of 20..=300 characters containing at least one space and no
/// underscores; everything else is heading noise or table debris.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_CHUNKS
        .find_iter(text)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| (20..=300).contains(&s.len()) && s.contains(' ') && !s.contains('_'))
        .collect()
}
