use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::skill_normalizer::{self, SkillToken};

/// A set of technologies treated as mutually exclusive for veto purposes.
/// High embedding similarity between members of different groups is assumed
/// to come from shared domain vocabulary, not actual skill overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictGroup {
    pub name: String,
    pub members: HashSet<String>,
    /// Threshold applied to members without an explicit per-token entry.
    pub default_threshold: Option<f64>,
}

/// Per-token acceptance thresholds plus conflict-group membership.
///
/// Resolution order: exact token entry, then the token's group default, then
/// the global default. Read-only at match time; hot reload swaps the whole
/// table by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub default_threshold: f64,
    pub entries: HashMap<String, f64>,
    pub groups: Vec<ConflictGroup>,
}

/// Outcome of threshold resolution for one canonical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub threshold: f64,
    pub group: Option<&'a str>,
}

impl ThresholdTable {
    /// Strict thresholds for confusable technology tokens, permissive default
    /// for everything else.
    pub fn standard() -> Self {
        let entries: HashMap<String, f64> = [
            // Backend frameworks in different ecosystems score high on shared
            // web vocabulary; require more than the default.
            ("spring", 0.78),
            ("django", 0.76),
            ("rails", 0.76),
            ("laravel", 0.76),
            ("nestjs", 0.74),
            // Frontend frameworks, same story.
            ("react", 0.74),
            ("vue", 0.74),
            ("angular", 0.74),
            ("svelte", 0.74),
            // Near-synonym but practically distinct databases.
            ("mysql", 0.72),
            ("postgresql", 0.72),
        ]
        .into_iter()
        .map(|(token, threshold)| (token.to_string(), threshold))
        .collect();

        let group = |name: &str, members: &[&str], default_threshold: Option<f64>| ConflictGroup {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            default_threshold,
        };

        Self {
            default_threshold: 0.62,
            entries,
            groups: vec![
                group("jvm-backend", &["java", "spring", "kotlin", "scala"], Some(0.7)),
                group(
                    "python-backend",
                    &["python", "django", "flask", "fastapi"],
                    Some(0.7),
                ),
                group("ruby-backend", &["ruby", "rails"], Some(0.7)),
                group("php-backend", &["php", "laravel"], Some(0.7)),
                group(
                    "js-frontend",
                    &["react", "vue", "angular", "svelte", "nextjs"],
                    Some(0.7),
                ),
                group("dotnet", &["csharp"], Some(0.7)),
                group(
                    "mobile",
                    &["android", "ios", "swift", "reactnative", "flutter"],
                    Some(0.7),
                ),
            ],
        }
    }

    /// Threshold and group membership for a canonical token.
    pub fn resolve(&self, canonical: &str) -> Resolved<'_> {
        let group = self
            .groups
            .iter()
            .find(|g| g.members.contains(canonical));

        let threshold = self
            .entries
            .get(canonical)
            .copied()
            .or_else(|| group.and_then(|g| g.default_threshold))
            .unwrap_or(self.default_threshold);

        Resolved {
            threshold,
            group: group.map(|g| g.name.as_str()),
        }
    }

    /// Group the dominant lexical token of a free-text item belongs to, if any.
    pub fn group_of_text(&self, text: &str) -> Option<&str> {
        let dominant = skill_normalizer::dominant_token(text)?;
        self.resolve(dominant).group
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("default", self.default_threshold)?;
        for (token, threshold) in &self.entries {
            check_threshold(token, *threshold)?;
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for group in &self.groups {
            if let Some(threshold) = group.default_threshold {
                check_threshold(&group.name, threshold)?;
            }
            for member in &group.members {
                if let Some(previous) = seen.insert(member, &group.name) {
                    return Err(ConfigError::DuplicateGroupMember {
                        token: member.clone(),
                        first: previous.to_string(),
                        second: group.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_threshold(label: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(ConfigError::ThresholdRange {
            token: label.to_string(),
            value,
        });
    }
    Ok(())
}

/// The conflict veto: a required token in group A matched purely by embedding
/// similarity against a candidate item whose dominant token sits in group B
/// is rejected unless the token or one of its aliases appears literally in
/// the candidate item text.
pub fn veto_applies(
    required: &SkillToken,
    required_group: Option<&str>,
    candidate_group: Option<&str>,
    candidate_text: &str,
) -> bool {
    match (required_group, candidate_group) {
        (Some(a), Some(b)) if a != b => !skill_normalizer::appears_in(required, candidate_text),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill_normalizer::expand;

    #[test]
    fn resolve_prefers_exact_entry_over_group_default() {
        let table = ThresholdTable::standard();
        let resolved = table.resolve("spring");
        assert_eq!(resolved.threshold, 0.78);
        assert_eq!(resolved.group, Some("jvm-backend"));
    }

    #[test]
    fn resolve_falls_back_to_group_then_global_default() {
        let table = ThresholdTable::standard();

        // kotlin has no explicit entry, inherits the group default
        let kotlin = table.resolve("kotlin");
        assert_eq!(kotlin.threshold, 0.7);
        assert_eq!(kotlin.group, Some("jvm-backend"));

        // unlisted token
        let other = table.resolve("graphql");
        assert_eq!(other.threshold, table.default_threshold);
        assert_eq!(other.group, None);
    }

    #[test]
    fn veto_fires_across_groups_without_lexical_overlap() {
        let spring = expand("spring");
        assert!(veto_applies(
            &spring,
            Some("jvm-backend"),
            Some("python-backend"),
            "5 years building Django REST services",
        ));
    }

    #[test]
    fn veto_skipped_when_alias_appears_in_text() {
        let spring = expand("spring");
        assert!(!veto_applies(
            &spring,
            Some("jvm-backend"),
            Some("python-backend"),
            "Django plus some Spring Boot maintenance",
        ));
    }

    #[test]
    fn veto_skipped_without_group_membership() {
        let graphql = expand("graphql");
        assert!(!veto_applies(&graphql, None, Some("jvm-backend"), "Java services"));
        assert!(!veto_applies(&graphql, Some("x"), None, "whatever"));
    }

    #[test]
    fn group_of_text_uses_dominant_token() {
        let table = ThresholdTable::standard();
        assert_eq!(
            table.group_of_text("built Flask microservices"),
            Some("python-backend")
        );
        assert_eq!(table.group_of_text("strong communicator"), None);
    }

    #[test]
    fn duplicate_group_membership_is_rejected() {
        let mut table = ThresholdTable::standard();
        table.groups.push(ConflictGroup {
            name: "extra".into(),
            members: ["java".to_string()].into_iter().collect(),
            default_threshold: None,
        });
        assert!(matches!(
            table.validate(),
            Err(ConfigError::DuplicateGroupMember { .. })
        ));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut table = ThresholdTable::standard();
        table.entries.insert("java".into(), 1.2);
        assert!(matches!(
            table.validate(),
            Err(ConfigError::ThresholdRange { .. })
        ));
    }
}
