use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Canonical skill vocabulary with accepted aliases.
///
/// Lookups are case-insensitive and NFKC-normalized. Unknown tokens pass
/// through as their own canonical form (open world: unrecognized skills are
/// still matchable, just without synonym expansion).
static SKILL_ALIASES: &[(&str, &[&str])] = &[
    // Languages
    ("python", &["python3", "python 3", "py"]),
    ("java", &["java8", "java11", "java17", "java21", "openjdk"]),
    ("javascript", &["js", "ecmascript", "es6", "es2015"]),
    ("typescript", &["ts"]),
    ("kotlin", &["kotlin jvm"]),
    ("scala", &["scala3"]),
    ("csharp", &["c#", "c sharp", "dotnet", ".net", "dotnet core"]),
    ("golang", &["go", "go lang"]),
    ("rust", &["rust lang"]),
    ("ruby", &["ruby lang"]),
    ("php", &["php7", "php8"]),
    ("swift", &["ios swift"]),
    // Backend frameworks
    ("spring", &["spring boot", "springboot", "spring framework"]),
    ("django", &["django rest framework", "drf"]),
    ("flask", &["python flask"]),
    ("fastapi", &["fast api"]),
    ("rails", &["ruby on rails", "ror"]),
    ("laravel", &["php laravel"]),
    ("express", &["express.js", "expressjs"]),
    ("nestjs", &["nest.js", "nest js"]),
    ("nodejs", &["node.js", "node js", "node"]),
    // Frontend
    ("react", &["react.js", "reactjs", "react18"]),
    ("vue", &["vue.js", "vuejs", "vue3"]),
    ("angular", &["angularjs", "angular.js", "angular2"]),
    ("svelte", &["sveltejs", "svelte.js"]),
    ("nextjs", &["next.js", "next js"]),
    // Mobile
    ("android", &["android sdk"]),
    ("ios", &["ios development"]),
    ("reactnative", &["react native", "react-native"]),
    ("flutter", &["dart flutter"]),
    // Databases
    ("postgresql", &["postgres", "pg", "postgre sql"]),
    ("mysql", &["my sql", "mariadb"]),
    ("mongodb", &["mongo", "mongo db"]),
    ("redis", &["redis cache"]),
    ("elasticsearch", &["elastic search", "opensearch"]),
    // Cloud / infra
    ("aws", &["amazon web services", "ec2", "s3"]),
    ("gcp", &["google cloud platform", "google cloud"]),
    ("azure", &["microsoft azure", "ms azure"]),
    ("docker", &["docker container"]),
    ("kubernetes", &["k8s", "kube"]),
    ("terraform", &["infrastructure as code", "iac"]),
    ("jenkins", &["jenkins ci"]),
    ("github actions", &["gh actions"]),
    // Data / ML
    ("pytorch", &["torch", "py torch"]),
    ("tensorflow", &["tensor flow", "tf"]),
    ("llm", &["large language model", "language model"]),
    ("langchain", &["lang chain"]),
    ("kafka", &["apache kafka"]),
    ("rabbitmq", &["rabbit mq"]),
    ("spark", &["apache spark", "pyspark"]),
    // Protocols / misc
    ("graphql", &["graph ql"]),
    ("grpc", &["g rpc"]),
    ("rest api", &["restful api", "rest"]),
    ("git", &["git scm"]),
    ("linux", &["gnu/linux"]),
];

static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (canonical, aliases) in SKILL_ALIASES {
        map.insert(*canonical, *canonical);
        for alias in *aliases {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Keys with separators stripped, to absorb minor notation drift
/// ("node.js" / "node js" / "nodejs").
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        map.entry(compact_key(alias)).or_insert(*canonical);
    }
    map
});

static CANONICAL_TO_ALIASES: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| SKILL_ALIASES.iter().map(|(c, a)| (*c, *a)).collect());

/// A skill token resolved to canonical form plus its accepted aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillToken {
    pub canonical: String,
    pub aliases: &'static [&'static str],
}

fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

fn split_segments(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| matches!(c, ' ' | '/' | ',' | ';' | '|' | '+' | '(' | ')'))
        .map(nfkc_lower_trim)
        .filter(|s| !s.is_empty())
}

fn fuzzy_match_canonical(compact: &str) -> Option<&'static str> {
    // Short tokens are only matched exactly; fuzzy lookups on brief inputs
    // produce false positives (java vs javaa, go vs gcp).
    if compact.len() < 5 {
        return None;
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        if alias.len() < 5 || canonical.len() < 5 {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        if distance == 0 {
            return Some(canonical);
        }

        let len = compact.len().max(alias.len());
        let acceptable = distance == 1 || (len >= 8 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            None => best = Some((canonical, distance)),
            Some((_, best_dist)) if distance < best_dist => best = Some((canonical, distance)),
            _ => {}
        }
    }

    best.map(|(canonical, _)| canonical)
}

fn match_token(token: &str) -> Option<&'static str> {
    if token.is_empty() {
        return None;
    }
    if let Some(canonical) = ALIAS_TO_CANONICAL.get(token) {
        return Some(canonical);
    }
    let compact = compact_key(token);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return Some(canonical);
    }
    fuzzy_match_canonical(&compact)
}

/// Resolve a raw skill string against the vocabulary only.
/// Returns `None` for tokens outside the table.
pub fn match_known(skill: &str) -> Option<&'static str> {
    let normalized = nfkc_lower_trim(skill);
    if let Some(canonical) = match_token(&normalized) {
        return Some(canonical);
    }
    for segment in split_segments(skill) {
        if let Some(canonical) = match_token(&segment) {
            return Some(canonical);
        }
    }
    None
}

/// Canonical form of a skill string; unknown tokens pass through
/// lowercased and trimmed.
pub fn normalize_skill(skill: &str) -> String {
    match match_known(skill) {
        Some(canonical) => canonical.to_string(),
        None => nfkc_lower_trim(skill),
    }
}

/// Canonical token plus its accepted aliases. Unknown tokens get an empty
/// alias set.
pub fn expand(skill: &str) -> SkillToken {
    let canonical = normalize_skill(skill);
    let aliases = CANONICAL_TO_ALIASES
        .get(canonical.as_str())
        .copied()
        .unwrap_or(&[]);
    SkillToken { canonical, aliases }
}

/// Normalized, deduplicated skill set.
pub fn normalize_skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_skill(s))
        .collect()
}

/// The dominant technology token of a free-text item: the first segment that
/// resolves against the vocabulary (exact or compact, no fuzzing — a typo
/// should not decide a conflict group).
pub fn dominant_token(text: &str) -> Option<&'static str> {
    let normalized = nfkc_lower_trim(text);
    if let Some(canonical) = ALIAS_TO_CANONICAL.get(normalized.as_str()) {
        return Some(canonical);
    }
    for segment in split_segments(text) {
        if let Some(canonical) = ALIAS_TO_CANONICAL.get(segment.as_str()) {
            return Some(canonical);
        }
        if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact_key(&segment)) {
            return Some(canonical);
        }
    }
    None
}

/// Whether the canonical token or any of its aliases appears as a whole
/// token in the given text. Lexical confirmation for the conflict veto.
///
/// Comparison is segment-based, never substring: "javascript" must not
/// confirm "java", nor "algorithms" the alias "go". Runs of up to three
/// adjacent segments are joined under the compact key so multi-word aliases
/// ("spring boot", "ruby on rails") still register.
pub fn appears_in(token: &SkillToken, text: &str) -> bool {
    let segments: Vec<String> = split_segments(text).map(|s| compact_key(&s)).collect();
    if segments.is_empty() {
        return false;
    }

    let mut keys: HashSet<String> = segments.iter().cloned().collect();
    for window in segments.windows(2).chain(segments.windows(3)) {
        keys.insert(window.concat());
    }

    if keys.contains(&compact_key(&token.canonical)) {
        return true;
    }
    token
        .aliases
        .iter()
        .any(|alias| keys.contains(&compact_key(alias)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_and_case_equivalence() {
        assert_eq!(normalize_skill("JS"), "javascript");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("C#"), "csharp");
        assert_eq!(normalize_skill("Spring Boot"), "spring");
    }

    #[test]
    fn unknown_skills_pass_through_lowercased() {
        assert_eq!(normalize_skill("MyInternalTool"), "myinternaltool");
        assert_eq!(match_known("MyInternalTool"), None);
    }

    #[test]
    fn compact_keys_absorb_separator_drift() {
        assert_eq!(normalize_skill("node.js"), "nodejs");
        assert_eq!(normalize_skill("Node JS"), "nodejs");
        assert_eq!(normalize_skill("react-native"), "reactnative");
    }

    #[test]
    fn tolerates_small_typos_on_long_aliases() {
        assert_eq!(normalize_skill("kuberntes"), "kubernetes");
        assert_eq!(normalize_skill("postgrsql"), "postgresql");
    }

    #[test]
    fn does_not_fuzz_short_tokens() {
        assert_eq!(normalize_skill("javaa"), "javaa");
        assert_eq!(normalize_skill("rustt"), "rustt");
    }

    #[test]
    fn expand_returns_alias_set() {
        let token = expand("Django");
        assert_eq!(token.canonical, "django");
        assert!(token.aliases.contains(&"drf"));

        let unknown = expand("frobnicator");
        assert_eq!(unknown.canonical, "frobnicator");
        assert!(unknown.aliases.is_empty());
    }

    #[test]
    fn dominant_token_picks_first_known_segment() {
        assert_eq!(
            dominant_token("3+ years building Django services"),
            Some("django")
        );
        assert_eq!(dominant_token("strong communication skills"), None);
    }

    #[test]
    fn appears_in_checks_canonical_and_aliases() {
        let token = expand("spring");
        assert!(appears_in(&token, "Built APIs with Spring Boot"));
        assert!(!appears_in(&token, "Built APIs with Django"));

        // Multi-word aliases register through joined segment runs.
        let aws = expand("aws");
        assert!(appears_in(&aws, "managed Amazon Web Services infrastructure"));
    }

    #[test]
    fn appears_in_requires_whole_tokens() {
        assert!(!appears_in(&expand("java"), "javascript frontend work"));
        assert!(!appears_in(&expand("golang"), "designed algorithms for routing"));
        assert!(!appears_in(&expand("rest api"), "interested in distributed systems"));

        assert!(appears_in(&expand("java"), "Java and JavaScript work"));
        assert!(appears_in(&expand("golang"), "services written in Go"));
    }

    #[test]
    fn normalize_skill_set_dedupes() {
        let set = normalize_skill_set(&[
            "Python".to_string(),
            "python3".to_string(),
            "  JS ".to_string(),
        ]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("python"));
        assert!(set.contains("javascript"));
    }
}
