//! Config validation: unknown-key detection with "did you mean?" suggestions.
//!
//! Two-pass parse approach: the raw TOML is first read into `toml::Value`,
//! its key tree walked against the known field names, and warnings emitted
//! for anything unrecognised. The typed serde parse then proceeds as usual,
//! so warnings never break an existing config.

use std::collections::HashSet;

/// A non-fatal config warning (typo, unrecognised key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " — did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Complete set of valid dotted key paths for `PlantConfig`.
///
/// Maintained manually to match the struct hierarchy in `mod.rs`; any new
/// field added there must be added here too.
fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [plant]
        "plant",
        "plant.name",
        "plant.site",
        // [thresholds]
        "thresholds",
        "thresholds.rendement_high",
        "thresholds.rendement_mid",
        "thresholds.non_productivity_pct",
        "thresholds.underperformance_pct",
        "thresholds.variability",
        "thresholds.breakdown_count",
        "thresholds.error_rate_pct",
        // [server]
        "server",
        "server.addr",
        // [backend]
        "backend",
        "backend.url",
        "backend.api_key",
        "backend.weigh_table",
        "backend.incident_table",
        "backend.cache_ttl_secs",
        // [[credentials]]
        "credentials",
        "credentials.username",
        "credentials.password",
        "credentials.role",
    ];
    keys.iter().copied().collect()
}

/// Walk the parsed TOML tree and flag keys that match nothing we know.
pub fn check_unknown_keys(value: &toml::Value) -> Vec<ValidationWarning> {
    let known = known_config_keys();
    let mut warnings = Vec::new();
    walk_keys(value, "", &known, &mut warnings);
    warnings
}

fn walk_keys(
    value: &toml::Value,
    prefix: &str,
    known: &HashSet<&'static str>,
    warnings: &mut Vec<ValidationWarning>,
) {
    match value {
        toml::Value::Table(table) => {
            for (key, child) in table {
                let dotted = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if known.contains(dotted.as_str()) {
                    walk_keys(child, &dotted, known, warnings);
                } else {
                    let suggestion = closest_known_key(&dotted, known);
                    warnings.push(ValidationWarning {
                        field: dotted.clone(),
                        message: format!("unknown config key '{dotted}'"),
                        suggestion,
                    });
                }
            }
        }
        toml::Value::Array(items) => {
            // Arrays of tables ([[credentials]]) validate each element
            // against the array's own dotted prefix.
            for item in items {
                walk_keys(item, prefix, known, warnings);
            }
        }
        _ => {}
    }
}

/// Closest known key by edit distance, if reasonably close.
fn closest_known_key(key: &str, known: &HashSet<&'static str>) -> Option<String> {
    known
        .iter()
        .map(|candidate| (levenshtein(key, candidate), *candidate))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.to_string())
}

/// Classic dynamic-programming edit distance, small inputs only.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution_cost = usize::from(ca != cb);
            current[j + 1] = (prev[j] + substitution_cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_config_has_no_warnings() {
        let raw = r#"
            [thresholds]
            rendement_mid = 4.0

            [server]
            addr = "127.0.0.1:8080"
        "#;
        let value: toml::Value = toml::from_str(raw).unwrap();
        assert!(check_unknown_keys(&value).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let raw = r#"
            [thresholds]
            rendement_midd = 4.0
        "#;
        let value: toml::Value = toml::from_str(raw).unwrap();
        let warnings = check_unknown_keys(&value);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "thresholds.rendement_midd");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("thresholds.rendement_mid")
        );
    }

    #[test]
    fn test_unknown_section_flagged() {
        let raw = r#"
            [chartz]
            color = "blue"
        "#;
        let value: toml::Value = toml::from_str(raw).unwrap();
        let warnings = check_unknown_keys(&value);
        assert!(warnings.iter().any(|w| w.field == "chartz"));
    }

    #[test]
    fn test_credentials_array_keys_validated() {
        let raw = r#"
            [[credentials]]
            username = "chef"
            password = "x"
            rolle = "admin"
        "#;
        let value: toml::Value = toml::from_str(raw).unwrap();
        let warnings = check_unknown_keys(&value);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "credentials.rolle");
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("server", "servers"), 1);
    }
}
