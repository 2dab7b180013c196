//! Config Validation Tests
//!
//! File round-trips, unknown-key warnings and range checks for
//! `PlantConfig`, using real TOML files in a temp directory.

use std::io::Write;

use suivi_rendement::config::{ConfigError, PlantConfig};

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn defaults_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plant_config.toml");

    let original = PlantConfig::default();
    original.save_to_file(&path).unwrap();

    let (loaded, warnings) = PlantConfig::load_from_file(&path).unwrap();
    assert!(warnings.is_empty(), "round-trip must not warn: {warnings:?}");
    assert_eq!(loaded.thresholds, original.thresholds);
    assert_eq!(loaded.server.addr, original.server.addr);
    assert_eq!(loaded.backend.cache_ttl_secs, original.backend.cache_ttl_secs);
}

#[test]
fn partial_file_keeps_defaults_for_missing_sections() {
    let file = write_temp(
        r#"
        [plant]
        name = "VACPA"
        site = "Beni Khedache"

        [thresholds]
        breakdown_count = 5
    "#,
    );
    let (config, warnings) = PlantConfig::load_from_file(file.path()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.plant.name, "VACPA");
    assert_eq!(config.thresholds.breakdown_count, 5);
    // Untouched section keeps its default
    assert_eq!(config.thresholds.rendement_mid, 4.0);
    assert_eq!(config.backend.weigh_table, "rendements");
}

#[test]
fn unknown_key_warns_with_suggestion_but_still_loads() {
    let file = write_temp(
        r#"
        [thresholds]
        rendement_hgih = 4.8
    "#,
    );
    let (config, warnings) = PlantConfig::load_from_file(file.path()).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field, "thresholds.rendement_hgih");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("thresholds.rendement_high")
    );
    // The typo'd key is ignored; the real field keeps its default
    assert_eq!(config.thresholds.rendement_high, 4.5);
}

#[test]
fn out_of_range_thresholds_fail_validation() {
    let file = write_temp(
        r#"
        [thresholds]
        non_productivity_pct = 150.0
        breakdown_count = 0
    "#,
    );
    let (config, _) = PlantConfig::load_from_file(file.path()).unwrap();
    match config.validate() {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("non_productivity_pct")));
            assert!(errors.iter().any(|e| e.contains("breakdown_count")));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

#[test]
fn credentials_parse_from_file() {
    let file = write_temp(
        r#"
        [[credentials]]
        username = "op1"
        password = "secret"
        role = "operator"

        [[credentials]]
        username = "chef"
        password = "autre"
        role = "supervisor"
    "#,
    );
    let (config, warnings) = PlantConfig::load_from_file(file.path()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(config.credentials.len(), 2);
    assert_eq!(config.credentials[1].role, "supervisor");
    assert!(config.validate().is_ok());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_temp("[thresholds\nrendement_mid = ");
    match PlantConfig::load_from_file(file.path()) {
        Err(ConfigError::Parse(_)) => {}
        other => panic!("expected a parse error, got {other:?}"),
    }
}
