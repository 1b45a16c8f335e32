//! Configuration system tests
//!
//! Tests for config paths and editor config loading/saving.

use xfl_editor::config::EditorConfig;
use xfl_editor::config_paths;
use xfl_editor::model::EditorModel;

// ========================================================================
// Config Paths Tests
// ========================================================================

#[test]
fn test_config_dir_contains_app_name() {
    if let Some(dir) = config_paths::config_dir() {
        assert!(dir.to_string_lossy().contains("xfl-editor"));
    }
}

#[test]
fn test_config_file_ends_with_yaml() {
    if let Some(path) = config_paths::config_file() {
        assert!(path.to_string_lossy().ends_with("config.yaml"));
    }
}

#[test]
fn test_catalog_and_logs_live_under_config_dir() {
    if let (Some(config), Some(catalog), Some(logs)) = (
        config_paths::config_dir(),
        config_paths::default_catalog_file(),
        config_paths::logs_dir(),
    ) {
        assert!(catalog.starts_with(&config));
        assert!(logs.starts_with(&config));
    }
}

// ========================================================================
// Editor Config Tests
// ========================================================================

#[test]
fn test_defaults() {
    let config = EditorConfig::default();
    assert_eq!(config.parse_iteration_limit, 10_000);
    assert_eq!(config.structure_cache_capacity, 100);
    assert!(config.hide_question_mark);
    assert_eq!(config.runtime_context, "default");
    assert!(config.structure_catalog.is_none());
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let config = EditorConfig {
        parse_iteration_limit: 50,
        structure_cache_capacity: 8,
        hide_question_mark: false,
        runtime_context: "release-7".into(),
        structure_catalog: Some(dir.path().join("structures.json")),
    };
    config.save_to(&path).unwrap();

    assert_eq!(EditorConfig::load_from(&path), config);
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "structure_cache_capacity: 3\n").unwrap();

    let config = EditorConfig::load_from(&path);
    assert_eq!(config.structure_cache_capacity, 3);
    assert_eq!(config.parse_iteration_limit, 10_000);
}

#[test]
fn test_missing_or_invalid_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        EditorConfig::load_from(&dir.path().join("absent.yaml")),
        EditorConfig::default()
    );

    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "structure_cache_capacity: [not a number\n").unwrap();
    assert_eq!(EditorConfig::load_from(&path), EditorConfig::default());
}

#[test]
fn test_config_reaches_formulas_and_cache() {
    let config = EditorConfig {
        parse_iteration_limit: 1,
        structure_cache_capacity: 0,
        hide_question_mark: false,
        runtime_context: "v2".into(),
        structure_catalog: None,
    };
    let mut model = EditorModel::new(config);
    let id = model.open_formula("%0%+%1%", vec![], vec![]);

    let formula = model.formula(id).unwrap();
    assert_eq!(formula.expression(), "%0%");
    assert!(!formula.options().hide_question_mark);
    assert_eq!(model.structures.cache().capacity(), 1);
    assert_eq!(model.structures.context().0, "v2");
}
