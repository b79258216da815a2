use super::*;

fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[test]
fn defaults_apply_without_sources() {
    let config = RuntimeConfig::from_sources(None, &BTreeMap::new()).expect("defaults");
    assert_eq!(config, RuntimeConfig::default());
    assert_eq!(config.http_timeout(), Duration::from_secs(30));
    assert_eq!(config.lm_max_tokens, 1500);
    assert_eq!(config.embedding_dimensions, 1536);
}

#[test]
fn environment_overrides_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"http_timeout_secs": 5, "lm_model": "from-file"}"#)
        .expect("write config");

    let config = RuntimeConfig::from_sources(
        Some(&path),
        &env(&[(ENV_LM_MODEL, "from-env"), (ENV_LM_COMMAND, "  ")]),
    )
    .expect("layered config");

    assert_eq!(config.http_timeout_secs, 5);
    assert_eq!(config.lm_model, "from-env");
    assert_eq!(config.lm_command, None);
}

#[test]
fn malformed_environment_values_are_rejected() {
    let err = RuntimeConfig::from_sources(None, &env(&[(ENV_LM_MAX_TOKENS, "lots")]))
        .expect_err("non-numeric tokens");
    assert!(err.to_string().contains(ENV_LM_MAX_TOKENS));

    let err = RuntimeConfig::from_sources(None, &env(&[(ENV_HTTP_TIMEOUT_SECS, "0")]))
        .expect_err("zero timeout");
    assert!(err.to_string().contains("http_timeout_secs"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"htp_timeout": 5}"#).expect("write config");
    assert!(RuntimeConfig::from_sources(Some(&path), &BTreeMap::new()).is_err());
}

#[test]
fn run_overrides_only_affect_lm_settings() {
    let config = RuntimeConfig::default();
    let options = RunOptions {
        override_llm_model: Some("big-model".to_string()),
        override_max_tokens: Some(42),
        ..RunOptions::default()
    };
    let settings = config.lm_settings(&options);
    assert_eq!(settings.model, "big-model");
    assert_eq!(settings.max_tokens, 42);
    assert_eq!(config.lm_model, "default");

    let settings = config.lm_settings(&RunOptions::default());
    assert_eq!(settings.model, "default");
    assert_eq!(settings.max_tokens, 1500);
}
