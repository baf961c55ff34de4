use std::{env, fs, time::Duration};

use wdr_auth::{UnknownScopePolicy, ValidatorKind};
use wdr_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("wdr.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081
body_limit_bytes = 4096

[api]
route_base = "wdr/v2"
oauth_token_request_url = "https://login.example.org/authorize"
public_service_url = ""

[logging]
level = "debug"

[auth]
validator = "static"
leeway = "30s"
unknown_scope_policy = "drop"
known_scopes = ["Study:A"]

[auth.roles]
editor = ["WdrStoreAccess"]

[[auth.static_tokens]]
token = "editor-token"
subject = "alice"
roles = ["editor"]
scopes = ["Study:A", "Study:B"]
expires_at = "2030-01-01T00:00:00Z"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.server.body_limit_bytes, 4096);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.auth.validator, ValidatorKind::Static);
    assert_eq!(cfg.auth.leeway, Duration::from_secs(30));
    assert_eq!(cfg.auth.unknown_scope_policy, UnknownScopePolicy::Drop);
    assert_eq!(cfg.auth.static_tokens.len(), 1);
    assert!(cfg.auth.static_tokens[0].expires_at.is_some());
    assert_eq!(cfg.auth.roles["editor"], vec!["WdrStoreAccess".to_string()]);

    let settings = cfg.api.settings();
    assert_eq!(
        settings.oauth_token_request_url.as_deref(),
        Some("https://login.example.org/authorize")
    );
    assert_eq!(settings.public_service_url, None);

    // 2) Env override should win over file
    unsafe {
        env::set_var("WDR__SERVER__PORT", "9099");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9099);
    unsafe {
        env::remove_var("WDR__SERVER__PORT");
    }

    // 3) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[api]
api_version = "v2"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("api.api_version"));

    // 4) JWT without a secret is rejected
    let jwt_path = dir.path().join("jwt.toml");
    fs::write(&jwt_path, "[auth]\nvalidator = \"jwt\"\n").expect("write jwt toml");
    let err = load_config(jwt_path.to_str()).expect_err("expected auth error");
    assert!(err.contains("auth.jwt.secret"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.toml");
    let cfg = load_config(path.to_str()).expect("defaults are valid");
    assert_eq!(cfg.api.route_base, "wdr/v2");
    assert_eq!(cfg.api.api_version, "2.0.0");
}
