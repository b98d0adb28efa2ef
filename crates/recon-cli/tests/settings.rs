//! Integration tests for settings loading.

use std::fs;

use recon_cli::config::{Settings, SettingsError};
use recon_workflow::Authenticator;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
    assert_eq!(settings.service.base_url, "http://localhost:8000/api");
    assert!(!settings.auth.require_token);
    assert!(settings.authenticator().is_authenticated());
}

#[test]
fn full_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[service]
base_url = "https://erp.example.com/api/"
timeout_secs = 45
api_token = "abc"

[service.endpoints]
columns = "v2/columns"

[auth]
require_token = true
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert_eq!(settings.service.timeout_secs, 45);
    assert_eq!(
        settings
            .service
            .endpoint_url(&settings.service.endpoints.columns),
        "https://erp.example.com/api/v2/columns"
    );
    assert_eq!(settings.service.endpoints.compare, "logistica/comparar-documentos");
    assert!(settings.authenticator().is_authenticated());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[service\nbase_url = 3").unwrap();

    let err = Settings::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
}

#[test]
fn required_token_without_token_is_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[auth]\nrequire_token = true\n").unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert!(!settings.authenticator().is_authenticated());
}

#[test]
fn blank_token_does_not_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[service]\napi_token = \"\"\n\n[auth]\nrequire_token = true\n",
    )
    .unwrap();

    let settings = Settings::load(Some(path.as_path())).unwrap();
    assert!(settings.service.api_token.is_none());
    assert!(!settings.authenticator().is_authenticated());
}

#[test]
fn default_settings_snapshot() {
    insta::assert_json_snapshot!(Settings::default(), @r#"
    {
      "service": {
        "base_url": "http://localhost:8000/api",
        "timeout_secs": 120,
        "endpoints": {
          "columns": "logistica/analisar-colunas",
          "compare": "logistica/comparar-documentos",
          "results": "logistica/resultados",
          "export": "logistica/exportar"
        }
      },
      "auth": {
        "require_token": false
      }
    }
    "#);
}
