//! Command tests driving `run` against temp settings files and a local
//! HTTP server.

use airtable_user_cli::cli::Cli;
use airtable_user_cli::error::CliError;
use airtable_user_cli::run;
use airtable_user_cli::settings::{ConfigError, Settings, SettingsStore};
use airtable_user_core::LookupError;
use airtable_user_test_utils::{
    closed_port_url, error_body, records_body, sample_config, CannedHttpServer,
};
use clap::Parser;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

async fn run_cli(args: &[&str], input: &str) -> Result<String, CliError> {
    let mut argv = vec!["airtable-user-info"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    let mut out = Vec::new();
    run(cli, input.as_bytes(), &mut out).await?;
    Ok(String::from_utf8(out).expect("utf-8 output"))
}

fn write_settings(path: &Path, api_base_url: String) {
    let mut settings = Settings {
        airtable: sample_config(),
        ..Settings::default()
    };
    settings.client.api_base_url = api_base_url;
    settings.client.request_timeout_ms = 2_000;
    SettingsStore::new(path).save(&settings).unwrap();
}

#[tokio::test]
async fn test_settings_set_then_show_masks_token() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/settings.toml");
    let config = path.to_str().unwrap();

    let output = run_cli(
        &[
            "--config",
            config,
            "settings",
            "set",
            "--base-id",
            "appOne",
            "--bearer-token",
            "patSecretToken",
        ],
        "",
    )
    .await
    .unwrap();
    assert!(output.starts_with("Saved "));
    assert!(!output.contains("patSecretToken"));

    run_cli(&["--config", config, "settings", "set", "--table-id", "tblTwo"], "")
        .await
        .unwrap();

    let stored = SettingsStore::new(&path).load().unwrap();
    assert_eq!(stored.airtable.base_id, "appOne");
    assert_eq!(stored.airtable.table_id, "tblTwo");
    assert_eq!(stored.airtable.bearer_token, "patSecretToken");

    let shown = run_cli(&["--config", config, "settings", "show"], "")
        .await
        .unwrap();
    assert!(shown.contains("appOne"));
    assert!(shown.contains("tblTwo"));
    assert!(shown.contains(&"*".repeat("patSecretToken".len())));
    assert!(!shown.contains("patSecretToken"));
    assert!(shown.contains("[airtable_user_info field_id='' default_value='']"));
}

#[tokio::test]
async fn test_settings_set_without_values_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");

    let output = run_cli(&["--config", path.to_str().unwrap(), "settings", "set"], "")
        .await
        .unwrap();

    assert_eq!(output, "No changes\n");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_show_unset_settings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let shown = run_cli(&["--config", path.to_str().unwrap(), "settings", "show"], "")
        .await
        .unwrap();

    assert!(shown.contains("bearer_token:       (not set)"));
}

#[tokio::test]
async fn test_resolve_prints_found_value() {
    let server = CannedHttpServer::start(200, records_body(&[json!({"fldTier": "Gold"})]))
        .await
        .unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    write_settings(&path, server.base_url());

    let output = run_cli(
        &[
            "--config",
            path.to_str().unwrap(),
            "resolve",
            "--field-id",
            "fldTier",
            "--default-value",
            "Standard",
            "--email",
            "a@b.com",
        ],
        "",
    )
    .await
    .unwrap();

    assert_eq!(output, "Gold\n");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .query()
        .unwrap_or_default()
        .contains("a%40b.com"));
}

#[tokio::test]
async fn test_resolve_prints_default_on_transport_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    write_settings(&path, closed_port_url().await.unwrap());

    let output = run_cli(
        &[
            "--config",
            path.to_str().unwrap(),
            "resolve",
            "--field-id",
            "fldTier",
            "--default-value",
            "Standard",
            "--email",
            "a@b.com",
        ],
        "",
    )
    .await
    .unwrap();

    assert_eq!(output, "Standard\n");
}

#[tokio::test]
async fn test_strict_resolve_surfaces_rejection() {
    let server = CannedHttpServer::start(403, error_body("INVALID_PERMISSIONS", "Forbidden"))
        .await
        .unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    write_settings(&path, server.base_url());

    let err = run_cli(
        &[
            "--config",
            path.to_str().unwrap(),
            "resolve",
            "--field-id",
            "fldTier",
            "--email",
            "a@b.com",
            "--strict",
        ],
        "",
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CliError::Lookup(LookupError::Rejected { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_render_stdin_template() {
    let server = CannedHttpServer::start(
        200,
        records_body(&[json!({"fldTier": "Gold", "fldPoints": 1200})]),
    )
    .await
    .unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    write_settings(&path, server.base_url());

    let template = "<p>Tier: [airtable_user_info field_id='fldTier']</p>\n\
                    <p>Points: [airtable_user_info field_id='fldPoints' default_value='0']</p>\n\
                    <p>Docs: [[airtable_user_info field_id='fldTier']]</p>\n";

    let output = run_cli(
        &["--config", path.to_str().unwrap(), "render", "--email", "a@b.com"],
        template,
    )
    .await
    .unwrap();

    assert_eq!(
        output,
        "<p>Tier: Gold</p>\n<p>Points: 1200</p>\n<p>Docs: [airtable_user_info field_id='fldTier']</p>\n"
    );
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test]
async fn test_render_file_template() {
    let server = CannedHttpServer::start(200, r#"{"records":[]}"#).await.unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    write_settings(&path, server.base_url());
    let template = dir.path().join("page.html");
    std::fs::write(&template, "Hello [airtable_user_info field_id='fldName' default_value='guest']!").unwrap();

    let output = run_cli(
        &[
            "--config",
            path.to_str().unwrap(),
            "render",
            template.to_str().unwrap(),
            "--email",
            "nobody@b.com",
        ],
        "",
    )
    .await
    .unwrap();

    assert_eq!(output, "Hello guest!");
}

#[tokio::test]
async fn test_invalid_settings_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[client]\nrequest_timeout_ms = 0\n").unwrap();

    let err = run_cli(
        &["--config", path.to_str().unwrap(), "resolve", "--field-id", "fldA"],
        "",
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CliError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn test_malformed_settings_error_hides_token() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[airtable]\nbearer_token = \"patLeakedSecret").unwrap();

    let err = run_cli(
        &["--config", path.to_str().unwrap(), "resolve", "--field-id", "fldA", "--strict"],
        "",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Config(ConfigError::Parse { .. })));
    assert!(!err.to_string().contains("patLeakedSecret"));
}
