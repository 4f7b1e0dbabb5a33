use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let doc = res.parse::<toml_edit::Document>().unwrap();

    assert!(doc.get("api-base-url").is_some());
    assert!(doc.get("voice-backend").is_some());
    assert!(doc.get("config-file").is_none());
}

#[test]
fn it_matches_the_example_config() {
    let example = std::fs::read_to_string("./config.example.toml").unwrap();
    assert_eq!(
        Config::serialize_default(cli::build()).trim(),
        example.trim()
    );
}

#[test]
fn it_returns_defaults() {
    assert_eq!(Config::default(ConfigKey::ApiBaseURL), "http://localhost:5000");
    assert_eq!(Config::default(ConfigKey::StreamIdleTimeout), "120000");
    assert_eq!(Config::default(ConfigKey::VoiceBackend), "none");
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["ledgerchat", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;
    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_config_from_file() -> Result<()> {
    let matches =
        cli::build().try_get_matches_from(vec!["ledgerchat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());
    return Ok(());
}
