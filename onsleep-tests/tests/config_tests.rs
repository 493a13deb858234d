//! Configuration store and command-line settings

use clap::Parser;
use onsleep_daemon::cli::{apply_settings, format_commands, Cli};
use onsleep_daemon::config::{ConfigStore, OnSleepConfig, DEFAULT_ANCHOR};
use onsleep_daemon::errors::{CliError, ConfigError};
use onsleep_daemon::hooks::HookKind;
use std::time::Duration;
use tempfile::TempDir;

fn run(args: &[&str], store: &ConfigStore) -> Result<String, CliError> {
    let cli = Cli::parse_from(std::iter::once("onsleep").chain(args.iter().copied()));
    let mut out = Vec::new();
    apply_settings(&cli, store, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_cli_path_wins() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("custom.yaml");
    let store = ConfigStore::resolve(Some(path.clone()));
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn test_settings_round_trip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::new(temp_dir.path().join("onsleep.yaml"));

    run(&["--onsleep", "pause-players.service"], &store).unwrap();
    run(&["--onwake", "resume-players.service"], &store).unwrap();

    let config = store.load().unwrap();
    let hooks = config.hooks();
    assert_eq!(hooks.trigger(HookKind::OnSleep), Some("pause-players.service"));
    assert_eq!(hooks.trigger(HookKind::OnWake), Some("resume-players.service"));
    assert_eq!(config.anchor().as_str(), DEFAULT_ANCHOR);

    let printed = run(&["--commands"], &store).unwrap();
    assert_eq!(
        printed,
        "OnSleep=pause-players.service\nOnWake=resume-players.service\n"
    );
}

#[test]
fn test_nocommands_clears_both() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::new(temp_dir.path().join("onsleep.yaml"));
    run(&["--onsleep", "a", "--onwake", "b"], &store).unwrap();

    run(&["--nocommands"], &store).unwrap();
    assert_eq!(store.load().unwrap().hooks(), Default::default());
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::new(temp_dir.path().join("onsleep.yaml"));
    std::fs::write(store.path(), "OnSleep: [unterminated\n").unwrap();

    assert!(matches!(store.load(), Err(ConfigError::Parse { .. })));
    assert!(matches!(
        run(&["--commands"], &store),
        Err(CliError::Config(ConfigError::Parse { .. }))
    ));
}

#[test]
fn test_format_commands() {
    let config = OnSleepConfig {
        on_wake: Some("wake".into()),
        poll_interval: Some(Duration::from_millis(500)),
        ..Default::default()
    };
    assert_eq!(format_commands(&config), "OnSleep=UNSET\nOnWake=wake\n");
}
