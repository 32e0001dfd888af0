//! Configuration files and the persisted store

use portal_admin::{cli, commands, ConfigError, Portal, PortalConfig};
use portal_test_utils::{may, SAMPLE_OUTLINE};
use std::io::Write;

#[test]
fn missing_config_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PortalConfig::from_file(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn flags_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portal.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[store]\npath = \"from-file.json\"\n\n[mail]\ndry_run = true").unwrap();

    let matches = cli::command()
        .try_get_matches_from([
            "portal-admin",
            "--config",
            path.to_str().unwrap(),
            "--store",
            "from-flag.json",
            "projects",
        ])
        .unwrap();
    let config = cli::config_from(&matches).unwrap();

    assert_eq!(config.store.path, std::path::PathBuf::from("from-flag.json"));
    assert!(config.mail.dry_run);
}

#[tokio::test]
async fn imported_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = PortalConfig::new()
        .with_store_path(dir.path().join("portal.json"))
        .with_dry_run(true);

    let portal = Portal::open(&config).await.unwrap();
    commands::import(&portal, SAMPLE_OUTLINE, None, false, may(1, 9))
        .await
        .unwrap();
    drop(portal);

    let reopened = Portal::open(&config).await.unwrap();
    let listing = commands::projects(&reopened).await.unwrap();
    assert!(listing.contains("Pantry  0/3 tasks done"));
}

#[tokio::test]
async fn preview_prints_tree_without_touching_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = PortalConfig::new().with_store_path(dir.path().join("portal.json"));
    let portal = Portal::open(&config).await.unwrap();

    let parsed = portal.parser().parse(SAMPLE_OUTLINE).unwrap();
    let text = commands::preview(&parsed);

    assert!(text.starts_with("Pantry\n  Shared grocery lists\n  A list app for households.\n"));
    assert!(text.contains(
        "## Lists (2 tasks)\n   Create and browse lists.\n   - Create list\n   - Share list\n"
    ));
    assert!(text.ends_with("2 screens, 3 tasks\n"));
    assert!(!dir.path().join("portal.json").exists());
}
