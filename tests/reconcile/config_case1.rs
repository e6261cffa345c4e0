//! Configuration file to running watches, the way the binary does it.

use std::fs;

use kvpilot::PilotConfig;
use serial_test::serial;
use tempfile::tempdir;

use crate::commons::put_key;
use crate::commons::wait_until;
use crate::commons::RunningApp;

#[tokio::test]
#[serial]
async fn test_toml_config_drives_watches() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let marker = work.path().join("reloaded");
    let config_path = work.path().join("pilot.toml");

    put_key(data.path(), "svc/db/host", "10.0.0.7");
    fs::write(
        &config_path,
        format!(
            r#"
[backend]
name = "file"

[backend.options]
root = "{}"

[[watches]]
path = "svc/db"
poll = 1
onChange = "touch {}"
timeout = "2s"
"#,
            data.path().display(),
            marker.display()
        ),
    )
    .unwrap();

    let config = temp_env::with_vars(
        [("CONFIG_PATH", Some(config_path.to_str().unwrap()))],
        || PilotConfig::new().and_then(PilotConfig::validate),
    )
    .unwrap();
    assert_eq!(config.watches.len(), 1);
    assert!(config.watches[0].on_change.is_some());

    let app = RunningApp::start(&config);
    wait_until("on-change command", || marker.exists()).await;
    app.shutdown().await;
}

#[test]
#[serial]
fn test_invalid_watch_in_config_is_rejected() {
    let work = tempdir().unwrap();
    let config_path = work.path().join("pilot.json");
    fs::write(
        &config_path,
        r#"{ "backend": { "name": "file", "options": { "root": "/srv/kv" } },
             "watches": [ { "path": "svc/db", "poll": 0 } ] }"#,
    )
    .unwrap();

    let result = temp_env::with_vars(
        [("CONFIG_PATH", Some(config_path.to_str().unwrap()))],
        || PilotConfig::new().and_then(PilotConfig::validate),
    );
    assert!(matches!(result, Err(kvpilot::Error::Validation(_))));
}
