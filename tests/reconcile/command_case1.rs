//! A watch over a file-backed namespace runs its on-change command once per
//! real change and stays quiet while the content is stable.

use std::time::Duration;

use kvpilot::BackendConfig;
use kvpilot::PilotConfig;
use kvpilot::WatchSpec;
use serde_json::json;
use tempfile::tempdir;

use crate::commons::delete_key;
use crate::commons::line_count;
use crate::commons::put_key;
use crate::commons::wait_until;
use crate::commons::RunningApp;
use crate::enable_logger;

#[tokio::test]
async fn test_command_runs_once_per_change() {
    enable_logger();
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let marker = work.path().join("runs");

    put_key(data.path(), "app/config/a", "1");
    put_key(data.path(), "app/config/b", "2");

    let config = PilotConfig {
        backend: BackendConfig {
            name: "file".to_string(),
            options: json!({ "root": data.path() }),
        },
        watches: vec![WatchSpec {
            path: "/app/config".to_string(),
            poll: 1,
            on_change: Some(json!(["sh", "-c", format!("echo run >> {}", marker.display())])),
            timeout: Some("5s".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let app = RunningApp::start(&config);

    // First cycle sees everything as added
    wait_until("initial run", || line_count(&marker) == 1).await;

    put_key(data.path(), "app/config/b", "3");
    delete_key(data.path(), "app/config/a");
    wait_until("run after change", || line_count(&marker) == 2).await;

    // Stable content: no further runs over several cycles
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(line_count(&marker), 2);

    app.shutdown().await;
}

#[tokio::test]
async fn test_missing_namespace_is_not_an_error() {
    let data = tempdir().unwrap();
    let work = tempdir().unwrap();
    let marker = work.path().join("runs");

    let config = PilotConfig {
        backend: BackendConfig {
            name: "file".to_string(),
            options: json!({ "root": data.path() }),
        },
        watches: vec![WatchSpec {
            path: "later".to_string(),
            poll: 1,
            on_change: Some(json!(format!("touch {}", marker.display()))),
            ..Default::default()
        }],
        ..Default::default()
    };
    let app = RunningApp::start(&config);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert!(!marker.exists());

    put_key(data.path(), "later/key", "value");
    wait_until("namespace to appear", || marker.exists()).await;

    app.shutdown().await;
}
