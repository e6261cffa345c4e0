use kvpilot::BackendConfig;
use kvpilot::PilotConfig;
use kvpilot::WatchSpec;
use kvpilot::WorkspaceConfig;
use serde_json::json;
use tempfile::tempdir;

use crate::commons::delete_key;
use crate::commons::put_key;
use crate::commons::Receiver;
use crate::commons::RunningApp;
use crate::enable_logger;

#[tokio::test]
async fn test_changes_are_posted_with_workspace_prefix() {
    enable_logger();
    let data = tempdir().unwrap();
    let mut receiver = Receiver::start().await;

    put_key(data.path(), "cobalt/app/a", "1");
    put_key(data.path(), "cobalt/app/b", "2");

    let config = PilotConfig {
        backend: BackendConfig {
            name: "file".to_string(),
            options: json!({ "root": data.path() }),
        },
        workspace: WorkspaceConfig {
            root: Some("/cobalt".to_string()),
        },
        watches: vec![WatchSpec {
            path: "/app".to_string(),
            poll: 1,
            on_change_post_url: Some(receiver.url.clone()),
            ..Default::default()
        }],
        ..Default::default()
    };
    let app = RunningApp::start(&config);

    let first = receiver.next_body().await;
    assert_eq!(
        first,
        json!({
            "root": "cobalt/app",
            "addition": [
                { "path_on_change": "cobalt/app/a", "value": "1" },
                { "path_on_change": "cobalt/app/b", "value": "2" }
            ],
            "modification": [],
            "deletion": []
        })
    );

    put_key(data.path(), "cobalt/app/c", "3");
    put_key(data.path(), "cobalt/app/b", "20");
    delete_key(data.path(), "cobalt/app/a");

    let second = receiver.next_body().await;
    assert_eq!(
        second,
        json!({
            "root": "cobalt/app",
            "addition": [{ "path_on_change": "cobalt/app/c", "value": "3" }],
            "modification": [{ "path_on_change": "cobalt/app/b", "value": "20" }],
            "deletion": [{ "path_on_change": "cobalt/app/a", "value": "" }]
        })
    );

    app.shutdown().await;
}
