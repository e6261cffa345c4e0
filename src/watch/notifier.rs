use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::ChangeSet;
use crate::Error;
use crate::NotificationError;
use crate::Result;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts change sets as JSON. Cheap to clone; all clones share one
/// connection pool.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
}

impl Notifier {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Fatal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Sends `changes` to `url`. The response body is logged and otherwise
    /// discarded; a non-success status is reported as an error.
    pub async fn post(
        &self,
        url: &str,
        changes: &ChangeSet,
    ) -> Result<()> {
        let body = serde_json::to_vec(changes).map_err(NotificationError::Encode)?;
        debug!(%url, root = %changes.root, body = %String::from_utf8_lossy(&body), "posting changes");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| NotificationError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(%url, %status, "failed to read response body: {}", e);
                String::new()
            }
        };
        if status.is_success() {
            info!(%url, %status, body = %text, "change notification delivered");
            Ok(())
        } else {
            warn!(%url, %status, body = %text, "change notification rejected");
            Err(NotificationError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into())
        }
    }
}
