use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::Filter;

/// One request seen by a [`ChangeReceiver`]
#[derive(Debug, Clone)]
pub struct CapturedPost {
    pub content_type: Option<String>,
    pub body: Value,
}

/// In-process HTTP endpoint recording every POST it receives and answering
/// with a fixed status. Shuts down when dropped.
pub struct ChangeReceiver {
    pub url: String,
    posts: mpsc::UnboundedReceiver<CapturedPost>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ChangeReceiver {
    pub async fn start(status: u16) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        let (tx, posts) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let route = warp::post()
            .and(warp::header::optional::<String>("content-type"))
            .and(warp::body::bytes())
            .map(move |content_type: Option<String>, body: Bytes| {
                let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
                let _ = tx.send(CapturedPost { content_type, body });
                warp::reply::with_status("received", status)
            });

        let (addr, server) =
            warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            url: format!("http://{addr}/changes"),
            posts,
            shutdown: Some(shutdown),
        }
    }

    /// Waits up to five seconds for the next request.
    pub async fn next_post(&mut self) -> CapturedPost {
        tokio::time::timeout(Duration::from_secs(5), self.posts.recv())
            .await
            .expect("no request received in time")
            .expect("receiver closed")
    }

    pub fn try_next_post(&mut self) -> Option<CapturedPost> {
        self.posts.try_recv().ok()
    }
}

impl Drop for ChangeReceiver {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
