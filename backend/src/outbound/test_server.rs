//! Loopback axum server standing in for upstream services in adapter tests.

use axum::Router;
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves `routes` under `/api` until dropped.
pub(crate) struct TestServer {
    base_url: Url,
    task: JoinHandle<()>,
}

impl TestServer {
    pub(crate) async fn start(routes: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let app = Router::new().nest("/api", routes);
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test routes");
        });
        let base_url = Url::parse(&format!("http://{addr}/api/")).expect("base url");
        Self { base_url, task }
    }

    pub(crate) fn base_url(&self) -> Url {
        self.base_url.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
