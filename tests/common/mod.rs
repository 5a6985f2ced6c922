//! A background static-file HTTP server for integration tests, serving a
//! `tempfile` directory via `warp::fs::dir` (which handles `Range:`/
//! `Accept-Ranges: bytes` natively). Every test that needs a real
//! Range-capable origin spins one of these up rather than faking HTTP at
//! the `Fetcher` layer.

use std::net::SocketAddr;

use tempfile::TempDir;
use tokio::sync::oneshot;

/// An in-process HTTP server rooted at a temporary directory. Dropping it
/// tears down the background runtime and deletes the directory.
pub struct StaticHTTPServer {
    addr: SocketAddr,
    _dir: TempDir,
    shutdown: Option<oneshot::Sender<()>>,
    runtime: Option<tokio::runtime::Runtime>,
}

impl StaticHTTPServer {
    /// Start a server whose document root contains a single file `name`
    /// with contents `data`.
    pub fn new(name: &str, data: &[u8]) -> StaticHTTPServer {
        let dir = tempfile::tempdir().expect("create temp dir for static server");
        std::fs::write(dir.path().join(name), data).expect("write fixture file");
        Self::serve(dir)
    }

    fn serve(dir: TempDir) -> StaticHTTPServer {
        use warp::Filter;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build tokio runtime for static server");

        let root: std::path::PathBuf = dir.path().to_path_buf();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();

        runtime.spawn(async move {
            let routes = warp::fs::dir(root);
            let (addr, server) =
                warp::serve(routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                    shutdown_rx.await.ok();
                });
            addr_tx.send(addr).expect("send bound address");
            server.await;
        });

        let addr = addr_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("static server bound an address");

        StaticHTTPServer {
            addr,
            _dir: dir,
            shutdown: Some(shutdown_tx),
            runtime: Some(runtime),
        }
    }

    /// The URL of the single file this server was constructed with.
    pub fn url(&self, name: &str) -> url::Url {
        url::Url::parse(&format!("http://{}/{}", self.addr, name)).unwrap()
    }
}

impl Drop for StaticHTTPServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
