// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use super::connection::{spawn_connection, ConnectionSettings};
use crate::handler::Router;
use crate::logger;

/// Accept loop shared by the plain and TLS variants
pub async fn start_server_loop(
    listener: TcpListener,
    router: Router,
    acceptor: Option<TlsAcceptor>,
    settings: ConnectionSettings,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        spawn_connection(stream, peer_addr, router.clone(), acceptor.clone(), settings);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => {
                logger::log_shutdown();
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, Config, Variant};
    use crate::server::create_listener;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Method, Request, StatusCode};
    use hyper_util::client::legacy::Client;
    use hyper_util::rt::TokioExecutor;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("index.html"), "<h1>jobs</h1>").unwrap();

        let mut config = Config::defaults(Variant::Plain).unwrap();
        config.server.static_dir = root.path().to_str().unwrap().to_string();
        config.logging.access_log = false;

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new(Arc::new(AppState::new(config)));
        let settings = ConnectionSettings {
            keep_alive: true,
            timeout: Duration::from_secs(10),
        };
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(start_server_loop(listener, router, None, settings, async {
            let _ = stop_rx.await;
        }));

        let client: Client<_, Full<Bytes>> =
            Client::builder(TokioExecutor::new()).build_http();

        let response = client
            .request(
                Request::builder()
                    .method(Method::GET)
                    .uri(format!("http://{addr}/"))
                    .body(Full::new(Bytes::new()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<h1>jobs</h1>");

        let response = client
            .request(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("http://{addr}/unknown-path"))
                    .body(Full::new(Bytes::from_static(b"{}")))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
