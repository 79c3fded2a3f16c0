// Connection handling module
// Serves one accepted TCP connection, optionally behind TLS

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::TlsAcceptor;

use crate::handler::Router;
use crate::logger;

/// Per-connection settings taken from the performance configuration
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub keep_alive: bool,
    /// Lifetime of a connection, counted from accept. Once it passes, the
    /// request in flight still gets its response and the connection closes.
    pub timeout: Duration,
}

/// Handle an accepted connection in its own task.
///
/// Nothing is shared between connections except the read-only router.
pub fn spawn_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: Router,
    acceptor: Option<TlsAcceptor>,
    settings: ConnectionSettings,
) {
    let deadline = Instant::now() + settings.timeout;

    tokio::spawn(async move {
        match acceptor {
            Some(acceptor) => {
                match tokio::time::timeout_at(deadline, acceptor.accept(stream)).await {
                    Ok(Ok(tls_stream)) => {
                        serve_io(tls_stream, peer_addr, router, settings, deadline).await;
                    }
                    Ok(Err(e)) => {
                        logger::log_warning(&format!("TLS handshake with {peer_addr} failed: {e}"));
                    }
                    Err(_) => {
                        logger::log_warning(&format!("TLS handshake with {peer_addr} timed out"));
                    }
                }
            }
            None => serve_io(stream, peer_addr, router, settings, deadline).await,
        }
    });
}

async fn serve_io<I>(
    stream: I,
    peer_addr: SocketAddr,
    router: Router,
    settings: ConnectionSettings,
    deadline: Instant,
) where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut builder = http1::Builder::new();
    builder.keep_alive(settings.keep_alive);

    let service = service_fn(move |req| {
        let router = router.clone();
        async move { Ok::<_, Infallible>(router.serve(req, peer_addr).await) }
    });

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(err) = result {
                logger::log_connection_error(&err);
            }
            return;
        }
        () = tokio::time::sleep_until(deadline) => {
            tracing::debug!(
                "Connection from {peer_addr} reached {}s, closing after the current request",
                settings.timeout.as_secs()
            );
            conn.as_mut().graceful_shutdown();
        }
    }

    // Backend calls carry their own timeout, so this always finishes
    if let Err(err) = conn.await {
        logger::log_connection_error(&err);
    }
}
