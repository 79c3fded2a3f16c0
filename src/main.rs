use std::sync::Arc;

use jobcompass_web::config::{AppState, Config, Variant};
use jobcompass_web::handler::Router;
use jobcompass_web::server::{self, ConnectionSettings};
use jobcompass_web::{logger, tls};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg);

    let addr = cfg.get_socket_addr()?;

    // The HTTPS variant refuses to start without its certificate and key
    let acceptor = match cfg.server.variant {
        Variant::Tls => Some(tls::load_acceptor(&cfg.tls)?),
        Variant::Plain => None,
    };

    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let settings = ConnectionSettings {
        keep_alive: cfg.performance.keep_alive,
        timeout: cfg.connection_timeout(),
    };
    let router = Router::new(Arc::new(AppState::new(cfg)));

    server::start_server_loop(listener, router, acceptor, settings, server::shutdown_signal()).await;
    Ok(())
}
