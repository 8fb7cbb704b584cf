use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod archive;
mod config;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;

    // Worker threads from config, or one per CPU core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(config::AppState::new(&cfg)?);

    let purged = state.store.prepare()?;
    if purged > 0 {
        logger::log_info(&format!(
            "[Startup] Purged {purged} stale extraction entries from {}",
            cfg.storage.work_dir.display()
        ));
    }
    if !state.store.root().is_dir() {
        logger::log_warning(&format!(
            "Archive root {} does not exist, every download will fail until it is created",
            state.store.root().display()
        ));
    }

    let listener = server::create_reusable_listener(addr)?;
    let active_connections = Arc::new(AtomicUsize::new(0));

    let signals = Arc::new(server::SignalHandler::new());
    server::start_signal_handler(Arc::clone(&signals))?;

    logger::log_server_start(&addr, &cfg);

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(
            listener,
            state,
            active_connections,
            signals,
        ))
        .await
}
