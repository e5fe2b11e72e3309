use anyhow::{Context, Result};
use image_column_board::board_store::BoardStore;
use image_column_board::config_store::ConfigStore;
use image_column_board::path_utils::{get_base_dir, resolve_config_path};
use image_column_board::server::{open_in_browser, AppServer, AppState, BoardSession};
use std::env;
use std::sync::mpsc;
use std::sync::Arc;

struct Args {
    config: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = parse_args();
    let base_dir = get_base_dir();
    let config_path = resolve_config_path(args.config, &base_dir);

    let config = ConfigStore::new(config_path.clone())
        .with_context(|| format!("failed to open config: {}", config_path.display()))?;
    let preferred_port = config.server_port();

    let board_store = BoardStore::new(base_dir).context("failed to prepare board store")?;
    let session = BoardSession::new(board_store);
    tracing::info!(
        groups = session.current().groups.len(),
        urls = session.current().url_count(),
        "board loaded"
    );

    let state = Arc::new(AppState::new(config, session));
    let mut server =
        AppServer::start(state, preferred_port).context("failed to start server")?;

    let url = format!("http://127.0.0.1:{}/", server.port());
    tracing::info!(%url, "image column board listening");

    if let Err(err) = open_in_browser(&url) {
        tracing::warn!(error = %err, "failed to open browser, open the url manually");
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("failed to install shutdown handler")?;

    let _ = shutdown_rx.recv();
    tracing::info!("shutting down");
    server.stop();

    Ok(())
}

fn parse_args() -> Args {
    let mut config = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(value) = args.next() {
                config = Some(value);
            }
        }
    }

    Args { config }
}
