mod app;
mod modals;

use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use anyhow::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use gamedeals_core::{
    api::{ApiClient, Telemetry},
    config::{self, AppConfig},
    nav::History,
    search::SessionStore,
    services::{
        CategoryService, CommentService, GameService, SearchService, ServerService, UserService,
        VideoService,
    },
    state::AppState,
};

use app::{GameDealsApp, Services};

#[tokio::main]
async fn main() -> Result<()> {
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    let telemetry = Telemetry::new(config.analytics_id.clone());
    install_panic_hook(telemetry.clone());

    let api = Arc::new(ApiClient::new(&config, telemetry.clone())?);
    let services = Services {
        search: SearchService::new(Arc::clone(&api)),
        games: GameService::new(Arc::clone(&api)),
        categories: CategoryService::new(Arc::clone(&api)),
        comments: CommentService::new(Arc::clone(&api)),
        servers: ServerService::new(Arc::clone(&api)),
        users: UserService::new(Arc::clone(&api)),
        videos: VideoService::new(Arc::clone(&api)),
    };

    let app_state = AppState::new();
    let history = History::shared(Some(telemetry));
    let session = SessionStore::new();

    let mut app = GameDealsApp::new(config, services, app_state, history, session);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.log_dir)?;
    let log_path = config.log_dir.join("gamedeals.log");

    let env_filter = EnvFilter::from_default_env();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Top-level panic boundary: restore the terminal so the apology is
/// readable, report the exception, then defer to the default hook.
fn install_panic_hook(telemetry: Telemetry) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::event::DisableMouseCapture
        );
        telemetry.exception("panic", &info.to_string());
        eprintln!("Sorry — something went wrong and gamedeals had to close.");
        eprintln!("Details were written to the log file.");
        default_hook(info);
    }));
}
