use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::{start_server, LogEntry};
use crate::interfaces::state::AppState;

/// `RUST_LOG` wins over `log.filter`
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let app_state = Arc::new(AppState::bootstrap(config).await?);
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let server = &app_state.config.server;
    info!(host = %server.host, port = server.port, "Starting HTTP API");

    start_server(app_state.clone(), logs)
        .map_err(|err| {
            error!(error = %err, "Failed to bind HTTP API");
            AppError::from(err)
        })?
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

pub fn run() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = actix_web::rt::System::new().block_on(serve(config));
    if let Err(err) = result {
        error!(error = %err, "Server exited with error");
        std::process::exit(1);
    }
}
