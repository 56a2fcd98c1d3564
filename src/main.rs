use dotenvy::dotenv;
use homework_status_bot::api::PracticumClient;
use homework_status_bot::config::{Credentials, Settings, LAST_MONTH_SECS};
use homework_status_bot::logging::{init_logging, RedactionPatterns};
use homework_status_bot::notifier::TelegramNotifier;
use homework_status_bot::poller::{PollState, Poller};
use std::path::Path;
use std::sync::Arc;
use teloxide::Bot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenv().ok();

    // Initialize redaction patterns early (before logging)
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    let settings = Settings::new();
    let log_dir = settings
        .as_ref()
        .ok()
        .and_then(|s| s.log_dir.as_deref())
        .map(Path::new);
    let _log_guard = init_logging(patterns, log_dir)?;

    info!("Starting homework status bot...");

    let settings = init_settings(settings);
    let credentials = init_credentials(&settings);

    let source = Arc::new(PracticumClient::new(
        settings.practicum_endpoint.clone(),
        &credentials.practicum_token,
        settings.request_timeout(),
    ));
    let notifier = Arc::new(TelegramNotifier::new(
        Bot::new(credentials.telegram_token.clone()),
        credentials.chat_id.clone(),
    ));
    let poller = Poller::new(source, notifier, settings.retry_period());
    poller.announce().await;

    let cancel = CancellationToken::new();
    spawn_ctrlc_handler(cancel.clone());

    let cursor = chrono::Utc::now().timestamp() - LAST_MONTH_SECS;
    let state = poller.run(PollState::new(cursor), cancel).await?;

    info!(cursor = state.cursor, "Bot stopped");
    Ok(())
}

fn init_settings(settings: Result<Settings, config::ConfigError>) -> Settings {
    match settings {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            error!("CRITICAL: failed to load configuration: {e}");
            std::process::exit(1);
        }
    }
}

fn init_credentials(settings: &Settings) -> Credentials {
    match settings.credentials() {
        Ok(c) => c,
        Err(e) => {
            error!("CRITICAL: {e}");
            std::process::exit(1);
        }
    }
}

fn spawn_ctrlc_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            return;
        }
        info!("Ctrl-C received, shutting down...");
        cancel.cancel();
    });
}
