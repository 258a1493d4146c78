use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use selah_notifier::{Dispatcher, HttpSmsGateway, NotifierConfig, ReminderScanner};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "selah_notifier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = NotifierConfig::from_env();
    tracing::info!(
        poll_interval_secs = config.poll_interval_secs,
        max_attempts = config.max_attempts,
        reminder_scan_interval_secs = config.reminder_scan_interval_secs,
        "Loaded notifier configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = selah_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    selah_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    selah_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- SMS gateway ---
    let gateway_url = config
        .sms_gateway_url
        .clone()
        .expect("SMS_GATEWAY_URL must be set");
    let messenger = Arc::new(HttpSmsGateway::new(
        gateway_url,
        config.sms_gateway_api_key.clone(),
        Duration::from_secs(config.send_timeout_secs),
    ));

    // --- Background services ---
    let cancel = CancellationToken::new();

    let dispatcher = Dispatcher::new(pool.clone(), messenger, &config);
    let dispatcher_cancel = cancel.clone();
    let dispatcher_handle = tokio::spawn(async move {
        dispatcher.run(dispatcher_cancel).await;
    });

    let scanner = ReminderScanner::new(pool.clone(), &config);
    let scanner_cancel = cancel.clone();
    let scanner_handle = tokio::spawn(async move {
        scanner.run(scanner_cancel).await;
    });

    tracing::info!("Notifier started (dispatcher, reminder scanner)");

    // --- Shutdown ---
    shutdown_signal().await;
    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), scanner_handle).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the worker shuts
/// down cleanly whether stopped interactively or by a process manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
