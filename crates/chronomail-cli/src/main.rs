//! ChronoMail: deferred email delivery over HTTP.
//!
//! `chronomail serve` runs the API together with the background dispatcher;
//! `chronomail send` delivers one message immediately and exits.

mod api;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chronomail_core::app::{App, AppBuilder};
use chronomail_core::domain::SendRequest;
use chronomail_core::impls::{InMemoryScheduleStore, LogMailTransport, SmtpMailTransport};
use chronomail_core::ports::{Clock, MailTransport, ScheduleStore, SystemClock};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::{AppConfig, Overrides, TransportKind};

/// ChronoMail - schedule emails for later delivery.
#[derive(Parser)]
#[command(name = "chronomail", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, short, env = "CHRONOMAIL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Mail transport, overriding the file.
    #[arg(long, env = "CHRONOMAIL_TRANSPORT", global = true, value_enum)]
    transport: Option<TransportKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and run the dispatcher until Ctrl-C.
    Serve {
        /// HTTP listen address.
        #[arg(long, env = "CHRONOMAIL_LISTEN")]
        listen: Option<String>,

        /// JSON snapshot file for schedules.
        #[arg(long, env = "CHRONOMAIL_SNAPSHOT")]
        snapshot: Option<PathBuf>,

        /// Seconds between dispatch cycles.
        #[arg(long, env = "CHRONOMAIL_INTERVAL_SECS")]
        interval_secs: Option<u64>,
    },

    /// Send one email right away.
    Send {
        #[arg(long)]
        to: String,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "chronomail=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            listen,
            snapshot,
            interval_secs,
        } => {
            Overrides {
                transport: cli.transport,
                listen,
                snapshot_path: snapshot,
                interval_secs,
            }
            .apply(&mut config);
            config.validate()?;
            serve(config).await
        }
        Command::Send { to, subject, body } => {
            Overrides {
                transport: cli.transport,
                ..Default::default()
            }
            .apply(&mut config);
            config.validate()?;

            let app = build_app(&config, Arc::new(SystemClock)).await?;
            app.service
                .send_immediate(SendRequest {
                    receivers_mail: to,
                    subject,
                    body,
                })
                .await
                .context("failed to send email")?;
            info!("email sent");
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let app = build_app(&config, Arc::clone(&clock)).await?;

    let dispatcher = app.dispatcher.clone().spawn();

    let router = api::create_router(Arc::new(AppState {
        service: app.service.clone(),
        clock,
    }));
    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.server.listen))?;

    info!(
        listen = %config.server.listen,
        transport = ?config.transport,
        interval_secs = config.dispatcher.interval_secs,
        "chronomail started"
    );

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("shutting down dispatcher");
    dispatcher.shutdown_and_join().await;
    served.context("http server failed")
}

async fn build_app(config: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<App> {
    let transport: Arc<dyn MailTransport> = match config.transport {
        TransportKind::Smtp => Arc::new(
            SmtpMailTransport::new(&config.smtp).context("failed to configure smtp transport")?,
        ),
        TransportKind::Log => Arc::new(LogMailTransport),
    };

    let store: Arc<dyn ScheduleStore> = match &config.store.snapshot_path {
        Some(path) => Arc::new(
            InMemoryScheduleStore::open(path, Arc::clone(&clock))
                .await
                .with_context(|| format!("failed to open snapshot {}", path.display()))?,
        ),
        None => Arc::new(InMemoryScheduleStore::new(Arc::clone(&clock))),
    };

    let app = AppBuilder::new(transport)
        .store(store)
        .clock(clock)
        .dispatcher_config(config.dispatcher.clone())
        .build()?;
    Ok(app)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received");
}
