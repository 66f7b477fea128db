use std::future::Future;
use std::time::Duration;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http;
use crate::{ServiceConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// How long in-flight directory requests get after SIGTERM.
const REQUEST_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to set up service state: {0}")]
    State(#[from] crate::StateSetupError),
    #[error("failed to install signal handlers: {0}")]
    Signals(#[from] std::io::Error),
    #[error("API server stopped unexpectedly")]
    ServerStopped,
    #[error("failed to shut down within {} seconds", FINAL_SHUTDOWN_TIMEOUT.as_secs())]
    ShutdownTimeout,
}

/// Why the server is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupt,
    Terminate,
}

struct StopSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl StopSignals {
    /// Registers the handlers before any work starts so an early signal is not lost.
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn wait(self) -> StopReason {
        let Self {
            mut interrupt,
            mut terminate,
        } = self;
        wait_for_stop(
            async move { interrupt.recv().await },
            async move { terminate.recv().await },
            REQUEST_GRACE_PERIOD,
        )
        .await
    }
}

/// Resolves on the first of the two triggers. A terminate request waits out
/// `grace` first; an interrupt stops right away.
async fn wait_for_stop<I, T>(interrupt: I, terminate: T, grace: Duration) -> StopReason
where
    I: Future,
    T: Future,
{
    tokio::select! {
        _ = interrupt => {
            tracing::debug!("stopping immediately on SIGINT");
            StopReason::Interrupt
        }
        _ = terminate => {
            tracing::debug!(grace_secs = grace.as_secs(), "stopping after grace period on SIGTERM");
            tokio::time::sleep(grace).await;
            StopReason::Terminate
        }
    }
}

fn install_logging(service_config: &ServiceConfig) -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => tracing::error!(
            message = %panic,
            panic.file = loc.file(),
            panic.line = loc.line(),
        ),
        None => tracing::error!(message = %panic),
    }));

    guard
}

/// Installs logging, builds the state and serves the API until SIGINT or
/// SIGTERM.
pub async fn spawn_service(service_config: &ServiceConfig) -> Result<(), ServiceError> {
    let _guard = install_logging(service_config);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %service_config.listen_addr(),
        persistent = service_config.sqlite_path.is_some(),
        request_timeout_ms = service_config.request_timeout.as_millis() as u64,
        "directory server starting up"
    );

    let signals = StopSignals::install()?;

    let state = ServiceState::from_config(service_config)
        .await
        .inspect_err(|e| tracing::error!("error creating server state: {}", e))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let api_listen_addr = service_config.listen_addr();
    let api_config = http::Config::new(api_listen_addr, service_config.log_level);
    let mut api_handle = tokio::spawn(async move {
        if let Err(e) = http::run_api(api_config, state, shutdown_rx).await {
            tracing::error!("API server error: {}", e);
        }
    });

    tokio::select! {
        reason = signals.wait() => {
            tracing::info!(?reason, "shutting down");
        }
        _ = &mut api_handle => {
            return Err(ServiceError::ServerStopped);
        }
    }

    let _ = shutdown_tx.send(());
    if timeout(FINAL_SHUTDOWN_TIMEOUT, api_handle).await.is_err() {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        return Err(ServiceError::ShutdownTimeout);
    }
    Ok(())
}
