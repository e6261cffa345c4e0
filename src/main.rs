use kvpilot::discovery::bootstrap;
use kvpilot::App;
use kvpilot::Error;
use kvpilot::LogConfig;
use kvpilot::PilotConfig;
use kvpilot::Result;
use kvpilot::StopHandle;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

const LOG_FILE_NAME: &str = "kvpilot.log";

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = PilotConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.log)?;

    // Backends must be known before the backend name is resolved
    let registry = bootstrap();

    let app = App::build(&settings, &registry).map_err(|e| {
        error!("failed to build application: {}", e);
        e
    })?;
    info!(watches = app.watch_count(), "Application started. Waiting for CTRL+C signal...");

    // Listen on Shutdown Signal
    let stop = app.stop_handle();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(stop).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    if let Err(e) = app.run().await {
        error!("application stops: {:?}", e);
    }

    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(stop: StopHandle) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::Fatal(format!("failed to install SIGINT handler: {e}")))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::Fatal(format!("failed to install SIGTERM handler: {e}")))?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown started, waiting for in-flight cycles");
    stop.stop();
    Ok(())
}

/// Console logging plus, when `log.dir` is set, a non-blocking file writer.
/// The returned guard must live as long as the program.
pub fn init_observability(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));

    let console = tracing_subscriber::fmt::layer().with_filter(filter());

    let (file, guard) = match &log.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::Fatal(format!("failed to create log dir {}: {e}", dir.display())))?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(guard)
}
