use std::{future::IntoFuture, process, sync::Arc};

use texforge::{
    application::compile::{CompileOptions, CompileService, DocumentCompiler},
    config,
    infra::{
        artifacts::ArtifactStore,
        compiler::ProcessCompiler,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| InfraError::configuration(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), InfraError> {
    let compiler = ProcessCompiler::new(settings.compiler.program.clone());
    let program = compiler.program();
    let compile_service = CompileService::new(
        Arc::new(compiler),
        CompileOptions::from(&settings.compiler),
    );
    let artifacts = ArtifactStore::new(settings.artifacts.directory.clone())?;

    let state = AppState {
        compiler: Arc::new(compile_service),
        artifacts: Arc::new(artifacts),
        public_base_url: settings.artifacts.public_base_url.clone(),
    };
    let max_request_bytes = usize::try_from(settings.server.max_request_bytes.get())
        .map_err(|_| InfraError::configuration("server.max_request_bytes exceeds usize"))?;
    let router = http::build_router(state, max_request_bytes);

    let listener = tokio::net::TcpListener::bind(settings.server.addr).await?;
    info!(
        addr = %settings.server.addr,
        compiler = %program,
        timeout_secs = settings.compiler.timeout.as_secs(),
        artifacts = %settings.artifacts.directory.display(),
        max_concurrency = settings.compiler.max_concurrency.map(|limit| limit.get()),
        "texforge listening"
    );

    if settings.artifacts.public_base_url.is_none() {
        warn!(
            "artifacts.public_base_url is unset; download links are built from the request Host header"
        );
    }

    let shutdown = Arc::new(Notify::new());
    let shutdown_started = shutdown.notified();
    let server = {
        let shutdown = Arc::clone(&shutdown);
        axum::serve(listener, router.into_make_service()).with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received; draining in-flight compilations");
            shutdown.notify_waiters();
        })
    };

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server.into_future() => result.map_err(|err| InfraError::server(err.to_string())),
        _ = async {
            shutdown_started.await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out; exiting");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
