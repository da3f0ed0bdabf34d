//! Minimal streaming client: connect, print the server and its catalog, then
//! print every frame until interrupted or the source ends.
//!
//! Configuration comes from `$MOCAP_CLIENT_CONFIG`, `./mocap-client.yaml`, or
//! defaults (an in-process simulated server). Logs go to stderr; `RUST_LOG`
//! overrides the configured filter.
//!
//! Exit code 0 on a clean shutdown, 1 when connecting, fetching the catalog,
//! or loading the configuration fails.

use anyhow::Context;
use futures::StreamExt;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mocap_client::{ClientConfig, ClientError, Session, ThrottleExt, render};

/// How often to check whether a finite source has run dry.
const FINISH_POLL: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> ExitCode {
    let loaded = ClientConfig::from_env();

    let log_filter = loaded.as_ref().map_or("info", |(config, _)| config.log_filter.as_str());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let config = match loaded {
        Ok((config, source)) => {
            match source {
                Some(path) => info!(path = %path.display(), "Using configuration file"),
                None => info!("Using default configuration"),
            }
            config
        }
        Err(error) => {
            report(&anyhow::Error::new(error));
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let backend = config.build_backend().context("Failed to create streaming backend")?;
    let mut session = Session::new(backend, config.session.clone());
    // Queue frames from the first one delivered; printing starts after the catalog.
    let frames = session.subscribe(None)?;

    let server = session.connect(config.connection.clone()).await?;
    emit(&render::server_description(&server))?;
    if let Some(params) = session.connection_params() {
        emit(&render::connection(params, &server))?;
    }

    let catalog = session.fetch_catalog().await?;
    if config.output.print_catalog {
        emit(&render::catalog(&catalog))?;
    }

    emit("\nClient is connected and listening for data...\n")?;
    let mut frames = frames.throttle_rate(config.output.update_rate, session.frame_rate());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut finish_poll = tokio::time::interval(FINISH_POLL);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
            frame = frames.next() => match frame {
                Some(frame) if config.output.print_frames => emit(&render::frame(&frame))?,
                Some(_) => {}
                None => break,
            },
            _ = finish_poll.tick() => {
                if session.source_finished() {
                    info!("Source finished");
                    // Closing the subscription ends the stream once queued frames are read.
                    session.unsubscribe();
                    while let Some(frame) = frames.next().await {
                        if config.output.print_frames {
                            emit(&render::frame(&frame))?;
                        }
                    }
                    break;
                }
            }
        }
    }

    session.disconnect().await;
    let stats = session.stats();
    info!(
        delivered = stats.delivered,
        dropped = stats.dropped,
        faulted = stats.faulted,
        coalesced = frames.coalesced(),
        "Client stopped"
    );
    Ok(())
}

fn emit(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()
}

/// Print a fatal error with its operation and code, plus recovery hints.
fn report(error: &anyhow::Error) {
    match error.chain().find_map(|cause| cause.downcast_ref::<ClientError>()) {
        Some(client_error) => {
            eprintln!("{error:#}");
            eprintln!(
                "Operation: {}. Error code: {}. Exiting.",
                client_error.operation(),
                client_error.code()
            );
            for suggestion in client_error.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
        }
        None => {
            warn!("Unclassified failure");
            eprintln!("{error:#}");
        }
    }
}
