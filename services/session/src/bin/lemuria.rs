//! services/session/src/bin/lemuria.rs

use session_lib::{
    adapters::{CannedAssistant, TokioScheduler},
    app::{run, Session},
    config::Config,
    error::SessionError,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Starting session...");

    // --- 2. Initialize Adapters ---
    let scheduler = Arc::new(TokioScheduler::new());
    let assistant = Arc::new(CannedAssistant::new());

    // --- 3. Drive the Session over stdin/stdout ---
    let session = Session::new(config, scheduler, assistant);
    run(session, tokio::io::stdin(), tokio::io::stdout()).await?;

    info!("Session finished.");
    Ok(())
}
