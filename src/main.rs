use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use mclaunchd::config::Config;
use mclaunchd::container::{LifecycleEvent, LifecycleManager, LifecycleSettings};
use mclaunchd::daemon;
use mclaunchd::engine::{DockerEngine, Engine};
use mclaunchd::router;
use mclaunchd::websocket::{EventHub, LogBroadcaster, WebSocketState};

#[derive(Parser)]
#[command(name = "mclaunchd")]
#[command(about = "Minecraft server launcher daemon", long_about = None)]
struct Cli {
    /// Verbose logging
    #[arg(long = "dev")]
    dev: bool,

    #[arg(long = "config", default_value = "config.json")]
    config: PathBuf,

    /// Print the server container status and exit
    #[arg(long = "status")]
    status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.dev {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let engine: Arc<dyn Engine> = Arc::new(
        DockerEngine::connect(&config.docker).context("Failed to set up container engine client")?,
    );

    let event_hub = Arc::new(EventHub::new());
    let console = Arc::new(LogBroadcaster::new(
        engine.clone(),
        event_hub.clone(),
        config.minecraft.log_tail,
    ));
    let (lifecycle, mut lifecycle_rx) = LifecycleManager::spawn(
        engine.clone(),
        console,
        event_hub.clone(),
        LifecycleSettings::from(&config.minecraft),
    );

    if cli.status {
        let report = lifecycle.status().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        lifecycle.shutdown().await;
        return Ok(());
    }

    daemon::start::print_banner(&config);
    daemon::start::ping_engine(engine.as_ref()).await;

    tokio::spawn(async move {
        while let Some(event) = lifecycle_rx.recv().await {
            match &event {
                LifecycleEvent::Error(name, msg) => {
                    tracing::error!("Container {} error: {}", name, msg);
                }
                _ => tracing::info!("Container lifecycle event: {:?}", event),
            }
        }
    });

    daemon::start::adopt_running(&lifecycle).await;

    let app = router::app(lifecycle.clone(), WebSocketState { event_hub });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    // Don't leave the engine-side log connection open behind us
    lifecycle.shutdown().await;
    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
