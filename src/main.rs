// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Predictor: image upload & classification widget
//!
//! Drives the headless upload widget from the terminal: pick files, drop
//! files, or watch a drop folder, and print what the result list shows.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use predictor::client::PredictClient;
use predictor::config::{AppConfig, RacePolicy};
use predictor::prediction::SelectedFile;
use predictor::reactor::{Reactor, WidgetEvent};
use predictor::render;
use predictor::watcher::{deliver, DropFolder, FolderEvent};
use predictor::widget::view::TerminalView;
use predictor::widget::{UploadWidget, WidgetContext};
use predictor::{PredictorError, Result};

/// Predictor CLI - upload images to a classifier and show its predictions
#[derive(Parser, Debug)]
#[command(name = "predictor")]
#[command(version)]
#[command(about = "Upload images to a prediction server and show the results", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Prediction server base URL (overrides config)
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Discard responses to superseded requests
    #[arg(long, global = true)]
    discard_stale: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for the result list
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "html", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select files one after another, as in the file picker
    Predict {
        /// Image files to select, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Drop files onto the widget in one gesture (only the first is used)
    Drop {
        /// Files carried by the drop
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Use a directory as the drop zone
    Watch {
        /// Directory to watch (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Check that the prediction server is reachable
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(server) = cli.server {
        config.server.url = server;
        config.validate()?;
    }
    if cli.discard_stale {
        config.widget.race_policy = RacePolicy::LatestRequestWins;
    }

    match cli.command {
        Commands::Predict { files } => run_predict(config, files, &cli.format).await,
        Commands::Drop { files } => run_drop(config, files, &cli.format).await,
        Commands::Watch { dir } => run_watch(config, dir).await,
        Commands::Status => run_status(config).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

fn build_reactor(config: &AppConfig) -> Result<(Reactor, TerminalView)> {
    let view = TerminalView::new();
    let widget = UploadWidget::new(WidgetContext::from_view(&view), config.widget.clone());
    let client = PredictClient::new(&config.server)?;
    info!("Prediction endpoint: {}", client.endpoint());
    Ok((Reactor::new(widget, Arc::new(client)), view))
}

async fn load_files(paths: &[PathBuf]) -> Result<Vec<SelectedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(SelectedFile::from_path(path).await?);
    }
    Ok(files)
}

/// Print the final state of the result list
fn print_results(view: &TerminalView, format: &str) -> Result<()> {
    let snapshot = view.snapshot();
    match format {
        "html" => println!("{}", render::list_html(&snapshot.entries)),
        "json" => println!("{}", render::list_json(snapshot.preview.as_ref(), &snapshot.entries)?),
        _ => {
            if !snapshot.entries.is_empty() {
                println!("{}", render::list_text(&snapshot.entries));
            }
        }
    }
    Ok(())
}

/// Select each file in turn; later selections supersede earlier ones
async fn run_predict(config: AppConfig, paths: Vec<PathBuf>, format: &str) -> Result<()> {
    let files = load_files(&paths).await?;
    let (mut reactor, view) = build_reactor(&config)?;
    let handle = reactor.handle();

    for file in files {
        handle.post(WidgetEvent::FileSelected(Some(file)));
    }
    reactor.run_until_idle().await;

    print_results(&view, format)
}

/// Drop all files in one event
async fn run_drop(config: AppConfig, paths: Vec<PathBuf>, format: &str) -> Result<()> {
    if paths.len() > 1 {
        info!("Dropping {} files, only {:?} will be used", paths.len(), paths[0]);
    }
    let files = load_files(&paths).await?;
    let (mut reactor, view) = build_reactor(&config)?;

    reactor.handle().post(WidgetEvent::DragEnter);
    reactor.handle().post(WidgetEvent::Drop(files));
    reactor.run_until_idle().await;

    print_results(&view, format)
}

/// Run the drop-folder loop until Ctrl+C / SIGTERM
async fn run_watch(config: AppConfig, dir_override: Option<PathBuf>) -> Result<()> {
    let dir = dir_override.unwrap_or_else(|| PathBuf::from(&config.watch.dir));
    let stable_wait = Duration::from_secs(config.watch.stable_wait_secs);

    let (mut reactor, _view) = build_reactor(&config)?;
    let folder = DropFolder::new(&dir)?;

    // Setup graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = terminate => info!("Received SIGTERM, shutting down..."),
        }

        let _ = shutdown_tx.send(true);
    });

    // The notify receiver blocks, so poll it off the reactor thread
    let handle = reactor.handle();
    let runtime = tokio::runtime::Handle::current();
    let poll_shutdown = shutdown_rx.clone();
    let poller = tokio::task::spawn_blocking(move || {
        while !*poll_shutdown.borrow() {
            match folder.next_event(Duration::from_millis(100)) {
                Some(FolderEvent::FileArrived(path)) => {
                    let handle = handle.clone();
                    runtime.spawn(async move {
                        if let Err(e) = deliver(path.clone(), handle, stable_wait).await {
                            error!("Failed to drop {:?}: {}", path, e);
                        }
                    });
                }
                Some(FolderEvent::Error(e)) => warn!("Watch error: {}", e),
                None => {}
            }
        }
    });

    info!("Drop files into {:?}. Press Ctrl+C to stop.", dir);
    reactor.run(shutdown_rx).await;

    if let Err(e) = poller.await {
        warn!("Drop folder poller ended abnormally: {}", e);
    }

    info!("Predictor stopped.");
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    let client = PredictClient::new(&config.server)?;

    println!("Predictor Status");
    println!("================");
    println!("Server:   {}", config.server.url);
    println!("Endpoint: {}", client.endpoint());

    match client.health_check().await {
        Ok(()) => println!("Reachable: yes"),
        Err(e) => println!("Reachable: no - {}", e),
    }

    println!("Race policy: {:?}", config.widget.race_policy);
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            if output.exists() {
                return Err(PredictorError::Config(format!(
                    "{:?} already exists",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Endpoint: {}", config.server.endpoint());
            println!("  Timeout: {}s", config.server.timeout_secs);
            println!("  Drop folder: {}", config.watch.dir);
        }
    }

    Ok(())
}
