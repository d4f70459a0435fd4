//! `MeshChat`: line-based shell over the mesh chat command layer.
//!
//! Reads lines from stdin. A line ending in a tab lists completions for the
//! text before it; anything else is submitted as a message or command.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/meshchat/config.toml`).
//!
//! ```bash
//! cargo run --bin meshchat -- --nickname alice
//!
//! # Start in a location chat
//! cargo run --bin meshchat -- --nickname alice --geohash u4pruy
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use meshchat::app::App;
use meshchat::config::{CliArgs, ClientConfig};
use meshchat_core::outbound::OutboundRequest;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with the chat output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(nickname = %config.nickname, "meshchat starting");

    let (mut app, outbound) = App::new(&config);
    app.seed_demo();
    tokio::spawn(drain_outbound(outbound));

    let result = run_app(&mut app).await;

    tracing::info!("meshchat exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("meshchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Stands in for the mesh and relay transports: logs every request.
async fn drain_outbound(mut outbound: mpsc::Receiver<OutboundRequest>) {
    while let Some(request) = outbound.recv().await {
        tracing::info!(
            id = %request.id,
            scope = ?request.scope,
            targets = request.targets.len(),
            nostr = request.is_nostr(),
            "outbound request (offline)"
        );
    }
}

/// Reads stdin line by line until EOF or `/quit`.
async fn run_app(app: &mut App) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    write_lines(&mut stdout, &["end a line with tab to list completions, /quit to exit".to_string()]).await?;
    write_lines(&mut stdout, &app.render_new()).await?;
    loop {
        stdout.write_all(app.prompt().as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }

        let output = app.handle_line(&line);
        write_lines(&mut stdout, &output).await?;
    }
    Ok(())
}

async fn write_lines(stdout: &mut tokio::io::Stdout, lines: &[String]) -> io::Result<()> {
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await
}
