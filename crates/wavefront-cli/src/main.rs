use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tokio::io::BufReader;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wavefront_core::{Document, TrimPolicy, WavefrontEngine, WavefrontSnapshot, WrapLayout};

mod config;
mod fence;
mod render;
mod repl;
mod transformer;

use config::{CliConfig, LINE_HEIGHT};
use repl::Session;
use transformer::TransformerKind;

#[derive(Parser)]
#[command(version, about = "Wavefront - type ahead while a rewriter catches up behind you", long_about = None)]
struct Cli {
    /// Text file to start from (read only, never written back)
    file: Option<PathBuf>,

    /// Path to config file
    #[arg(long, env = "WAVEFRONT_CONFIG")]
    config: Option<PathBuf>,

    /// Which rewriter to run on committed spans
    #[arg(long, value_enum)]
    transformer: Option<TransformerKind>,

    /// Shell command for the `command` transformer
    #[arg(long)]
    command: Option<String>,

    /// Wrap spans in the fenced prompt and extract the fenced answer
    #[arg(long)]
    fenced: bool,

    /// Delay of the built-in transformers, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Terminal columns used for wrapping
    #[arg(long)]
    columns: Option<usize>,

    /// Whitespace handling for the payload: preserve, trim or trim-end
    #[arg(long)]
    trim: Option<TrimPolicy>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_miette()?;
    init_tracing();

    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(kind) = cli.transformer {
        config.transformer = kind;
    }
    if let Some(command) = cli.command {
        config.command = Some(command);
    }
    if cli.fenced {
        config.fenced = true;
    }
    if let Some(ms) = cli.delay_ms {
        config.delay = Duration::from_millis(ms);
    }
    if let Some(columns) = cli.columns {
        config.columns = columns.max(1);
    }
    if let Some(trim) = cli.trim {
        config.engine.trim = trim;
    }

    let document = match &cli.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .into_diagnostic()
                .map_err(|e| e.wrap_err(format!("reading {}", path.display())))?;
            Document::from_text(&text)
        }
        None => Document::new(),
    };
    let engine = WavefrontEngine::with_config(
        document,
        WrapLayout::new(config.columns, LINE_HEIGHT),
        config.engine.clone(),
    )?;
    let transformer = config.transformer()?;
    tracing::info!(
        transformer = ?config.transformer,
        columns = config.columns,
        trim = ?config.engine.trim,
        "session started"
    );

    let watcher = tokio::spawn(log_wavefront(engine.subscribe()));

    let mut session = Session::new(engine, transformer);
    let mut stdout = std::io::stdout();
    writeln!(stdout, "type text, :commit to rewrite, :help for commands").into_diagnostic()?;
    session
        .run(BufReader::new(tokio::io::stdin()), &mut stdout)
        .await?;

    write!(stdout, "{}", render::render(session.engine())).into_diagnostic()?;
    drop(session);
    // The sender lives in the engine; dropping the session ends the watcher.
    join_watcher(watcher).await;
    Ok(())
}

/// Log every published snapshot until the engine goes away.
async fn log_wavefront(mut updates: watch::Receiver<WavefrontSnapshot>) {
    while updates.changed().await.is_ok() {
        let snapshot = *updates.borrow_and_update();
        tracing::debug!(
            phase = ?snapshot.phase,
            frontier_y = snapshot.state.frontier_visual_y,
            cursor_y = snapshot.state.cursor_visual_y,
            pending = ?snapshot.pending,
            "wavefront moved"
        );
    }
}

/// Wait for the watcher. Returns whether it ended cleanly.
async fn join_watcher(watcher: JoinHandle<()>) -> bool {
    match watcher.await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(error = %err, "wavefront watcher task failed");
            false
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wavefront=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .map_err(|_| miette::miette!("couldn't set the miette hook"))?;
    miette::set_panic_hook();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watcher_ends_with_engine() {
        let mut engine = WavefrontEngine::new(Document::new(), WrapLayout::default());
        let watcher = tokio::spawn(log_wavefront(engine.subscribe()));
        engine.type_text("hi").unwrap();
        drop(engine);
        assert!(join_watcher(watcher).await);
    }

    #[tokio::test]
    async fn test_failed_watcher_is_reported() {
        let watcher = tokio::spawn(std::future::pending::<()>());
        watcher.abort();
        assert!(!join_watcher(watcher).await);
    }
}
