mod check_cmd;
mod config;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use stardeck_gateway::{build_router, start_server, DeckWatcher, Presentation, PresentationOptions};
use stardeck_logging::init_logger;
use stardeck_markdown::{load_deck, ParseOptions};

use config::ServeSettings;
use terminal_output::{note_info, note_success, paint, BOLD};

#[derive(Parser)]
#[command(name = "stardeck")]
#[command(about = "StarDeck: markdown slides with click reveals and live presenter sync")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a deck to an audience with a synchronized presenter
    Serve(ServeArgs),
    /// Parse a deck and report slides, steps and markup problems
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Deck markdown file
    pub slides: PathBuf,
    /// Port to bind the HTTP server to
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,
    /// Emit motion descriptors instead of CSS reveal classes
    #[arg(long)]
    pub motion: bool,
    /// Reload the deck when the file changes
    #[arg(short, long)]
    pub watch: bool,
    /// Presenter token (generated when neither this nor the config sets one)
    #[arg(long)]
    pub token: Option<String>,
    /// Config file (defaults to stardeck.yaml in the config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Deck markdown file
    pub slides: PathBuf,
    /// Exit non-zero when any markup problem is found
    #[arg(long)]
    pub strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Check(args) => check_cmd::run(&args),
    }
}

async fn serve(args: ServeArgs) -> Result<ExitCode> {
    let config_path = stardeck_config::resolve_config_path(args.config.as_deref());
    let file_config = stardeck_config::load_and_prepare(&config_path).await?;
    let settings = ServeSettings::merge(&file_config, &args)?;

    init_logger(&settings.log);
    // Validation ran before the subscriber existed; repeat it so warnings are seen.
    stardeck_config::check(&file_config)?;

    let options = ParseOptions { mode: settings.mode };
    let deck = load_deck(&args.slides, options)
        .with_context(|| format!("Failed to load deck {}", args.slides.display()))?;
    info!(
        title = %deck.config.title,
        slides = deck.len(),
        diagnostics = deck.diagnostics().count(),
        mode = ?settings.mode,
        "Deck loaded"
    );

    let presentation = Presentation::new(
        deck,
        settings.token.clone(),
        PresentationOptions {
            subscriber_buffer: settings.subscriber_buffer,
            reload_policy: settings.reload_policy,
        },
    );

    if args.watch {
        DeckWatcher::new(&args.slides, options, presentation.clone()).watch()?;
    }

    let assets = match args.slides.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let app = build_router(presentation, Some(assets));

    let bind = format!("{}:{}", settings.host, settings.port);
    let addr = tokio::net::lookup_host(&bind)
        .await
        .with_context(|| format!("Invalid bind address {bind}"))?
        .next()
        .with_context(|| format!("No address found for {bind}"))?;

    print_banner(&settings, &bind);
    start_server(addr, app).await?;
    Ok(ExitCode::SUCCESS)
}

fn print_banner(settings: &ServeSettings, bind: &str) {
    println!();
    note_success(&format!("{} on http://{bind}", paint(BOLD, "StarDeck")));
    note_info(&format!("Audience:  ws://{bind}/api/ws  (SSE: http://{bind}/api/events)"));
    note_info(&format!(
        "Presenter: ws://{bind}/api/ws?token={}",
        settings.token.as_str()
    ));
    if settings.token_generated {
        note_info("Presenter token generated for this session; set presenter.token to keep it stable");
    }
    println!();
}
