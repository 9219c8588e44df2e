use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use insight::app::App;
use insight::config::{Config, Settings};
use insight::tui::{self, EventHandler, Tui, TICK_RATE};
use insight::{handler, logging, ui, Conversation, InsightClient};

#[derive(Parser)]
#[command(name = "insight")]
#[command(version, about = "Ask investment questions to a chat inference endpoint")]
struct Cli {
    /// Chat endpoint receiving {"prompt": ...} and answering {"reply": ...}
    #[arg(long, env = "API_URL", global = true)]
    api_url: Option<String>,

    /// Start with the light theme
    #[arg(long, global = true)]
    light: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the exchange
    Ask {
        /// Your question
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env may provide API_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let _log_guard = match logging::log_dir().and_then(|dir| logging::init(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {:#}", e);
            None
        }
    };

    let config = Config::load().context("Failed to load configuration")?;
    let settings = config.resolve(cli.api_url.as_deref(), cli.light);
    info!(api_url = %settings.api_url, theme = settings.theme.as_str(), "starting");

    match cli.command {
        Some(Commands::Ask { question }) => ask_once(&settings, question).await,
        None => {
            run_tui(&settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn ask_once(settings: &Settings, question: String) -> Result<ExitCode> {
    let client = InsightClient::new(&settings.api_url);
    let mut conversation = Conversation::new();
    conversation.on_input_change(question);

    let Some(succeeded) = conversation.submit(&client).await else {
        // Blank question: nothing to send
        return Ok(ExitCode::SUCCESS);
    };

    for message in conversation.log() {
        println!("{}: {}\n", message.sender().display_name(), message.text());
    }

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run_tui(settings: &Settings) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(settings);
    let mut events = EventHandler::new(TICK_RATE);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if app.conversation.is_submitting() {
        warn!("exiting with a request still in flight");
    }
    info!(messages = app.conversation.log().len(), "session ended");
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}
