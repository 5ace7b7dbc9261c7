use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sitepm_core::{classify, format_reply, Config, RenderableMessage};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod app;
mod handler;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "sitepm")]
#[command(version, about = "Chat with an AI construction project manager")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to <config dir>/sitepm/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State file holding the API key and conversation history
    #[arg(long, global = true, env = "SITEPM_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (the default)
    Chat {
        /// Keep an HTML transcript of the conversation at this path
        #[arg(short, long)]
        transcript: Option<PathBuf>,
    },
    /// Ask a single question and print the reply
    Ask {
        /// Your question
        question: String,
        /// Print the rendered HTML fragment instead of the raw reply
        #[arg(long)]
        html: bool,
    },
    /// Format reply text read from stdin into HTML
    Format,
    /// Show which topic a message would be filed under
    Intent {
        text: String,
    },
    /// Store an OpenRouter API key
    SetKey {
        key: String,
    },
    /// Remove the stored API key
    ResetKey,
    /// Erase the stored conversation history
    Clear,
    /// Print the stored conversation history
    History {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the effective config, or change and save it
    Config {
        /// Default model to use
        #[arg(long)]
        model: Option<String>,
        /// Number of history messages sent with each request
        #[arg(long)]
        context_window: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default config");
            Config::new()
        }),
    };

    match cli.command.unwrap_or(Commands::Chat { transcript: None }) {
        Commands::Chat { transcript } => {
            let mut app = App::new(&config, cli.state)?;
            if let Some(path) = transcript {
                app = app.with_transcript(path, &config.site_name);
            }
            app.run_chat().await?;
        }
        Commands::Ask { question, html } => {
            let mut app = App::new(&config, cli.state)?;
            let reply = app.ask(&question).await;
            if html {
                println!("{}", reply.to_html());
            } else {
                println!("{}", reply.text());
            }
            if matches!(reply, RenderableMessage::Error(_)) {
                std::process::exit(1);
            }
        }
        Commands::Format => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            println!("{}", format_reply(&input));
        }
        Commands::Intent { text } => {
            let intent = classify(&text);
            println!("{} ({})", intent.display_name(), intent);
        }
        Commands::SetKey { key } => {
            let mut app = App::new(&config, cli.state)?;
            println!("{}", app.set_key(&key).text());
        }
        Commands::ResetKey => {
            let mut app = App::new(&config, cli.state)?;
            println!("{}", app.reset_key().text());
        }
        Commands::Clear => {
            let mut app = App::new(&config, cli.state)?;
            app.clear()?;
            println!("Conversation history cleared.");
        }
        Commands::History { json } => {
            let app = App::new(&config, cli.state)?;
            if json {
                println!("{}", serde_json::to_string_pretty(app.history())?);
            } else if app.history().is_empty() {
                println!("No conversation history.");
            } else {
                for msg in app.history() {
                    println!("{}: {}\n", msg.role.as_str(), msg.content);
                }
            }
        }
        Commands::Config {
            model,
            context_window,
        } => {
            if model.is_none() && context_window.is_none() {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }
            if let Some(model) = model {
                config.model = model;
            }
            if let Some(limit) = context_window {
                config.context_window = limit;
            }
            match &cli.config {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("Config saved.");
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
