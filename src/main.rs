// Yoga GPT command line entry point

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yoga_gpt::services::assistant::{create_sequence, pose_image_url};
use yoga_gpt::services::export::{export_to_file, ExportFormat};
use yoga_gpt::storage::ConfigService;
use yoga_gpt::{AppConfig, AppState, Session, SettingsUpdate, TurnOutcome, YogaStyle};

#[derive(Parser)]
#[command(name = "yoga-gpt")]
#[command(about = "Yoga assistant answering from your own library of yoga texts", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the JSON config file (default: ~/.yoga-gpt/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OpenAI API key
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, or load it if one is persisted
    Index {
        /// Re-ingest the corpus even if an index exists
        #[arg(long)]
        rebuild: bool,
    },

    /// Interactive chat
    Chat {
        /// Yoga style for generated sequences
        #[arg(long)]
        style: Option<YogaStyle>,

        /// Do not append Yoga Journal links
        #[arg(long)]
        no_images: bool,

        /// Re-ingest the corpus before chatting
        #[arg(long)]
        rebuild: bool,
    },

    /// Ask a single question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Yoga style for generated sequences
        #[arg(long)]
        style: Option<YogaStyle>,
    },

    /// Build a timed sequence without calling any model
    Sequence {
        /// hatha, yin or vinyasa
        #[arg(short, long, default_value = "hatha")]
        style: YogaStyle,

        /// Sequence title
        #[arg(short, long)]
        name: Option<String>,

        /// Print the JSON payload instead of markdown
        #[arg(long)]
        json: bool,

        /// Pose names
        #[arg(required = true)]
        poses: Vec<String>,
    },

    /// Print the Yoga Journal URL for a pose
    PoseImage {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Show or change the saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file path and its contents
    Show,

    /// Change one or more settings
    Set {
        #[arg(long)]
        corpus_dir: Option<PathBuf>,

        #[arg(long)]
        index_dir: Option<PathBuf>,

        #[arg(long)]
        chat_model: Option<String>,

        /// Chunks retrieved per pose
        #[arg(long)]
        top_k: Option<usize>,

        /// Default style for new sessions
        #[arg(long)]
        style: Option<YogaStyle>,

        /// Append Yoga Journal links (true/false)
        #[arg(long)]
        images: Option<bool>,
    },

    /// Restore the defaults
    Reset,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "yoga_gpt=debug,yoga_gpt_llm=debug" } else { "yoga_gpt=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Sequence {
            style,
            name,
            json,
            poses,
        } => {
            let sequence = create_sequence(name.as_deref(), poses, *style);
            if *json {
                println!("{}", serde_json::to_string_pretty(&sequence)?);
            } else {
                println!("{}", sequence.to_markdown());
            }
            return Ok(());
        }
        Commands::PoseImage { name } => {
            println!("{}", pose_image_url(&name.join(" ")));
            return Ok(());
        }
        _ => {}
    }

    let config = match &cli.config {
        Some(path) => ConfigService::open(path.clone()),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;
    let mut state = AppState::new(config, cli.api_key.clone());

    match cli.command {
        Commands::Index { rebuild } => {
            let embedder = state.embedding_provider()?;
            let index = state.open_index(embedder, rebuild).await?;
            println!(
                "Index ready: {} chunks, dimension {}, built {}",
                index.len(),
                index.dimension(),
                index.manifest().built_at
            );
        }
        Commands::Ask { question, style } => {
            let mut session = state.new_session(false).await?;
            if let Some(style) = style {
                session.set_style(style);
            }
            match session.submit(&question.join(" ")).await {
                TurnOutcome::Replied(reply) => println!("{}", reply),
                TurnOutcome::RateLimited { message, .. } => eprintln!("{}", message),
                TurnOutcome::Ignored => {}
            }
        }
        Commands::Chat {
            style,
            no_images,
            rebuild,
        } => {
            let mut session = state.new_session(rebuild).await?;
            if let Some(style) = style {
                session.set_style(style);
            }
            if no_images {
                session.set_show_images(false);
            }
            run_repl(&mut state, &mut session).await?;
        }
        Commands::Config { action } => run_config(&mut state, action)?,
        Commands::Sequence { .. } | Commands::PoseImage { .. } => {}
    }

    Ok(())
}

fn print_config(path: &Path, config: &AppConfig) -> Result<()> {
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn run_config(state: &mut AppState, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {}
        ConfigAction::Set {
            corpus_dir,
            index_dir,
            chat_model,
            top_k,
            style,
            images,
        } => {
            state
                .update_settings(SettingsUpdate {
                    corpus_dir,
                    index_dir,
                    chat_model,
                    top_k,
                    default_style: style,
                    show_images: images,
                })
                .context("failed to save settings")?;
        }
        ConfigAction::Reset => {
            state.reset_settings().context("failed to reset settings")?;
        }
    }
    print_config(state.config_path(), state.config())
}

const REPL_HELP: &str = "Commands: /style <hatha|yin|vinyasa>, /images <on|off>, \
/export <txt|json|csv|pdf> <path>, /clear, /quit";

async fn run_repl(state: &mut AppState, session: &mut Session) -> Result<()> {
    println!("Yoga GPT. Ask about poses or request a sequence.");
    println!("{}", REPL_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(state, session, command) {
                break;
            }
            continue;
        }

        match session.submit(line).await {
            TurnOutcome::Replied(reply) => println!("\nYoga GPT: {}", reply),
            TurnOutcome::RateLimited { message, .. } => println!("{}", message),
            TurnOutcome::Ignored => {}
        }
    }
    Ok(())
}

/// Save a REPL preference as the default for later sessions.
fn persist(state: &mut AppState, update: SettingsUpdate) {
    if let Err(e) = state.update_settings(update) {
        println!("Could not save setting: {}", e);
    }
}

/// Run a slash command. Returns `false` to leave the REPL.
fn handle_command(state: &mut AppState, session: &mut Session, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit"), _) => return false,
        (Some("clear"), _) => {
            session.clear();
            println!("Conversation cleared.");
        }
        (Some("style"), Some(value)) => match value.parse::<YogaStyle>() {
            Ok(style) => {
                session.set_style(style);
                persist(
                    state,
                    SettingsUpdate {
                        default_style: Some(style),
                        ..Default::default()
                    },
                );
                println!("Style set to {}.", style.label());
            }
            Err(e) => println!("{}", e),
        },
        (Some("images"), Some(value)) => {
            let show = match value {
                "on" => true,
                "off" => false,
                _ => {
                    println!("Use /images on or /images off.");
                    return true;
                }
            };
            session.set_show_images(show);
            persist(
                state,
                SettingsUpdate {
                    show_images: Some(show),
                    ..Default::default()
                },
            );
        }
        (Some("export"), Some(format)) => {
            let Some(path) = parts.next() else {
                println!("Usage: /export <txt|json|csv|pdf> <path>");
                return true;
            };
            let result = format
                .parse::<ExportFormat>()
                .and_then(|f| export_to_file(session.history(), f, Path::new(path)));
            match result {
                Ok(()) => println!("Saved {} messages to {}.", session.history().len(), path),
                Err(e) => println!("Export failed: {}", e),
            }
        }
        _ => println!("{}", REPL_HELP),
    }
    true
}
