use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use video_interpreter::analysis::{AnalysisStyle, KnowledgeLevel, Language};
use video_interpreter::chapters::format_time;
use video_interpreter::export;
use video_interpreter::{Config, HistoryStore, JsonStore, PreferencesStore, Session};

#[derive(Parser)]
#[command(name = "video-interpreter")]
#[command(version, author = "TigreRoll")]
#[command(about = "Chapter-by-chapter video interpretation with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the standard search paths)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a video, detect its chapters and interpret them
    Interpret {
        /// Video URL (youtube.com or youtu.be)
        url: String,
        /// Teaching style (classroom, storytelling, intensive, fast_talk, dialogue)
        #[arg(long)]
        style: Option<AnalysisStyle>,
        /// Knowledge level (beginner, intermediate, expert)
        #[arg(long)]
        level: Option<KnowledgeLevel>,
        /// Output language (zh, en)
        #[arg(long)]
        lang: Option<Language>,
        /// Chapter to interpret, 1-based
        #[arg(long, conflicts_with = "all")]
        chapter: Option<usize>,
        /// Interpret every chapter in order
        #[arg(long)]
        all: bool,
        /// Write a markdown export when done
        #[arg(long)]
        export: bool,
        /// Ignore the saved session for this video and detect chapters again
        #[arg(long)]
        fresh: bool,
    },
    /// Inspect saved interpretation sessions
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Export a saved session as markdown
    Export {
        /// Video id of the saved session
        id: String,
        /// Output directory (defaults to the configured export dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change saved preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Show the effective configuration or write it to a file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List saved sessions, most recent first
    List,
    /// Print every saved interpretation of one video
    Show { id: String },
    /// Remove one saved session
    Delete { id: String },
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    Set {
        #[arg(long)]
        style: Option<AnalysisStyle>,
        #[arg(long)]
        level: Option<KnowledgeLevel>,
        #[arg(long)]
        lang: Option<Language>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    /// Write the effective configuration as TOML
    Init {
        #[arg(default_value = "video-interpreter.toml")]
        path: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(Config::load().unwrap_or_else(|e| {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::from_env()
        })),
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("video_interpreter=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("video_interpreter={},warn", config.output.log_level)))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;
    init_logging(&config, cli.verbose);
    if cli.verbose {
        debug!("{}", config.summary());
    }

    let store = JsonStore::open(config.storage.resolve_data_dir())?;

    match cli.command {
        Commands::Interpret { url, style, level, lang, chapter, all, export, fresh } => {
            config.validate()?;
            info!("🚀 Video Interpreter starting...");

            let mut session = Session::from_config(&config)?;
            if fresh {
                session.start(&url).await?;
            } else {
                session.open(&url).await?;
            }

            // Explicit flags win over the style and level restored from history
            if let Some(style) = style {
                session.set_style(style);
            }
            if let Some(level) = level {
                session.set_level(level);
            }
            if let Some(lang) = lang {
                session.set_language(lang);
            }

            let video = session.current_video().context("no video loaded")?;
            println!("{}\n", video.title);
            for (idx, ch) in video.chapters.iter().enumerate() {
                println!("  {:>2}. [{}] {}", idx + 1, format_time(ch.start_time), ch.title);
            }
            println!();

            if all {
                let count = session.analyze_all().await?;
                info!("✅ Interpreted {} chapters", count);
            } else {
                let index = chapter.unwrap_or(1);
                if index == 0 {
                    bail!("chapters are numbered from 1");
                }
                session.select_chapter(index - 1)?;
                let text = session.analyze_active().await?;
                println!("{}\n", text);

                let sources = session.sources_for_active();
                if !sources.is_empty() {
                    println!("Sources:");
                    for source in sources {
                        println!("  - {} <{}>", source.title, source.uri);
                    }
                }
            }

            if export {
                let path = session.export_markdown(&config.output.export_dir).await?;
                println!("Exported to {}", path.display());
            }
        }

        Commands::History { action } => {
            let history = HistoryStore::with_limit(store, config.storage.history_limit);
            match action {
                HistoryAction::List => {
                    let entries = history.load();
                    if entries.is_empty() {
                        info!("📭 No saved sessions");
                        return Ok(());
                    }
                    for entry in entries {
                        let saved = chrono::DateTime::from_timestamp_millis(entry.timestamp)
                            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        println!(
                            "{}  {}  {}/{} chapters  {}  {}",
                            entry.id,
                            saved,
                            entry.results.len(),
                            entry.video_info.chapters.len(),
                            entry.style,
                            entry.video_info.title
                        );
                    }
                }
                HistoryAction::Show { id } => {
                    let Some(entry) = history.get(&id) else {
                        bail!("no saved session for {}", id);
                    };
                    println!("# {}\n", entry.video_info.title);
                    for ch in &entry.video_info.chapters {
                        if let Some(text) = entry.results.get(&ch.id) {
                            println!("## [{}] {}\n\n{}\n", format_time(ch.start_time), ch.title, text);
                        }
                    }
                }
                HistoryAction::Delete { id } => {
                    if history.delete_one(&id)? {
                        info!("✅ Deleted saved session: {}", id);
                    } else {
                        warn!("⚠️ No saved session for: {}", id);
                    }
                }
            }
        }

        Commands::Export { id, output } => {
            let history = HistoryStore::with_limit(store.clone(), config.storage.history_limit);
            let Some(entry) = history.get(&id) else {
                bail!("no saved session for {}", id);
            };
            let lang = PreferencesStore::new(store).load().unwrap_or_default().lang;
            let output_dir = output.unwrap_or_else(|| config.output.export_dir.clone());

            let path = export::write_history_entry(&output_dir, &entry, lang).await?;
            println!("Exported to {}", path.display());
        }

        Commands::Prefs { action } => {
            let prefs_store = PreferencesStore::new(store);
            let mut prefs = prefs_store.load().unwrap_or_default();
            if let PrefsAction::Set { style, level, lang } = action {
                prefs.style = style.unwrap_or(prefs.style);
                prefs.level = level.unwrap_or(prefs.level);
                prefs.lang = lang.unwrap_or(prefs.lang);
                prefs_store.save(&prefs)?;
                info!("💾 Preferences saved");
            }
            println!("lang:  {}", prefs.lang);
            println!("style: {} ({})", prefs.style, prefs.style.label(prefs.lang));
            println!("level: {} ({})", prefs.level, prefs.level.label(prefs.lang));
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => println!("{}", config.summary()),
            ConfigAction::Init { path } => {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                config.save(&path)?;
            }
        },
    }

    Ok(())
}
