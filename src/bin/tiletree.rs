use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tiletree::common::config::{Config, config_file};
use tiletree::common::log;
use tiletree::layout_engine::replay::{self, Record, ReplayStep};
use tiletree::layout_engine::{EventResponse, Handle, LayoutEngine, LayoutEvent, WorkspaceId};

#[derive(Parser)]
#[command(version, about = "Template-driven tiling layout engine")]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration and every workspace template.
    Check,
    /// Write the bundled default configuration unless a file already exists.
    Init,
    /// Fill a workspace with windows and print its tree.
    Tree {
        #[arg(long, default_value = "")]
        workspace: String,
        #[arg(long, default_value_t = 5)]
        windows: isize,
    },
    /// Read RON steps from stdin, one per line, and print each response as JSON.
    Run {
        /// Record the session to the specified file path. Overwrites the file
        /// if it exists.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Feed a recorded session back into a fresh engine.
    Replay { file: PathBuf },
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();

    let config_path = opt.config.clone().unwrap_or_else(config_file);
    if let Err(e) = run(opt.command, &config_path) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(command: Commands, config_path: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            if config_path.exists() {
                anyhow::bail!("{} already exists", config_path.display());
            }
            Config::default().save(config_path)?;
            println!("Wrote {}", config_path.display());
        }
        Commands::Check => {
            let issues = load_config(config_path)?.validate();
            if !issues.is_empty() {
                for issue in issues {
                    eprintln!("{issue}");
                }
                process::exit(1);
            }
            println!("Config validation passed");
        }
        Commands::Tree { workspace, windows } => {
            let workspace = WorkspaceId::from(workspace);
            let mut engine = LayoutEngine::new(load_config(config_path)?)?;
            let _ = engine.handle_event(LayoutEvent::ActiveWorkspaceChanged {
                workspace: workspace.clone(),
            });
            for id in 1..=windows {
                let _ = engine.handle_event(LayoutEvent::WindowAppeared {
                    handle: Handle(id),
                    workspace: workspace.clone(),
                });
            }
            if let Some(tree) = engine.draw_tree() {
                print!("{tree}");
            }
        }
        Commands::Run { record } => {
            let config = load_config(config_path)?;
            let mut record = Record::new(record.as_deref())?;
            record.start(&config)?;
            let mut engine = LayoutEngine::new(config)?;
            for line in io::stdin().lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let step: ReplayStep =
                    ron::de::from_str(&line).with_context(|| format!("parsing {line:?}"))?;
                record.on_step(&step)?;
                print_response(&step.apply(&mut engine))?;
            }
        }
        Commands::Replay { file } => {
            let engine = replay::replay(&file, |_, response| {
                if let Err(e) = print_response(response) {
                    eprintln!("{e}");
                }
            })?;
            engine.debug_tree();
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        Config::read(path).with_context(|| format!("reading {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

fn print_response(response: &EventResponse) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", serde_json::to_string(response)?)?;
    Ok(())
}
