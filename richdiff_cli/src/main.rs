use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use richdiff_common::{
    ensure_config, load_config, load_config_from, save_config, Delta, LoadedConfig,
};
use richdiff_core::{apply, contains_changes, is_comment_only_change, DeltaDiffEngine};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "richdiff")]
#[command(author = "RichDiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Word-level diffing of rich-text documents", long_about = None)]
struct Cli {
    /// Load settings from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Prefer the config file next to the executable
    #[arg(long, global = true)]
    portable: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the edit script turning OLD into NEW
    Diff {
        /// Old document (JSON, `-` for stdin)
        old: PathBuf,

        /// New document (JSON, `-` for stdin)
        new: PathBuf,

        /// Match embeds by uuid/id
        #[arg(long)]
        resolve_embeds: bool,

        /// Match embeds by position and content only
        #[arg(long, conflicts_with = "resolve_embeds")]
        no_resolve_embeds: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Apply an edit script to a document
    Apply {
        /// Document to edit (JSON, `-` for stdin)
        document: PathBuf,

        /// Edit script (JSON, `-` for stdin)
        script: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Report what kind of change an edit script makes
    Classify {
        /// Edit script (JSON, `-` for stdin)
        script: PathBuf,

        /// Document the script applies to; enables comment-only detection
        #[arg(short, long)]
        baseline: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Serialize)]
struct Classification {
    contains_changes: bool,
    comment_only: Option<bool>,
}

fn main() {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let (name, result) = match cli.command {
        Commands::Diff {
            old,
            new,
            resolve_embeds,
            no_resolve_embeds,
            pretty,
        } => (
            "Diff",
            run_diff(
                cli.config.as_deref(),
                cli.portable,
                &old,
                &new,
                resolve_embeds,
                no_resolve_embeds,
                pretty,
            ),
        ),
        Commands::Apply {
            document,
            script,
            pretty,
        } => (
            "Apply",
            run_apply(cli.config.as_deref(), cli.portable, &document, &script, pretty),
        ),
        Commands::Classify { script, baseline } => {
            ("Classify", run_classify(&script, baseline.as_deref()))
        }
        Commands::Config { init } => (
            "Config",
            run_config(cli.config.as_deref(), cli.portable, init),
        ),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", name, e);
        std::process::exit(1);
    }
}

fn settings(config: Option<&Path>, portable: bool) -> Result<LoadedConfig> {
    let loaded = match config {
        Some(path) => load_config_from(path)?,
        None => load_config(portable)?,
    };
    debug!(
        "Using config {} (exists: {})",
        loaded.path.display(),
        loaded.exists
    );
    Ok(loaded)
}

/// Stdin can back at most one input of a command
fn ensure_single_stdin(paths: &[&Path]) -> Result<()> {
    let from_stdin = paths.iter().filter(|path| **path == Path::new("-")).count();
    if from_stdin > 1 {
        bail!("Only one input can be read from stdin (`-`), got {}", from_stdin);
    }
    Ok(())
}

fn read_delta(path: &Path) -> Result<Delta> {
    let data = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    serde_json::from_str(&data).with_context(|| format!("Invalid delta in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}

fn run_diff(
    config: Option<&Path>,
    portable: bool,
    old: &Path,
    new: &Path,
    resolve_embeds: bool,
    no_resolve_embeds: bool,
    pretty: bool,
) -> Result<()> {
    ensure_single_stdin(&[old, new])?;
    let mut config = settings(config, portable)?.config;
    if resolve_embeds {
        config.resolve_embed_ids = true;
    } else if no_resolve_embeds {
        config.resolve_embed_ids = false;
    }

    let old_doc = read_delta(old)?;
    let new_doc = read_delta(new)?;
    info!(
        "Diffing {} ({} ops) against {} ({} ops)",
        old.display(),
        old_doc.len(),
        new.display(),
        new_doc.len()
    );

    let engine = DeltaDiffEngine::from_config(&config);
    let script = engine.diff(&old_doc, &new_doc)?;
    info!("Edit script has {} ops", script.len());

    print_json(&script, pretty || config.pretty_output)
}

fn run_apply(
    config: Option<&Path>,
    portable: bool,
    document: &Path,
    script: &Path,
    pretty: bool,
) -> Result<()> {
    ensure_single_stdin(&[document, script])?;
    let config = settings(config, portable)?.config;

    let doc = read_delta(document)?;
    let script = read_delta(script)?;
    let result = apply(&doc, &script)?;
    info!("Applied {} ops, document has {} ops", script.len(), result.len());

    print_json(&result, pretty || config.pretty_output)
}

fn run_classify(script: &Path, baseline: Option<&Path>) -> Result<()> {
    if let Some(baseline) = baseline {
        ensure_single_stdin(&[script, baseline])?;
    }
    let script = read_delta(script)?;
    let comment_only = match baseline {
        Some(path) => Some(is_comment_only_change(&read_delta(path)?, &script)),
        None => None,
    };

    print_json(
        &Classification {
            contains_changes: contains_changes(&script),
            comment_only,
        },
        false,
    )
}

fn run_config(config: Option<&Path>, portable: bool, init: bool) -> Result<()> {
    let loaded = match (config, init) {
        (None, true) => ensure_config(portable)?,
        (Some(path), true) => {
            let loaded = load_config_from(path)?;
            if !loaded.exists {
                save_config(path, &loaded.config)?;
            }
            loaded
        }
        (_, false) => settings(config, portable)?,
    };
    if init {
        info!("Config file: {}", loaded.path.display());
    }

    println!("# {}", loaded.path.display());
    print!(
        "{}",
        toml::to_string_pretty(&loaded.config).context("Failed to render config")?
    );
    Ok(())
}
