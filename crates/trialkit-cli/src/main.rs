//! trialkit CLI — run tact drills and matching games from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod input;

#[derive(Parser)]
#[command(name = "trialkit", version, about = "Discrete-trial drills and matching games")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tact drill session
    Drill {
        /// Client name (defaults to the last one used)
        #[arg(long)]
        client: Option<String>,

        /// Decks to draw from (comma-separated, e.g. "nouns,actions")
        #[arg(long)]
        decks: Option<String>,

        /// Number of concepts to sample
        #[arg(long)]
        set_size: Option<usize>,

        /// One trial per exemplar instead of one random exemplar
        #[arg(long, overrides_with = "no_generalization")]
        generalization: bool,

        /// One random exemplar per concept
        #[arg(long, overrides_with = "generalization")]
        no_generalization: bool,

        /// Shuffle exemplar order in generalization mode
        #[arg(long, overrides_with = "no_shuffle")]
        shuffle: bool,

        /// Keep catalog exemplar order in generalization mode
        #[arg(long, overrides_with = "shuffle")]
        no_shuffle: bool,

        /// Re-run the saved missed set
        #[arg(long)]
        missed: bool,

        /// Save this session's missed concepts for next time
        #[arg(long)]
        save_missed: bool,

        /// Also write an HTML summary next to the CSV
        #[arg(long)]
        html: bool,

        /// Skip the CSV export
        #[arg(long)]
        no_export: bool,

        /// RNG seed for reproducible trial order
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Play the picture-matching game
    Match {
        /// receptive ("Find the X.") or expressive ("What is it?")
        #[arg(long, default_value = "receptive")]
        mode: String,

        /// Pictures per round (overrides config)
        #[arg(long)]
        array_size: Option<usize>,

        /// Stop after this many scored selections
        #[arg(long)]
        rounds: Option<u32>,

        /// Use the built-in noun list instead of the catalog
        #[arg(long)]
        builtin: bool,

        /// RNG seed for reproducible rounds
        #[arg(long)]
        seed: Option<u64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize an exported session CSV
    Stats {
        /// CSV file written by `trialkit drill`
        csv: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Write an HTML summary to this path
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Show or clear the saved missed set
    Missed {
        /// Forget the saved missed set
        #[arg(long)]
        clear: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate an item catalog
    Validate {
        /// Catalog file (defaults to the configured targets)
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and catalog
    Init,
}

/// Paired `--x`/`--no-x` flags; neither means "use the saved value".
fn toggle(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trialkit=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Drill {
            client,
            decks,
            set_size,
            generalization,
            no_generalization,
            shuffle,
            no_shuffle,
            missed,
            save_missed,
            html,
            no_export,
            seed,
            config,
        } => {
            commands::drill::execute(commands::drill::DrillArgs {
                client,
                decks,
                set_size,
                generalization: toggle(generalization, no_generalization),
                shuffle_exemplars: toggle(shuffle, no_shuffle),
                missed,
                save_missed,
                html,
                export: !no_export,
                seed,
                config,
            })
            .await
        }
        Commands::Match {
            mode,
            array_size,
            rounds,
            builtin,
            seed,
            config,
        } => commands::matching::execute(mode, array_size, rounds, builtin, seed, config).await,
        Commands::Stats { csv, format, html } => commands::stats::execute(csv, format, html),
        Commands::Missed { clear, config } => commands::missed::execute(clear, config),
        Commands::Validate { targets, config } => commands::validate::execute(targets, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
