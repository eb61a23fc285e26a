//! chemdrill CLI — generate chemistry exercises and track mastery.

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "chemdrill", version, about = "Adaptive chemistry exercise generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate exercises
    Generate {
        /// Template to generate from
        #[arg(long, conflicts_with = "competency")]
        template: Option<String>,

        /// Competency to train (picks a matching template)
        #[arg(long)]
        competency: Option<String>,

        /// Number of exercises
        #[arg(long, default_value = "1")]
        count: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available templates
    List {
        /// Only templates carrying this exam tag
        #[arg(long)]
        exam_tag: Option<String>,

        /// Only templates training this competency
        #[arg(long)]
        competency: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate template files against the ontology
    Validate {
        /// Template file or directory (defaults to the configured set)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Record one answer and update mastery
    #[command(group(ArgGroup::new("outcome").required(true).args(["correct", "wrong"])))]
    Answer {
        /// Competency the answer counts towards
        #[arg(long)]
        competency: String,

        /// The answer was correct
        #[arg(long)]
        correct: bool,

        /// The answer was wrong
        #[arg(long)]
        wrong: bool,

        /// A hint was shown before answering
        #[arg(long)]
        hint: bool,

        /// Mastery store path
        #[arg(long)]
        store: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show or reset stored mastery
    Mastery {
        /// Mastery store path
        #[arg(long)]
        store: Option<PathBuf>,

        /// Delete all stored mastery
        #[arg(long)]
        reset: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and example template
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chemdrill=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            template,
            competency,
            count,
            seed,
            format,
            config,
        } => commands::generate::execute(template, competency, count, seed, format, config),
        Commands::List {
            exam_tag,
            competency,
            config,
        } => commands::list::execute(exam_tag, competency, config),
        Commands::Validate { templates, config } => commands::validate::execute(templates, config),
        Commands::Answer {
            competency,
            correct,
            wrong: _,
            hint,
            store,
            config,
        } => commands::answer::execute(competency, correct, hint, store, config),
        Commands::Mastery {
            store,
            reset,
            config,
        } => commands::mastery::execute(store, reset, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
