mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapFormat {
    Md,
    Mermaid,
}

#[derive(Parser)]
#[command(
    name = "backlog",
    about = "User-story toolchain — INVEST validation, dependency analysis, and story maps",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from stories/ or .git/)
    #[arg(long, global = true, env = "BACKLOG_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score stories against the INVEST rubric
    Validate {
        /// Validate a single story (omit for the whole set)
        #[arg(long)]
        story_id: Option<String>,

        /// Require all six criteria instead of the score threshold
        #[arg(long)]
        strict: bool,

        /// Write the result back into the story YAML under `validation`
        #[arg(long)]
        save: bool,

        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Analyze the blocking graph: cycles, dangling refs, chains, bottlenecks
    CheckDependencies {
        /// Focus the report on one story
        #[arg(long)]
        story_id: Option<String>,

        /// Write a Mermaid diagram of the full graph to this path
        #[arg(long)]
        output_diagram: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Render the story map grouped by epic
    StoryMap {
        #[arg(long, value_enum, default_value = "md")]
        format: MapFormat,

        /// Restrict the map to one epic
        #[arg(long)]
        epic: Option<String>,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate one Markdown document per story under stories/generated-docs/
    Generate {
        /// Rewrite documents that already exist
        #[arg(long)]
        force: bool,
    },

    /// List stories with optional status/epic filters
    List {
        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        epic: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Print the next unused story id for a prefix
    NextId {
        /// Id prefix (default: configured id_prefix)
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn main() {
    // Diagnostics go to stderr so stdout stays parseable (--output json).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Validate {
            story_id,
            strict,
            save,
            output,
        } => cmd::validate::run(&root, story_id.as_deref(), strict, save, output),
        Commands::CheckDependencies {
            story_id,
            output_diagram,
            output,
        } => cmd::check_deps::run(&root, story_id.as_deref(), output_diagram.as_deref(), output),
        Commands::StoryMap {
            format,
            epic,
            output,
        } => cmd::story_map::run(&root, format, epic.as_deref(), output.as_deref()),
        Commands::Generate { force } => cmd::generate::run(&root, force),
        Commands::List {
            status,
            epic,
            output,
        } => cmd::list::run(&root, status.as_deref(), epic.as_deref(), output),
        Commands::NextId { prefix } => cmd::next_id::run(&root, prefix.as_deref()),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}
