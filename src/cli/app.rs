//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::output::{Output, OutputFormat};
use super::{check, graph, lines};
use crate::domain::TopologyLevel;
use crate::storage::{Config, StoryProject};

#[derive(Parser)]
#[command(name = "storyline")]
#[command(author, version, about = "Parse, check and publish branching stories")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true, env = "STORYLINE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold a new story directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Story title
        #[arg(long, default_value = "Untitled Story")]
        title: String,

        /// Story author
        #[arg(long, default_value = "Anonymous")]
        author: String,
    },

    /// Check that a story would publish
    Check {
        /// Story directory or JSON file
        #[arg(default_value = ".")]
        story: PathBuf,
    },

    /// Publish a story to JSON
    Publish {
        /// Story directory or JSON file
        #[arg(default_value = ".")]
        story: PathBuf,

        /// Output file (defaults to published.json next to the story)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the link graph of a story, including missing targets
    Graph {
        /// Story directory or JSON file
        #[arg(default_value = ".")]
        story: PathBuf,

        /// Graph pages instead of scenes
        #[arg(long, conflicts_with = "level")]
        pages: bool,

        /// Graph level (scene or page), overriding the project config
        #[arg(long)]
        level: Option<TopologyLevel>,
    },

    /// Classify each line of a scene file
    Lines {
        /// Scene file (markdown, frontmatter optional)
        file: PathBuf,

        /// Check headings against an existing story
        #[arg(long)]
        against: Option<PathBuf>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    super::init_logging(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()?.global.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);

    match cli.command {
        Commands::Init {
            path,
            title,
            author,
        } => {
            debug!(path = %path.display(), "initializing story");
            let project = StoryProject::init(&path, &title, &author)?;
            output.success(&format!(
                "Initialized story '{}' at {}",
                title,
                project.root().display()
            ));
        }

        Commands::Check { story } => check::check(&output, &story)?,

        Commands::Publish { story, output: dest } => {
            check::publish(&output, &story, dest.as_deref())?
        }

        Commands::Graph {
            story,
            pages,
            level,
        } => {
            let level = if pages { Some(TopologyLevel::Page) } else { level };
            graph::run(&output, &story, level)?
        }

        Commands::Lines { file, against } => lines::run(&output, &file, against.as_deref())?,
    }

    debug!("command completed");
    Ok(())
}
