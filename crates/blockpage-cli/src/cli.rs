//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Render a page to HTML on stdout
//! blockpage render 0f5c7e1d2b8a4c6e9d3f1a2b3c4d5e6f > page.html
//!
//! # Full result (html, headings, imagePaths) as JSON
//! blockpage render 0f5c7e1d2b8a4c6e9d3f1a2b3c4d5e6f --format json
//!
//! # Page attributes with the cover and image files cached locally
//! blockpage attributes 0f5c7e1d2b8a4c6e9d3f1a2b3c4d5e6f --resolve-assets
//!
//! # Table of contents
//! blockpage toc 0f5c7e1d2b8a4c6e9d3f1a2b3c4d5e6f
//! ```
//!
//! The API token is read from `BLOCKPAGE_API_TOKEN`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Main CLI structure for the `blockpage` command
#[derive(Parser, Clone, Debug)]
#[command(name = "blockpage")]
#[command(version)]
#[command(about = "blockpage - Render block-based pages with locally cached assets", long_about = None)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the global one
    #[arg(long, global = true, env = "BLOCKPAGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Render a page's content
    Render {
        /// Page identifier
        page_id: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "html")]
        format: RenderFormat,
    },

    /// Show a page's attributes as JSON
    Attributes {
        /// Page identifier
        page_id: String,

        /// Cache the cover and image files and point the attributes at the local copies
        #[arg(long)]
        resolve_assets: bool,
    },

    /// Show a page's table of contents
    Toc {
        /// Page identifier
        page_id: String,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output of `render`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    /// Rendered HTML only
    Html,
    /// Full render result as JSON
    Json,
}

/// Output of listing commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented text
    Text,
    /// JSON array
    Json,
}

impl Cli {
    /// Whether the selected command writes machine-readable output to stdout.
    pub fn machine_output(&self) -> bool {
        match &self.command {
            Commands::Render { format, .. } => *format == RenderFormat::Json,
            Commands::Toc { format, .. } => *format == OutputFormat::Json,
            Commands::Attributes { .. } => true,
        }
    }
}
