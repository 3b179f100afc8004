use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ocean-notes")]
#[command(version, about = "Local-first personal notes with markdown preview")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding the notes (default: nearest .ocean-notes/)
    #[arg(long, global = true, env = "OCEAN_NOTES_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Storage backend (file, sqlite)
    #[arg(long, global = true, env = "OCEAN_NOTES_STORAGE", default_value = "file")]
    pub storage: String,

    /// API base URL of a notes backend
    #[arg(long, global = true, env = "OCEAN_NOTES_API_BASE", hide = true)]
    pub api_base: Option<String>,

    /// Backend URL
    #[arg(long, global = true, env = "OCEAN_NOTES_BACKEND_URL", hide = true)]
    pub backend_url: Option<String>,

    /// Websocket URL
    #[arg(long, global = true, env = "OCEAN_NOTES_WS_URL", hide = true)]
    pub ws_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new note
    New {
        /// Note title (defaults to "Untitled")
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Markdown body
        #[arg(long, short = 'b', conflicts_with = "stdin")]
        body: Option<String>,

        /// Read the body from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List notes
    List {
        /// Sort order (updated, created, title)
        #[arg(long, short = 's', default_value = "updated")]
        sort: String,

        /// Only show notes containing this text
        #[arg(long, short = 'q')]
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Get {
        /// Note ID (full id or unique prefix like "3f2a9c")
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a note's title and/or body
    Update {
        /// Note ID (full id or unique prefix)
        id: String,

        /// New title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// New markdown body
        #[arg(long, short = 'b', conflicts_with = "stdin")]
        body: Option<String>,

        /// Read the new body from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a note permanently
    Delete {
        /// Note ID (full id or unique prefix)
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Search titles and bodies (case-insensitive)
    Search {
        /// Text to look for
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a note's body (or stdin) as HTML preview
    Render {
        /// Note ID (full id or unique prefix)
        #[arg(required_unless_present = "stdin")]
        id: Option<String>,

        /// Render markdown read from stdin
        #[arg(long, conflicts_with = "id")]
        stdin: bool,
    },

    /// Export every note as a markdown file
    Export {
        /// Destination directory
        dir: PathBuf,
    },

    /// Show collection size and scale warnings
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive editing session with autosave
    Shell,
}
