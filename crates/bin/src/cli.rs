//! CLI argument definitions for the purrcafe binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Output format of command results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// purrcafe storage administration
#[derive(Parser, Debug)]
#[command(name = "purrcafe")]
#[command(about = "purrcafe: identifiers, users, sessions and expiring files")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where and how the store is opened
#[derive(Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(
        short,
        long,
        value_enum,
        default_value = "sqlite",
        env = "PURRCAFE_BACKEND",
        global = true
    )]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores purrcafe.db
    /// For InMemory: stores purrcafe.json
    #[arg(short = 'D', long, env = "PURRCAFE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// JSON file overriding store limits and lifetimes
    #[arg(short, long, env = "PURRCAFE_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and inspect MeowIDs
    #[command(subcommand)]
    Id(IdCommand),
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),
    /// Log in and out
    #[command(subcommand)]
    Session(SessionCommand),
    /// Upload, download and delete files
    #[command(subcommand)]
    File(FileCommand),
}

#[derive(Subcommand, Debug)]
pub enum IdCommand {
    /// Generate new identifiers
    Generate {
        /// How many identifiers to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Split an identifier into its components
    Decode {
        /// Identifier in text form or as a decimal integer
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Create a user
    Create {
        name: String,
        email: String,
        /// Plain-text password; it is hashed before it reaches the store
        password: String,
    },
    /// List every user
    List,
    /// Show one user
    Show { name: String },
    /// Change a user's password
    Passwd { name: String, password: String },
    /// Delete a user with all their sessions and files
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Log in and print the session token
    Login {
        name: String,
        password: String,
        /// Session lifetime in seconds
        #[arg(long)]
        lifetime_secs: Option<u64>,
    },
    /// List the sessions of the token's owner
    List { token: String },
    /// End the session
    Logout { token: String },
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Upload a file and print its identifier
    Upload(UploadArgs),
    /// Download a file; counts against its download limit
    Download {
        id: String,
        /// Where to write the payload
        out: PathBuf,
    },
    /// Show file metadata
    Meta { id: String },
    /// Delete a file uploaded by the token's owner
    Delete { token: String, id: String },
    /// List every file
    List,
}

/// Arguments for the file upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Session token; the guest token is 00000000-000-00000
    pub token: String,

    /// File to upload
    pub path: PathBuf,

    /// Stored filename (defaults to the file name of PATH)
    #[arg(long)]
    pub name: Option<String>,

    /// MIME type
    #[arg(long, default_value = purrcafe::constants::DEFAULT_MIME_TYPE)]
    pub mime: String,

    /// Hide the uploader from metadata
    #[arg(long)]
    pub hidden: bool,

    /// Delete the file after this many downloads
    #[arg(long)]
    pub max_downloads: Option<u64>,

    /// Lifetime in seconds; 0 keeps the file forever
    #[arg(long)]
    pub lifetime_secs: Option<u64>,
}
