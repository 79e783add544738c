use std::{net::SocketAddr, path::PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::ConfigOverrides;

#[derive(Debug, Parser)]
#[command(
    name = "icgeo",
    version,
    about = "Interview transcript store, normalizer and REST API"
)]
pub struct Cli {
    #[command(flatten)]
    pub db: DbArgs,

    /// Read settings from this TOML file instead of the XDG config
    #[arg(long, env = "ICGEO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection to the PostgreSQL database.
#[derive(Debug, Default, Args)]
pub struct DbArgs {
    /// Database server host or socket directory
    #[arg(short = 'H', long, env = "ICGEO_DB_HOST", global = true)]
    pub host: Option<String>,

    /// Database server port
    #[arg(short, long, env = "ICGEO_DB_PORT", global = true)]
    pub port: Option<u16>,

    /// Database name
    #[arg(short, long, env = "ICGEO_DB_NAME", global = true)]
    pub dbname: Option<String>,

    /// Database role used by the service
    #[arg(short, long, env = "ICGEO_DB_USER", global = true)]
    pub username: Option<String>,

    /// Password for the database role
    #[arg(
        long,
        env = "ICGEO_DB_PASSWORD",
        hide_env_values = true,
        global = true
    )]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the REST API
    Serve(ServeArgs),
    /// Create or upgrade the database tables
    Migrate,
    /// Normalize one converted transcript and store it
    Insert(InsertArgs),
    /// Normalize and store every transcript in a directory
    Load(LoadArgs),
    /// Print the normalized form of a transcript (no database needed)
    Normalize(NormalizeArgs),
    /// Print the meta document of a transcript (no database needed)
    Meta(MetaArgs),
    /// Compare stored stems with PostgreSQL's own lexemes
    Compare(CompareArgs),
    /// Manage API users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Serve --

#[derive(Debug, Parser)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "ICGEO_BIND")]
    pub bind: Option<SocketAddr>,

    /// Minimum number of pooled connections
    #[arg(long, env = "ICGEO_MIN_CONNECTIONS")]
    pub min_connections: Option<u32>,

    /// Maximum number of pooled connections
    #[arg(long, env = "ICGEO_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,
}

// -- Insert / Load --

#[derive(Debug, Parser)]
pub struct InsertArgs {
    /// Interview id (positive integer)
    #[arg(value_parser = clap::value_parser!(i32).range(1..))]
    pub id: i32,

    /// docx2json output file
    pub file: PathBuf,

    /// Overwrite an interview that already has this id
    #[arg(long)]
    pub replace: bool,
}

#[derive(Debug, Parser)]
pub struct LoadArgs {
    /// Directory holding files named `<id>…json`
    pub dir: PathBuf,

    /// Only load files whose relative path matches this glob
    #[arg(long)]
    pub pattern: Option<String>,

    /// Overwrite interviews that already exist
    #[arg(long)]
    pub replace: bool,
}

// -- Offline inspection --

#[derive(Debug, Parser)]
pub struct NormalizeArgs {
    /// docx2json output file
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct MetaArgs {
    /// docx2json output file
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Users --

#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create an API user; the password is read from stdin
    Add {
        /// Name of the new API user
        username: String,
    },
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "icgeo",
            &mut std::io::stdout(),
        );
    }
}

impl Cli {
    /// Settings given on the command line or through the environment.
    pub fn overrides(&self) -> ConfigOverrides {
        let serve = match &self.command {
            Command::Serve(args) => Some(args),
            _ => None,
        };
        ConfigOverrides {
            host: self.db.host.clone(),
            port: self.db.port,
            dbname: self.db.dbname.clone(),
            username: self.db.username.clone(),
            password: self.db.password.clone(),
            bind: serve.and_then(|s| s.bind),
            min_connections: serve.and_then(|s| s.min_connections),
            max_connections: serve.and_then(|s| s.max_connections),
        }
    }
}
