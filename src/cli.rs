use clap::{Args, Parser, Subcommand};

use crate::campusnet::DEFAULT_BASE_URL;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List terms offered on the class search page.
    Terms,
    /// List subjects for a term.
    Subjects(SubjectsArgs),
    /// Search sections by term and subject, optionally with class details.
    Search(SearchArgs),
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// CampusNet username.
    #[arg(long, env = "CAMPUSNET_USERNAME", global = true)]
    pub username: Option<String>,

    /// CampusNet password.
    #[arg(long, env = "CAMPUSNET_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Registration system origin.
    #[arg(long, env = "CAMPUSNET_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Academic career (UGRD, GRAD, LAW, CNED).
    #[arg(long, env = "CAMPUSNET_ACAD", default_value = "GRAD", global = true)]
    pub acad: String,

    /// Directory holding cached upstream responses.
    #[arg(long, default_value = "cache", global = true)]
    pub cache_dir: String,

    /// Always fetch; never read or write the cache.
    #[arg(long, short = 'n', global = true)]
    pub no_cache: bool,
}

impl std::fmt::Debug for ConnectionArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionArgs")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("acad", &self.acad)
            .field("cache_dir", &self.cache_dir)
            .field("no_cache", &self.no_cache)
            .finish()
    }
}

#[derive(Debug, Args)]
pub struct SubjectsArgs {
    /// Term label or name pattern (e.g. `114-Fall 2025`, `fall 2025`).
    #[arg(long, short = 't')]
    pub term: String,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Term labels or name patterns.
    #[arg(long = "term", short = 't', required = true, num_args = 1..)]
    pub terms: Vec<String>,

    /// Subject codes (e.g. `CIS`).
    #[arg(long = "subject", short = 's', required = true, num_args = 1..)]
    pub subjects: Vec<String>,

    /// Fetch class details for every section and print merged records.
    #[arg(long)]
    pub details: bool,

    /// Emit JSON lines instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Session value for sections when the result table has no session column.
    #[arg(long)]
    pub session_default: Option<String>,
}
