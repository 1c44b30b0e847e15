use std::path::PathBuf;

use aedelore_migrate_core::constants::{
    DEFAULT_CONTAINER, DEFAULT_DATABASE_URL, DEFAULT_DB_NAME, DEFAULT_DB_USER, DEFAULT_DOCKER_BIN,
    DEFAULT_SQLITE_PATH,
};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

/// Where rows are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Backend {
    /// Connect to PostgreSQL directly.
    Postgres,
    /// Run `psql` inside the database container.
    Container,
}

#[derive(Parser, Debug)]
#[command(name = "aedelore-migrate", version)]
#[command(
    about = "Copy Aedelore users, characters, campaigns and sessions from SQLite to PostgreSQL",
    long_about = None
)]
pub(crate) struct Cli {
    /// SQLite database to read from.
    #[arg(long, default_value = DEFAULT_SQLITE_PATH)]
    pub source: PathBuf,

    #[arg(long, value_enum, default_value_t = Backend::Postgres)]
    pub backend: Backend,

    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, hide_env_values = true)]
    pub database_url: String,

    /// Container running PostgreSQL (container backend).
    #[arg(long, default_value = DEFAULT_CONTAINER)]
    pub container: String,

    #[arg(long, default_value = DEFAULT_DB_USER)]
    pub db_user: String,

    #[arg(long, default_value = DEFAULT_DB_NAME)]
    pub db_name: String,

    /// Container runtime program.
    #[arg(long, default_value = DEFAULT_DOCKER_BIN)]
    pub docker_bin: String,

    /// Read the source and report what would be migrated without writing.
    #[arg(long)]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();
    commands::migrate::run(cli).await
}
