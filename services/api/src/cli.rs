use crate::commands::{create_admin, seed, CreateAdminArgs, SeedArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use job_board::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Job Board",
    about = "Run and administer the student job-board API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Insert demo users, catalog entries, and vacancies (safe to repeat)
    Seed(SeedArgs),
    /// Create a staff account without a student or employer profile
    CreateAdmin(CreateAdminArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DatabaseArgs {
    /// SQLite file to use instead of APP_DATABASE_PATH (`:memory:` for a throwaway store)
    #[arg(long = "database")]
    pub(crate) path: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => seed(args).await,
        Command::CreateAdmin(args) => create_admin(args).await,
    }
}
