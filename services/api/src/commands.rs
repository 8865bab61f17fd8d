use crate::cli::DatabaseArgs;
use clap::Args;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::store::seed::{
    seed_demo, SeedPasswords, EMPLOYER_PASSWORD, EMPLOYER_USERNAME, STUDENT_PASSWORD,
    STUDENT_USERNAME,
};
use job_board::store::SqliteStore;
use job_board::telemetry;
use job_board::workflows::accounts::password::hash_password;
use job_board::workflows::accounts::AccountService;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct SeedArgs {
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CreateAdminArgs {
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
    #[command(flatten)]
    pub(crate) database: DatabaseArgs,
}

/// Load configuration, apply the `--database` override, and open the store.
pub(crate) fn bootstrap(database: DatabaseArgs) -> Result<(AppConfig, SqliteStore), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = database.path {
        config.database.path = path;
    }
    telemetry::init(&config.telemetry, config.environment)?;
    let store = SqliteStore::open(&config.database)?;
    Ok((config, store))
}

pub(crate) async fn seed(args: SeedArgs) -> Result<(), AppError> {
    let (config, store) = bootstrap(args.database)?;
    let cost = config.auth.bcrypt_cost;
    let passwords = SeedPasswords {
        student_hash: hash_password(STUDENT_PASSWORD, cost)
            .await
            .map_err(|err| AppError::Command(err.to_string()))?,
        employer_hash: hash_password(EMPLOYER_PASSWORD, cost)
            .await
            .map_err(|err| AppError::Command(err.to_string()))?,
    };

    let report = seed_demo(&store, &passwords)?;
    info!(
        database = %config.database.path.display(),
        users = report.users,
        skills = report.skills,
        categories = report.categories,
        vacancies = report.vacancies,
        "demo data seeded"
    );

    println!("Seeded {}", config.database.path.display());
    println!(
        "- {} users, {} skills, {} categories, {} vacancies added",
        report.users, report.skills, report.categories, report.vacancies
    );
    println!("- student login: {STUDENT_USERNAME} / {STUDENT_PASSWORD}");
    println!("- employer login: {EMPLOYER_USERNAME} / {EMPLOYER_PASSWORD}");
    Ok(())
}

pub(crate) async fn create_admin(args: CreateAdminArgs) -> Result<(), AppError> {
    let CreateAdminArgs {
        username,
        email,
        password,
        database,
    } = args;

    let (config, store) = bootstrap(database)?;
    let service = AccountService::new(Arc::new(store), config.auth);
    let account = service
        .create_admin(&username, &email, &password)
        .await
        .map_err(|err| AppError::Command(format!("could not create admin: {err}")))?;

    info!(user_id = account.id.0, "admin account created");
    println!("Created admin {} (id {})", account.username, account.id.0);
    Ok(())
}
