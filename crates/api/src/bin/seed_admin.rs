//! Create (or promote) an administrator account.

use anyhow::{Context, bail};
use clap::Parser;

use bizdir_api::provision::{SeedAdmin, SeedCredential, SeedOutcome, seed_admin};
use bizdir_infra::PgStore;

#[derive(Debug, Parser)]
#[command(name = "seed-admin", about = "Provision an administrator account", version)]
struct CliArgs {
    /// Database connection URL.
    #[arg(long, env = "DATABASE_URL", value_name = "url")]
    database_url: String,

    #[arg(long, env = "ADMIN_EMAIL", value_name = "email")]
    email: String,

    #[arg(long, env = "ADMIN_NAME", default_value = "Admin User")]
    name: String,

    /// Local password for the account.
    #[arg(long, env = "ADMIN_PASSWORD", conflicts_with = "subject", hide_env_values = true)]
    password: Option<String>,

    /// Identity provider subject id, for delegated deployments.
    #[arg(long, value_name = "id")]
    subject: Option<String>,

    /// Promote the account if it already exists as a regular user.
    #[arg(long)]
    promote: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bizdir_observability::init();
    let args = CliArgs::parse();

    let credential = match (args.password, args.subject) {
        (Some(password), None) => SeedCredential::Password(password),
        (None, Some(subject)) => SeedCredential::External(subject),
        _ => bail!("exactly one of --password (ADMIN_PASSWORD) or --subject is required"),
    };

    let pool = bizdir_infra::connect(&args.database_url, 1)
        .await
        .context("failed to connect to database")?;
    let store = PgStore::new(pool.clone());
    store.migrate().await.context("failed to run migrations")?;

    let outcome = seed_admin(
        &store,
        SeedAdmin {
            name: args.name,
            email: args.email,
            credential,
            promote: args.promote,
        },
    )
    .await
    .context("failed to provision admin")?;
    pool.close().await;

    match outcome {
        SeedOutcome::Created(user) => println!("created admin {} ({})", user.email, user.id),
        SeedOutcome::Promoted(user) => println!("promoted {} ({}) to admin", user.email, user.id),
        SeedOutcome::AlreadyAdmin(user) => println!("{} is already an admin", user.email),
        SeedOutcome::Unchanged(user) => {
            bail!("{} exists and is not an admin; rerun with --promote", user.email)
        }
    }
    Ok(())
}
