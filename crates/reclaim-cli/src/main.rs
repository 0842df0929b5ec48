use clap::Parser;
use owo_colors::OwoColorize;
use reclaim::{Error, PgDatabase, RestoreJob, RestoreOutcome, Role};
use tokio_postgres::NoTls;
use tracing_subscriber::EnvFilter;

mod config;

use config::{Cli, mask_password};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // stdout carries the report; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reclaim=info")),
        )
        .init();

    match run(&cli).await {
        Ok(outcome) => {
            if outcome.copied > 0 {
                eprintln!(
                    "{} restored {} records for user {}",
                    "done:".green().bold(),
                    outcome.copied,
                    cli.user_id
                );
            } else {
                eprintln!("{} nothing written", "done:".green().bold());
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "restore failed");
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> reclaim::Result<RestoreOutcome> {
    let user_id = cli.user()?;

    let archival = connect(&cli.archival_url, Role::Archival, &cli.schema).await?;
    let live = connect(&cli.live_url, Role::Live, &cli.schema).await?;
    let merge = connect(&cli.merge_url, Role::Merge, &cli.schema).await?;

    let job = RestoreJob {
        user_id,
        archival: &archival,
        live: &live,
        merge: &merge,
        options: cli.scope_options(),
        mode: cli.mode(),
    };

    let mut stdout = std::io::stdout().lock();
    job.run(&mut stdout).await
}

async fn connect(url: &str, role: Role, schema: &str) -> reclaim::Result<PgDatabase> {
    tracing::info!(db = %role, url = %mask_password(url), "connecting");

    let (client, connection) = tokio_postgres::connect(url, NoTls)
        .await
        .map_err(|e| Error::Connection {
            role,
            source: e.into(),
        })?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(db = %role, error = %e, "database connection error");
        }
    });

    Ok(PgDatabase::new(client, role, schema))
}
