mod commands;
mod logging;

use clap::{Parser, Subcommand};
use commands::migrate::{self, DirectionArg};
use logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(name = "nms-migrate")]
#[command(about = "Apply and roll back the NMS model migrations")]
#[command(version)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Table recording applied migrations
    #[arg(long, env = "NMS_MIGRATIONS_TABLE", global = true)]
    migrations_table: Option<String>,

    /// Debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Up {
        /// Stop after this migration
        #[arg(long)]
        to: Option<String>,
    },

    /// Roll back applied migrations (the most recent one by default)
    Down {
        /// Roll back down to and including this migration
        #[arg(long, conflicts_with = "all")]
        to: Option<String>,

        /// Roll back every applied migration
        #[arg(long)]
        all: bool,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the SQL migrations would run, without connecting
    Sql {
        /// Direction to render
        #[arg(value_enum)]
        direction: DirectionArg,

        /// Only this migration
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(
        &LoggingConfig::default()
            .verbose(cli.verbose)
            .json(cli.log_json),
    )?;

    if let Err(err) = run(cli).await {
        tracing::error!(error = %format!("{:#}", err), "nms-migrate failed");
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = migrate::load_config(cli.database_url, cli.migrations_table)?;

    match cli.command {
        Commands::Up { to } => {
            let runner = migrate::connect(config).await?;
            let result = migrate::up(&runner, to.as_deref()).await?;
            println!("{}", migrate::render_run(&result));
        }
        Commands::Down { to, all } => {
            let runner = migrate::connect(config).await?;
            let result = migrate::down(&runner, to.as_deref(), all).await?;
            println!("{}", migrate::render_rollback(&result));
        }
        Commands::Status { json } => {
            let runner = migrate::connect(config).await?;
            let entries = runner.status().await?;
            println!("{}", migrate::render_status(&entries, json)?);
        }
        Commands::Sql { direction, name } => {
            let manager = nms_models::manager(config)?;
            println!("{}", migrate::sql(&manager, direction.into(), name.as_deref()).await?);
        }
    }

    Ok(())
}
