use anyhow::{bail, Context};
use clap::ValueEnum;
use nms_orm::{
    MigrationConfig, MigrationDirection, MigrationManager, MigrationRollback, MigrationRunResult,
    MigrationRunner, MigrationStatus, MigrationStatusEntry, MigrationStorage, PgQueryInterface,
    QueryInterface, RollbackResult, SqlRecorder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for MigrationDirection {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Up => MigrationDirection::Up,
            DirectionArg::Down => MigrationDirection::Down,
        }
    }
}

/// Environment configuration with command line overrides applied
pub fn load_config(
    database_url: Option<String>,
    migrations_table: Option<String>,
) -> anyhow::Result<MigrationConfig> {
    let mut config = MigrationConfig::from_env().context("Invalid migration configuration")?;

    if let Some(url) = database_url {
        config = config.with_database_url(url);
    }
    if let Some(table) = migrations_table {
        config = config.with_migrations_table(table);
    }

    config.validate()?;
    Ok(config)
}

pub async fn connect(config: MigrationConfig) -> anyhow::Result<MigrationRunner<PgQueryInterface>> {
    let backend = PgQueryInterface::connect(&config)
        .await
        .context("Failed to connect to the database")?;
    let manager = nms_models::manager(config)?;
    Ok(MigrationRunner::new(manager, backend))
}

pub async fn up<B>(runner: &MigrationRunner<B>, to: Option<&str>) -> anyhow::Result<MigrationRunResult>
where
    B: QueryInterface + MigrationStorage,
{
    let result = match to {
        Some(target) => runner.run_to(target).await?,
        None => runner.run_migrations().await?,
    };
    Ok(result)
}

pub async fn down<B>(
    runner: &MigrationRunner<B>,
    to: Option<&str>,
    all: bool,
) -> anyhow::Result<RollbackResult>
where
    B: QueryInterface + MigrationStorage,
{
    let result = match (to, all) {
        (Some(_), true) => bail!("--to and --all cannot be combined"),
        (Some(target), false) => runner.rollback_to(target).await?,
        (None, true) => runner.rollback_all().await?,
        (None, false) => runner.rollback_last().await?,
    };
    Ok(result)
}

/// SQL the selected migrations would run in `direction`
pub async fn sql(
    manager: &MigrationManager,
    direction: MigrationDirection,
    name: Option<&str>,
) -> anyhow::Result<String> {
    let mut selected: Vec<_> = match name {
        Some(name) => vec![manager
            .find(name)
            .with_context(|| format!("Migration {} not found", name))?
            .clone()],
        None => manager.migrations().to_vec(),
    };
    if direction == MigrationDirection::Down {
        selected.reverse();
    }

    let mut output = Vec::new();
    for migration in selected {
        let recorder = SqlRecorder::new();
        direction
            .run(migration.as_ref(), &recorder, &nms_orm::DataTypes::new())
            .await?;

        output.push(format!("-- {} ({})", migration.name(), direction));
        output.extend(recorder.statements());
    }

    Ok(output.join("\n"))
}

pub fn render_run(result: &MigrationRunResult) -> String {
    if result.applied_count == 0 {
        return "Nothing to migrate".to_string();
    }

    let mut lines: Vec<String> = result
        .applied_migrations
        .iter()
        .map(|name| format!("Migrated: {}", name))
        .collect();
    lines.push(format!(
        "Applied {} migration(s) in {}ms",
        result.applied_count, result.execution_time_ms
    ));
    lines.join("\n")
}

pub fn render_rollback(result: &RollbackResult) -> String {
    if result.rolled_back_count == 0 {
        return "Nothing to roll back".to_string();
    }

    let mut lines: Vec<String> = result
        .rolled_back_migrations
        .iter()
        .map(|name| format!("Reverted: {}", name))
        .collect();
    lines.push(format!(
        "Rolled back {} migration(s) in {}ms",
        result.rolled_back_count, result.execution_time_ms
    ));
    lines.join("\n")
}

pub fn render_status(entries: &[MigrationStatusEntry], json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(entries)?);
    }

    if entries.is_empty() {
        return Ok("No migrations registered".to_string());
    }

    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let marker = match entry.status {
                MigrationStatus::Applied => "up  ",
                MigrationStatus::Pending => "down",
            };
            format!("{} {}", marker, entry.name)
        })
        .collect();
    Ok(lines.join("\n"))
}
