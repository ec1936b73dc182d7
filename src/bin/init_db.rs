use anyhow::Context;
use sqlx::PgPool;
use xau_backend::{
    bootstrap::initialize_database,
    configuration::get_configuration,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("init_db".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration()?;
    let pool = PgPool::connect_with(config.database.with_db())
        .await
        .context("Failed to connect to Postgres.")?;

    let report = initialize_database(&pool, &config.bootstrap).await?;
    tracing::info!(
        admin_created = report.admin_created,
        plans_created = ?report.plans_created,
        "Database initialized successfully"
    );

    pool.close().await;
    Ok(())
}
