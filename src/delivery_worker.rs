use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{Span, field::display};
use uuid::Uuid;

use crate::{
    configuration::{DeliverySettings, Settings},
    domain::EmailAddress,
    email_client::EmailClient,
    startup::get_connection_pool,
};

type PgTransaction = Transaction<'static, Postgres>;

#[derive(Debug, PartialEq)]
pub enum ExecutionOutcome {
    TaskCompleted,
    EmptyQueue,
}

#[derive(sqlx::FromRow)]
struct QueuedEmail {
    job_id: Uuid,
    recipient: String,
    subject: String,
    html_content: String,
    n_retries: i16,
}

pub async fn run_worker_until_stopped(config: Settings) -> Result<(), anyhow::Error> {
    let pool = get_connection_pool(&config.database);
    let email_client = config.email_client.client()?;
    worker_loop(pool, email_client, config.delivery).await
}

async fn worker_loop(
    pool: PgPool,
    email_client: EmailClient,
    settings: DeliverySettings,
) -> Result<(), anyhow::Error> {
    loop {
        match try_execute_task(&pool, &email_client, &settings).await {
            Ok(ExecutionOutcome::EmptyQueue) => {
                tokio::time::sleep(settings.idle_poll()).await;
            }
            Err(_) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            Ok(ExecutionOutcome::TaskCompleted) => {}
        }
    }
}

#[tracing::instrument(
    skip_all,
    fields(job_id = tracing::field::Empty, n_retries = tracing::field::Empty),
    err
)]
pub async fn try_execute_task(
    pool: &PgPool,
    email_client: &EmailClient,
    settings: &DeliverySettings,
) -> Result<ExecutionOutcome, anyhow::Error> {
    let Some((transaction, task)) = dequeue_task(pool).await? else {
        return Ok(ExecutionOutcome::EmptyQueue);
    };
    Span::current()
        .record("job_id", display(&task.job_id))
        .record("n_retries", display(&task.n_retries));

    match EmailAddress::parse(task.recipient.clone()) {
        Ok(recipient) => {
            if let Err(e) = email_client
                .send_email(&recipient, &task.subject, &task.html_content)
                .await
            {
                if task.n_retries < settings.max_retries {
                    tracing::warn!(
                        error.cause_chain = ?e,
                        error.message = %e,
                        "Failed to deliver a queued email. Scheduling a retry.",
                    );
                    let delay = settings.backoff(task.n_retries);
                    reschedule_task(transaction, task.job_id, delay).await?;
                    return Ok(ExecutionOutcome::TaskCompleted);
                }
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to deliver a queued email. Giving up after {} retries.",
                    task.n_retries
                );
            }
        }
        Err(e) => {
            tracing::warn!(
                error.message = %e,
                "Skipping a queued email. The recipient address is invalid.",
            );
        }
    }

    delete_task(transaction, task.job_id).await?;
    Ok(ExecutionOutcome::TaskCompleted)
}

#[tracing::instrument(skip_all)]
async fn dequeue_task(pool: &PgPool) -> Result<Option<(PgTransaction, QueuedEmail)>, anyhow::Error> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool.")?;

    let task = sqlx::query_as::<_, QueuedEmail>(
        r#"
        SELECT job_id, recipient, subject, html_content, n_retries
        FROM email_delivery_queue
        WHERE execute_after <= now()
        ORDER BY enqueued_at
        FOR UPDATE
        SKIP LOCKED
        LIMIT 1
        "#,
    )
    .fetch_optional(&mut *transaction)
    .await
    .context("Failed to dequeue an email.")?;

    Ok(task.map(|task| (transaction, task)))
}

#[tracing::instrument(skip(transaction))]
async fn reschedule_task(
    mut transaction: PgTransaction,
    job_id: Uuid,
    delay: Duration,
) -> Result<(), anyhow::Error> {
    let execute_after = Utc::now()
        + chrono::Duration::from_std(delay).context("Retry delay is out of range.")?;

    sqlx::query(
        r#"
        UPDATE email_delivery_queue
        SET n_retries = n_retries + 1, execute_after = $2
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .bind(execute_after)
    .execute(&mut *transaction)
    .await?;
    transaction.commit().await?;
    Ok(())
}

#[tracing::instrument(skip(transaction))]
async fn delete_task(mut transaction: PgTransaction, job_id: Uuid) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        DELETE FROM email_delivery_queue
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .execute(&mut *transaction)
    .await?;
    transaction.commit().await?;
    Ok(())
}
