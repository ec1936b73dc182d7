use std::future::Future;

use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::EmailQueue;
use crate::domain::EmailJob;

/// Queue backed by the `email_delivery_queue` table, drained by
/// [`delivery_worker`](crate::delivery_worker).
#[derive(Clone)]
pub struct PostgresEmailQueue {
    pool: PgPool,
}

impl PostgresEmailQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl EmailQueue for PostgresEmailQueue {
    fn submit(&self, job: EmailJob) -> impl Future<Output = Result<(), anyhow::Error>> + Send {
        async move {
            enqueue_email(&self.pool, job)
                .await
                .context("Failed to store the email in the delivery queue.")?;
            Ok(())
        }
    }
}

#[tracing::instrument(
    name = "Enqueueing an email",
    skip(pool, job),
    fields(job_id = tracing::field::Empty, email_subject = %job.subject)
)]
async fn enqueue_email(pool: &PgPool, job: EmailJob) -> Result<Uuid, sqlx::Error> {
    let job_id = Uuid::new_v4();
    tracing::Span::current().record("job_id", tracing::field::display(&job_id));

    sqlx::query(
        r#"
        INSERT INTO email_delivery_queue (job_id, recipient, subject, html_content)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(job_id)
    .bind(job.to)
    .bind(job.subject)
    .bind(job.html)
    .execute(pool)
    .await?;

    Ok(job_id)
}
