//! Hand-off point between the HTTP handlers and email delivery.
//!
//! Handlers only ever see [`EmailQueue`]: a successful `submit` means the job
//! was accepted for processing, not that it was delivered.

mod postgres;

use std::future::Future;

use crate::domain::EmailJob;

pub use postgres::PostgresEmailQueue;

pub trait EmailQueue: Send + Sync + 'static {
    /// Accept `job` for delivery. The queue owns the job from here on.
    fn submit(&self, job: EmailJob) -> impl Future<Output = Result<(), anyhow::Error>> + Send;
}
