use std::fmt::{Debug, Display};

use tokio::task::JoinError;
use xau_backend::{
    configuration::get_configuration,
    delivery_worker::run_worker_until_stopped,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("xau_backend".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let config = get_configuration()?;

    let app = tokio::spawn(
        Application::build(config.clone())
            .await?
            .run_until_stopped(),
    );
    let worker = tokio::spawn(run_worker_until_stopped(config));

    tokio::select! {
        outcome = app => report_exit("API", outcome),
        outcome = worker => report_exit("Email delivery worker", outcome),
    }

    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "{} failed",
            task_name
            )
        }
        Err(e) => {
            tracing::error!(
            error.cause_chain = ?e,
            error.message = %e,
            "{} task failed to complete",
            task_name
            )
        }
    }
}
