use std::future::Future;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use xau_backend::{
    configuration::{Settings, get_configuration},
    domain::{EmailAddress, EmailJob},
    email_queue::EmailQueue,
    email_templates::EmailTemplates,
    telemetry::{get_subscriber, init_subscriber},
};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const OPERATOR_EMAIL: &str = "operator@xauusdalgotrader.com";

#[derive(Clone, Copy)]
pub enum FailurePolicy {
    Never,
    OnAttempt(usize),
    Always,
}

/// In-memory queue that records every submission it sees, accepted or not.
#[derive(Clone)]
pub struct RecordingQueue {
    attempts: Arc<Mutex<Vec<(EmailJob, bool)>>>,
    failure: FailurePolicy,
}

impl RecordingQueue {
    pub fn new(failure: FailurePolicy) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(Vec::new())),
            failure,
        }
    }

    pub fn attempts(&self) -> Vec<EmailJob> {
        let attempts = self.attempts.lock().unwrap();
        attempts.iter().map(|(job, _)| job.clone()).collect()
    }

    pub fn accepted(&self) -> Vec<EmailJob> {
        let attempts = self.attempts.lock().unwrap();
        attempts
            .iter()
            .filter(|(_, accepted)| *accepted)
            .map(|(job, _)| job.clone())
            .collect()
    }
}

impl EmailQueue for RecordingQueue {
    fn submit(&self, job: EmailJob) -> impl Future<Output = Result<(), anyhow::Error>> + Send {
        let mut attempts = self.attempts.lock().unwrap();
        let attempt = attempts.len() + 1;
        let accepted = match self.failure {
            FailurePolicy::Never => true,
            FailurePolicy::OnAttempt(n) => n != attempt,
            FailurePolicy::Always => false,
        };
        attempts.push((job, accepted));

        async move {
            if accepted {
                Ok(())
            } else {
                Err(anyhow::anyhow!("The email queue is unavailable."))
            }
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub email_queue: RecordingQueue,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_contact(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/contact", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_contact_raw(&self, body: String, content_type: &str) -> reqwest::Response {
        self.api_client
            .post(format!("{}/api/contact", &self.address))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn request_contact(&self, method: reqwest::Method) -> reqwest::Response {
        self.api_client
            .request(method, format!("{}/api/contact", &self.address))
            .json(&serde_json::json!({
                "name": "Ann",
                "email": "ann@x.com",
                "message": "Hi"
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_queue(RecordingQueue::new(FailurePolicy::Never)).await
}

pub async fn spawn_app_with_queue(email_queue: RecordingQueue) -> TestApp {
    Lazy::force(&TRACING);

    let operator = EmailAddress::parse(OPERATOR_EMAIL.to_string()).unwrap();
    let templates = EmailTemplates::new(false).expect("Failed to load the email templates.");

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port.");
    let port = listener.local_addr().unwrap().port();
    let server = xau_backend::startup::run(listener, email_queue.clone(), operator, templates)
        .expect("Failed to bind address.");

    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        email_queue,
        api_client: reqwest::Client::new(),
    }
}

/// Fresh, uniquely named database with the configured credentials.
pub async fn configure_database() -> (Settings, PgPool) {
    Lazy::force(&TRACING);

    let mut config = get_configuration().expect("Failed to read configuration");
    config.database.database_name = Uuid::new_v4().to_string();

    let mut connection = PgConnection::connect_with(&config.database.without_db())
        .await
        .expect("Failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database.database_name).as_str())
        .await
        .expect("Failed to create database");

    let connection_pool = PgPool::connect_with(config.database.with_db())
        .await
        .expect("Failed to connect to Postgres");

    (config, connection_pool)
}

pub async fn configure_migrated_database() -> (Settings, PgPool) {
    let (config, connection_pool) = configure_database().await;

    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate database");

    (config, connection_pool)
}
