use std::net::TcpListener;
use std::time::Duration;

use secrecy::SecretString;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};
use xau_backend::{
    configuration::DeliverySettings,
    delivery_worker::{ExecutionOutcome, try_execute_task},
    domain::{EmailAddress, EmailJob},
    email_client::EmailClient,
    email_queue::{EmailQueue, PostgresEmailQueue},
    email_templates::EmailTemplates,
};

use crate::helpers::{OPERATOR_EMAIL, configure_migrated_database};

fn delivery_settings() -> DeliverySettings {
    DeliverySettings {
        max_retries: 1,
        base_backoff_secs: 3600,
        idle_poll_secs: 1,
    }
}

fn email_client(base_url: String) -> EmailClient {
    EmailClient::new(
        base_url,
        EmailAddress::parse("no-reply@xauusdalgotrader.com".into()).unwrap(),
        SecretString::from("token"),
        Duration::from_millis(500),
    )
    .unwrap()
}

fn job(to: &str) -> EmailJob {
    EmailJob {
        to: to.into(),
        subject: "Subject".into(),
        html: "<p>Body</p>".into(),
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn contact_submissions_are_stored_in_the_delivery_queue() {
    let (_, pool) = configure_migrated_database().await;

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port.");
    let port = listener.local_addr().unwrap().port();
    let server = xau_backend::startup::run(
        listener,
        PostgresEmailQueue::new(pool.clone()),
        EmailAddress::parse(OPERATOR_EMAIL.into()).unwrap(),
        EmailTemplates::new(false).unwrap(),
    )
    .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    let response = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}/api/contact"))
        .json(&serde_json::json!({
            "name": "Ann",
            "email": "ann@x.com",
            "message": "Hi"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());

    let recipients: Vec<String> =
        sqlx::query_scalar("SELECT recipient FROM email_delivery_queue ORDER BY enqueued_at")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(recipients, vec![OPERATOR_EMAIL, "ann@x.com"]);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn worker_delivers_queued_emails_and_empties_the_queue() {
    let (_, pool) = configure_migrated_database().await;
    let email_server = MockServer::start().await;
    let queue = PostgresEmailQueue::new(pool.clone());

    Mock::given(path("v1/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&email_server)
        .await;

    queue.submit(job(OPERATOR_EMAIL)).await.unwrap();
    queue.submit(job("ann@x.com")).await.unwrap();

    let client = email_client(email_server.uri());
    let settings = delivery_settings();
    for _ in 0..2 {
        let outcome = try_execute_task(&pool, &client, &settings).await.unwrap();
        assert_eq!(outcome, ExecutionOutcome::TaskCompleted);
    }
    let outcome = try_execute_task(&pool, &client, &settings).await.unwrap();
    assert_eq!(outcome, ExecutionOutcome::EmptyQueue);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn failed_deliveries_are_retried_later_then_dropped() {
    let (_, pool) = configure_migrated_database().await;
    let email_server = MockServer::start().await;
    let queue = PostgresEmailQueue::new(pool.clone());

    Mock::given(path("v1/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&email_server)
        .await;

    queue.submit(job("ann@x.com")).await.unwrap();

    let client = email_client(email_server.uri());
    let settings = delivery_settings();

    let outcome = try_execute_task(&pool, &client, &settings).await.unwrap();
    assert_eq!(outcome, ExecutionOutcome::TaskCompleted);

    let n_retries: i16 = sqlx::query_scalar("SELECT n_retries FROM email_delivery_queue")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(n_retries, 1);

    // Rescheduled an hour out, so nothing is due yet.
    let outcome = try_execute_task(&pool, &client, &settings).await.unwrap();
    assert_eq!(outcome, ExecutionOutcome::EmptyQueue);

    sqlx::query("UPDATE email_delivery_queue SET execute_after = now()")
        .execute(&pool)
        .await
        .unwrap();
    let outcome = try_execute_task(&pool, &client, &settings).await.unwrap();
    assert_eq!(outcome, ExecutionOutcome::TaskCompleted);

    let remaining: i64 = sqlx::query_scalar("SELECT count(*) FROM email_delivery_queue")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn emails_with_an_invalid_recipient_are_dropped_without_sending() {
    let (_, pool) = configure_migrated_database().await;
    let email_server = MockServer::start().await;
    let queue = PostgresEmailQueue::new(pool.clone());

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&email_server)
        .await;

    queue.submit(job("not-an-email")).await.unwrap();

    let client = email_client(email_server.uri());
    let outcome = try_execute_task(&pool, &client, &delivery_settings())
        .await
        .unwrap();
    assert_eq!(outcome, ExecutionOutcome::TaskCompleted);

    let outcome = try_execute_task(&pool, &client, &delivery_settings())
        .await
        .unwrap();
    assert_eq!(outcome, ExecutionOutcome::EmptyQueue);
}
