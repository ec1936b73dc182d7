use crate::configuration::{DatabaseSettings, Settings};
use crate::domain::EmailAddress;
use crate::email_queue::{EmailQueue, PostgresEmailQueue};
use crate::email_templates::EmailTemplates;
use crate::routes::{ContactError, contact, contact_method_not_allowed, health_check};
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

/// Destination of the admin notification for every contact submission.
pub struct OperatorEmail(pub EmailAddress);

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let operator = config
            .contact
            .operator()
            .map_err(anyhow::Error::msg)
            .context("Invalid operator email address.")?;
        let templates = EmailTemplates::new(config.contact.escape_html)
            .context("Failed to load the email templates.")?;

        let connection_pool = get_connection_pool(&config.database);
        let email_queue = PostgresEmailQueue::new(connection_pool);

        let address = format!("{}:{}", config.app.host, config.app.port);
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {address}."))?;
        let port = listener.local_addr()?.port();
        let server = run(listener, email_queue, operator, templates)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run<Q>(
    listener: TcpListener,
    email_queue: Q,
    operator: EmailAddress,
    templates: EmailTemplates,
) -> Result<Server, anyhow::Error>
where
    Q: EmailQueue,
{
    let email_queue = web::Data::new(email_queue);
    let operator = web::Data::new(OperatorEmail(operator));
    let templates = web::Data::new(templates);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| ContactError::InvalidPayload(err).into()),
            )
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/api/contact")
                    .route(web::post().to(contact::<Q>))
                    .default_service(web::to(contact_method_not_allowed)),
            )
            .app_data(email_queue.clone())
            .app_data(operator.clone())
            .app_data(templates.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Pool for the privileged database role used by the queue, the delivery
/// worker and the bootstrap routine.
pub fn get_connection_pool(db_config: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy_with(db_config.with_db())
}
