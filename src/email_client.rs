use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::EmailAddress;

/// HTTP client for the transactional email API used by the delivery worker.
#[derive(Clone, Debug)]
pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: EmailAddress,
    auth_token: SecretString,
}

#[derive(Serialize)]
struct EmailUnit<'a> {
    email: &'a str,
}

impl<'a> EmailUnit<'a> {
    fn new(email: &'a str) -> Self {
        Self { email }
    }
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: EmailUnit<'a>,
    to: Vec<EmailUnit<'a>>,
    subject: &'a str,
    html: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: EmailAddress,
        auth_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        Ok(Self {
            http_client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build the email API http client.")?,
            base_url: Url::parse(&base_url).context("Failed parsing base email api url.")?,
            sender,
            auth_token,
        })
    }

    pub async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error> {
        let url = self
            .base_url
            .join("v1/email")
            .context("Failed joining route to email api url.")?;

        let body = SendEmailRequest {
            from: EmailUnit::new(self.sender.as_ref()),
            to: vec![EmailUnit::new(recipient.as_ref())],
            subject,
            html: html_content,
        };

        self.http_client
            .post(url)
            .header(
                "Authorization",
                "Bearer ".to_owned() + self.auth_token.expose_secret(),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
