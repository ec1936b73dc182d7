use chrono::{DateTime, Utc};
use tera::{Context, Tera};

use crate::domain::{ContactSubmission, EmailJob};

pub const USER_ACKNOWLEDGEMENT_SUBJECT: &str = "Thank you for contacting XAU/USD Algo Trader";

const ADMIN_NOTIFICATION: &str = "contact/admin_notification.html";
const USER_ACKNOWLEDGEMENT: &str = "contact/user_acknowledgement.html";

/// Email bodies for the contact flow.
///
/// Submitted values are interpolated verbatim unless the templates were built
/// with `escape_html`, in which case Tera's HTML autoescaping applies.
pub struct EmailTemplates {
    tera: Tera,
}

impl EmailTemplates {
    pub fn new(escape_html: bool) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (
                ADMIN_NOTIFICATION,
                include_str!("../views/contact/admin_notification.html"),
            ),
            (
                USER_ACKNOWLEDGEMENT,
                include_str!("../views/contact/user_acknowledgement.html"),
            ),
        ])?;

        if escape_html {
            tera.autoescape_on(vec![".html"]);
        } else {
            tera.autoescape_on(vec![]);
        }

        Ok(Self { tera })
    }

    pub fn admin_notification(
        &self,
        submission: &ContactSubmission,
        operator_email: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<EmailJob, tera::Error> {
        let submitted_at = format_submitted_at(submitted_at);
        let html = self.render(
            ADMIN_NOTIFICATION,
            &[
                ("name", submission.name.as_str()),
                ("email", submission.email.as_str()),
                ("phone", submission.phone_or_placeholder()),
                ("message", submission.message.as_str()),
                ("submitted_at", submitted_at.as_str()),
            ],
        )?;

        Ok(EmailJob {
            to: operator_email.to_string(),
            subject: format!("New Contact Form: {}", submission.name),
            html,
        })
    }

    pub fn user_acknowledgement(
        &self,
        submission: &ContactSubmission,
    ) -> Result<EmailJob, tera::Error> {
        let html = self.render(
            USER_ACKNOWLEDGEMENT,
            &[
                ("name", submission.name.as_str()),
                ("message", submission.message.as_str()),
            ],
        )?;

        Ok(EmailJob {
            to: submission.email.clone(),
            subject: USER_ACKNOWLEDGEMENT_SUBJECT.to_string(),
            html,
        })
    }

    fn render(&self, template_name: &str, entries: &[(&str, &str)]) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        for (key, value) in entries.iter().copied() {
            ctx.insert(key, value);
        }
        self.tera.render(template_name, &ctx)
    }
}

/// `M/D/YYYY, H:MM:SS AM` in UTC.
pub fn format_submitted_at(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
