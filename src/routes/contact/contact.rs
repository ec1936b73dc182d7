use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use tracing::{Span, field::display};

use super::{
    errors::ContactError,
    types::{ContactResponse, SUCCESS_MESSAGE},
};
use crate::{
    domain::{ContactForm, ContactSubmission, EmailAddress},
    email_queue::EmailQueue,
    email_templates::EmailTemplates,
    startup::OperatorEmail,
};

#[tracing::instrument(
    name = "Handling a contact form submission",
    skip(form, email_queue, operator, templates),
    fields(
        contact_name = tracing::field::Empty,
        contact_email = tracing::field::Empty
    )
)]
pub async fn contact<Q: EmailQueue>(
    form: web::Json<ContactForm>,
    email_queue: web::Data<Q>,
    operator: web::Data<OperatorEmail>,
    templates: web::Data<EmailTemplates>,
) -> Result<HttpResponse, ContactError> {
    let submission: ContactSubmission = form
        .into_inner()
        .try_into()
        .map_err(ContactError::ValidationError)?;
    Span::current()
        .record("contact_name", display(&submission.name))
        .record("contact_email", display(&submission.email));

    send_notifications(&submission, email_queue.get_ref(), &operator.0, &templates)
        .await
        .map_err(|e| {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to queue the contact form emails."
            );
            ContactError::UnexpectedError(e)
        })?;

    Ok(HttpResponse::Ok().json(ContactResponse {
        message: SUCCESS_MESSAGE.to_string(),
    }))
}

pub async fn contact_method_not_allowed() -> Result<HttpResponse, ContactError> {
    Err(ContactError::MethodNotAllowed)
}

/// Queues the operator notification, then the acknowledgement to the submitter.
///
/// The two submissions are independent: a failure on the first stops before
/// the second is attempted, and a failure on the second leaves the first in
/// the queue.
#[tracing::instrument(
    name = "Queueing contact form emails",
    skip(submission, email_queue, operator, templates)
)]
async fn send_notifications<Q: EmailQueue>(
    submission: &ContactSubmission,
    email_queue: &Q,
    operator: &EmailAddress,
    templates: &EmailTemplates,
) -> Result<(), anyhow::Error> {
    let admin_email = templates
        .admin_notification(submission, operator.as_ref(), Utc::now())
        .context("Failed to render the admin notification email.")?;
    email_queue
        .submit(admin_email)
        .await
        .context("Failed to queue the admin notification email.")?;

    let user_email = templates
        .user_acknowledgement(submission)
        .context("Failed to render the acknowledgement email.")?;
    email_queue
        .submit(user_email)
        .await
        .context("Failed to queue the acknowledgement email.")?;

    Ok(())
}
