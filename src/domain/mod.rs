mod contact_submission;
mod email_address;
mod email_job;

pub use contact_submission::{ContactForm, ContactSubmission, REQUIRED_FIELDS_MESSAGE};
pub use email_address::EmailAddress;
pub use email_job::EmailJob;
