/// A single outbound message handed to an [`EmailQueue`](crate::email_queue::EmailQueue).
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    pub html: String,
}
