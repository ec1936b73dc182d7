pub const SUCCESS_MESSAGE: &str = "Message sent successfully";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const FAILURE_MESSAGE: &str = "Failed to send message";

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ContactResponse {
    pub message: String,
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
