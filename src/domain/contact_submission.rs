/// Message returned to the caller whenever a required field is missing.
pub const REQUIRED_FIELDS_MESSAGE: &str = "Name, email, and message are required";

/// Raw contact form body. Every field is optional at the wire level so that
/// missing and empty values are rejected the same way.
#[derive(serde::Deserialize, Debug, Default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

/// A contact form submission whose required fields are present.
///
/// Values are kept exactly as received. The email is not checked for syntax
/// and whitespace is not trimmed.
#[derive(Debug, Clone)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

impl ContactSubmission {
    pub fn parse(form: ContactForm) -> Result<Self, String> {
        let (Some(name), Some(email), Some(message)) = (
            non_empty(form.name),
            non_empty(form.email),
            non_empty(form.message),
        ) else {
            return Err(REQUIRED_FIELDS_MESSAGE.to_string());
        };

        Ok(Self {
            name,
            email,
            phone: form.phone,
            message,
        })
    }

    /// Phone number as shown to the operator.
    pub fn phone_or_placeholder(&self) -> &str {
        match self.phone.as_deref() {
            Some(phone) if !phone.is_empty() => phone,
            _ => "Not provided",
        }
    }
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = String;

    fn try_from(value: ContactForm) -> Result<Self, Self::Error> {
        ContactSubmission::parse(value)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
