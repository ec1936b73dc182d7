mod contact;
mod health_check;
mod helpers;

pub use contact::{ContactError, ContactResponse, contact, contact_method_not_allowed};
pub use health_check::health_check;
pub use helpers::error_chain_fmt;
