mod contact;
mod errors;
mod types;

pub use contact::{contact, contact_method_not_allowed};
pub use errors::ContactError;
pub use types::ContactResponse;
