//! External collaborator clients.

pub mod registration;

pub use registration::{RegistrationError, TokenRegistry, TokenRegistryConfig};
