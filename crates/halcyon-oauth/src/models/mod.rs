//! Wire-facing request and response models.

pub mod authorize;
pub mod client;
pub mod introspection;
pub mod revocation;
pub mod token;

pub use authorize::{AuthorizeParams, AuthorizeRequest};
pub use client::Client;
pub use introspection::{IntrospectionRequest, IntrospectionResponse};
pub use revocation::RevocationRequest;
pub use token::{TokenRequest, TokenResponse};
