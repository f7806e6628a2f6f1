//! HTTP handlers for the OAuth2 endpoints.

pub mod authorize;
pub mod client_auth;
pub mod consent;
pub mod introspection;
pub mod revocation;
pub mod token;

pub use authorize::{authorize_form_handler, authorize_query_handler};
pub use consent::consent_placeholder_handler;
pub use introspection::introspection_handler;
pub use revocation::revocation_handler;
pub use token::token_handler;
