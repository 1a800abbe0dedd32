//! Authorization material: PKCE pairs, pending sessions, and issued token sets.

pub mod pkce;

mod secret;
mod session;
mod token;

pub use secret::TokenSecret;
pub use session::PendingAuthorizationSession;
pub use token::{TokenResponse, TokenSet};
