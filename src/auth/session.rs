//! Pending-authorization material persisted between the redirect and the code exchange.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Material committed before the browser redirect and consumed by the code exchange.
///
/// At most one pending session exists at a time; starting a new authorization attempt
/// overwrites any stale one. The session is cleared only after a *successful* exchange so a
/// failed exchange can be retried without re-running the redirect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorizationSession {
	/// PKCE code verifier bound to this attempt.
	pub code_verifier: TokenSecret,
	/// CSRF state nonce round-tripped through the redirect.
	pub state: String,
	/// Instant the attempt was started; useful when inspecting abandoned flows.
	pub issued_at: OffsetDateTime,
}
impl PendingAuthorizationSession {
	/// Creates a session stamped with the current clock.
	pub fn new(code_verifier: TokenSecret, state: impl Into<String>) -> Self {
		Self { code_verifier, state: state.into(), issued_at: OffsetDateTime::now_utc() }
	}
}
