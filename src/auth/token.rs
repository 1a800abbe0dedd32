//! Normalized token sets and the token endpoint's wire response.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// JSON body returned by the token endpoint (directly or via the relay).
///
/// Only `access_token` is guaranteed; servers routinely omit the rest, so every other
/// field is optional on the wire and normalized by [`TokenSet::from_response`].
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Bearer access token.
	pub access_token: String,
	/// Replacement refresh token, when the server rotates one.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Token type; effectively always `Bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Access token lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Scope granted by the server, when echoed back.
	#[serde(default)]
	pub scope: Option<String>,
}

/// Durable token set replaced wholesale on every successful exchange.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
	/// Current bearer access token.
	pub access_token: TokenSecret,
	/// Last known good refresh token.
	///
	/// Invariant: never cleared by an exchange that omits `refresh_token`; only replaced
	/// when the server supplies a new one, or dropped by an explicit logout.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the server.
	pub token_type: String,
	/// Access token lifetime in seconds, as reported by the server (0 when omitted).
	pub expires_in: i64,
	/// Scope granted for this token set.
	pub scope: Option<String>,
	/// Instant the set was issued, stamped locally on exchange.
	pub issued_at: OffsetDateTime,
}
impl TokenSet {
	/// Normalizes a wire response into a token set, applying the refresh-token retention rule
	/// against the previously stored set.
	pub fn from_response(response: TokenResponse, previous: Option<&TokenSet>) -> Self {
		let refresh_token = response
			.refresh_token
			.map(TokenSecret::new)
			.or_else(|| previous.and_then(|prior| prior.refresh_token.clone()));

		Self {
			access_token: TokenSecret::new(response.access_token),
			refresh_token,
			token_type: response.token_type.unwrap_or_else(|| "Bearer".into()),
			expires_in: response.expires_in.unwrap_or(0),
			scope: response.scope,
			issued_at: OffsetDateTime::now_utc(),
		}
	}

	/// Expiry instant derived from `issued_at` plus `expires_in`.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.issued_at + Duration::seconds(self.expires_in)
	}

	/// Returns `true` once the expiry instant has passed.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at()
	}
}
impl Debug for TokenSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSet")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(access: &str, refresh: Option<&str>) -> TokenResponse {
		TokenResponse {
			access_token: access.into(),
			refresh_token: refresh.map(Into::into),
			token_type: Some("Bearer".into()),
			expires_in: Some(3600),
			scope: Some("openid".into()),
		}
	}

	#[test]
	fn retention_keeps_previous_refresh_token() {
		let first = TokenSet::from_response(response("access-1", Some("refresh-1")), None);
		let second = TokenSet::from_response(response("access-2", None), Some(&first));

		assert_eq!(second.access_token.expose(), "access-2");
		assert_eq!(second.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-1"));
	}

	#[test]
	fn retention_prefers_newly_supplied_refresh_token() {
		let first = TokenSet::from_response(response("access-1", Some("refresh-1")), None);
		let second = TokenSet::from_response(response("access-2", Some("refresh-2")), Some(&first));

		assert_eq!(second.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-2"));
	}

	#[test]
	fn missing_optional_fields_normalize() {
		let sparse = TokenResponse {
			access_token: "access".into(),
			refresh_token: None,
			token_type: None,
			expires_in: None,
			scope: None,
		};
		let tokens = TokenSet::from_response(sparse, None);

		assert_eq!(tokens.token_type, "Bearer");
		assert_eq!(tokens.expires_in, 0);
		assert!(tokens.refresh_token.is_none());
	}

	#[test]
	fn expiry_tracks_issued_at() {
		let tokens = TokenSet::from_response(response("access", None), None);

		assert_eq!(tokens.expires_at(), tokens.issued_at + Duration::seconds(3600));
		assert!(!tokens.is_expired_at(tokens.issued_at));
		assert!(tokens.is_expired_at(tokens.issued_at + Duration::seconds(3600)));
	}
}
