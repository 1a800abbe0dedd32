//! Redirect callback validation — the CSRF gate between the browser and the code exchange.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	flows::FlowEngine,
	obs::{FlowKind, FlowSpan},
};

/// Query parameters received on the configured redirect URI.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code issued by the server.
	#[serde(default)]
	pub code: Option<String>,
	/// Echoed state nonce.
	#[serde(default)]
	pub state: Option<String>,
	/// OAuth error code when the server denied the request.
	#[serde(default)]
	pub error: Option<String>,
}
impl CallbackQuery {
	/// Extracts the callback parameters from a full redirect URL.
	pub fn from_redirect_url(url: &Url) -> Self {
		let mut query = Self::default();

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"code" => query.code = Some(value.into_owned()),
				"state" => query.state = Some(value.into_owned()),
				"error" => query.error = Some(value.into_owned()),
				_ => {},
			}
		}

		query
	}
}

/// Validated exchange material yielded by a matching callback.
#[derive(Clone)]
pub struct ExchangeRequest {
	/// One-time authorization code.
	pub code: String,
	/// PKCE verifier bound to the pending session that produced the code.
	pub code_verifier: TokenSecret,
}
impl Debug for ExchangeRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeRequest")
			.field("code", &self.code)
			.field("code_verifier", &self.code_verifier)
			.finish()
	}
}

impl FlowEngine {
	/// Validates the redirect callback against the pending session.
	///
	/// The pending session is deliberately *not* cleared here; it is cleared only after a
	/// successful exchange so a failed exchange can be retried without re-running the
	/// browser redirect.
	pub async fn validate_callback(&self, query: &CallbackQuery) -> Result<ExchangeRequest> {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "validate_callback");

		span.instrument(async move {
			if let Some(code) = &query.error {
				return Err(Error::AuthorizationDenied { code: code.clone() });
			}

			let (Some(code), Some(state)) = (&query.code, &query.state) else {
				return Err(Error::protocol("missing code or state"));
			};
			let pending = self.store.pending_session().await?.ok_or(Error::SessionExpired)?;

			// Any discrepancy is rejected, not just absence; this is the CSRF defense.
			if *state != pending.state {
				return Err(Error::security("state mismatch"));
			}

			Ok(ExchangeRequest { code: code.clone(), code_verifier: pending.code_verifier })
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::PendingAuthorizationSession,
		config::ClientConfiguration,
		http::{HttpTransport, TransportFuture},
		store::{MemoryStore, SessionStore},
	};

	struct NoTransport;
	impl HttpTransport for NoTransport {
		fn execute(&self, _: crate::http::HttpRequest) -> TransportFuture<'_> {
			Box::pin(async { panic!("Callback validation must never touch the network.") })
		}
	}

	async fn engine_with_pending(state: Option<&str>) -> FlowEngine {
		let store = Arc::new(MemoryStore::default());
		let config = ClientConfiguration::builder()
			.base_url(Url::parse("https://idp.test").expect("Base URL fixture should parse."))
			.client_id("abc")
			.redirect_uri(
				Url::parse("https://app.test/callback")
					.expect("Redirect URI fixture should parse."),
			)
			.protected_resource_url(
				Url::parse("https://idp.test/api/resource")
					.expect("Resource URL fixture should parse."),
			)
			.scope("openid")
			.build()
			.expect("Configuration fixture should build.");

		if let Some(state) = state {
			store
				.set_pending_session(PendingAuthorizationSession::new(
					TokenSecret::new("verifier-fixture"),
					state,
				))
				.await
				.expect("Failed to seed the pending session.");
		}

		FlowEngine::with_transport(store, config, NoTransport)
	}

	fn query(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackQuery {
		CallbackQuery {
			code: code.map(Into::into),
			state: state.map(Into::into),
			error: error.map(Into::into),
		}
	}

	#[tokio::test]
	async fn server_error_short_circuits_without_touching_the_store() {
		let engine = engine_with_pending(Some("expected")).await;
		let err = engine
			.validate_callback(&query(Some("xyz"), Some("expected"), Some("access_denied")))
			.await
			.expect_err("Server-reported errors should abort validation.");

		assert!(matches!(err, Error::AuthorizationDenied { code } if code == "access_denied"));
		assert!(
			engine
				.store
				.pending_session()
				.await
				.expect("Pending session fetch should succeed.")
				.is_some(),
			"A denied callback must leave the pending session intact.",
		);
	}

	#[tokio::test]
	async fn missing_code_or_state_is_a_protocol_error() {
		let engine = engine_with_pending(Some("expected")).await;

		for bad in [query(None, Some("expected"), None), query(Some("xyz"), None, None)] {
			let err = engine
				.validate_callback(&bad)
				.await
				.expect_err("Missing parameters should fail validation.");

			assert!(matches!(err, Error::Protocol { .. }));
		}
	}

	#[tokio::test]
	async fn absent_pending_session_reports_expiry() {
		let engine = engine_with_pending(None).await;
		let err = engine
			.validate_callback(&query(Some("xyz"), Some("expected"), None))
			.await
			.expect_err("Validation without a pending session should fail.");

		assert!(matches!(err, Error::SessionExpired));
	}

	#[tokio::test]
	async fn any_state_discrepancy_is_a_security_error() {
		let engine = engine_with_pending(Some("expected")).await;
		let err = engine
			.validate_callback(&query(Some("xyz"), Some("expecteD"), None))
			.await
			.expect_err("A single altered character must be rejected.");

		assert!(matches!(err, Error::Security { .. }));
	}

	#[tokio::test]
	async fn matching_state_yields_the_bound_verifier() {
		let engine = engine_with_pending(Some("expected")).await;
		let exchange = engine
			.validate_callback(&query(Some("xyz"), Some("expected"), None))
			.await
			.expect("Matching state should validate.");

		assert_eq!(exchange.code, "xyz");
		assert_eq!(exchange.code_verifier.expose(), "verifier-fixture");
	}

	#[test]
	fn redirect_url_parsing_picks_known_parameters() {
		let url = Url::parse("https://app.test/callback?code=abc&state=s1&other=ignored")
			.expect("Redirect URL fixture should parse.");
		let query = CallbackQuery::from_redirect_url(&url);

		assert_eq!(query.code.as_deref(), Some("abc"));
		assert_eq!(query.state.as_deref(), Some("s1"));
		assert!(query.error.is_none());
	}
}
