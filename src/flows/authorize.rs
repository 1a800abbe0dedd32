//! Authorization request construction for the Authorization Code + PKCE flow.
//!
//! [`FlowEngine::start_authorization`] commits the pending session to the store *before*
//! returning the redirect URL: the redirect that follows is an external event that may
//! reload or restart the client process, and the callback validation on the other side
//! depends on the durable material.

// self
use crate::{
	_prelude::*,
	auth::{
		PendingAuthorizationSession,
		pkce::{self, PkceMaterial},
	},
	config::ClientConfiguration,
	flows::FlowEngine,
	obs::{FlowKind, FlowSpan},
};

const STATE_ENTROPY_BYTES: usize = 32;

/// Redirect material returned by [`FlowEngine::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Fully-formed authorize URL that callers should send the end-user to.
	pub redirect_url: Url,
	/// Opaque state nonce that must round-trip via the redirect handler.
	pub state: String,
}

impl FlowEngine {
	/// Starts a new authorization attempt, overwriting any stale pending session.
	pub async fn start_authorization(&self) -> Result<AuthorizationRequest> {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "start_authorization");

		span.instrument(async move {
			let pkce = PkceMaterial::generate();
			// Independent draw from the same CSPRNG backing the verifier; the state nonce is
			// the CSRF defense and must not come from a weaker source.
			let state = pkce::random_urlsafe(STATE_ENTROPY_BYTES);
			let redirect_url = build_authorize_url(self.configuration(), &state, &pkce)?;
			let pending = PendingAuthorizationSession::new(pkce.verifier().clone(), &state);

			self.store.set_pending_session(pending).await?;

			Ok(AuthorizationRequest { redirect_url, state })
		})
		.await
	}

	/// Deterministically discards an abandoned authorization attempt.
	pub async fn cancel_authorization(&self) -> Result<()> {
		self.store.clear_pending_session().await?;

		Ok(())
	}
}

fn build_authorize_url(
	config: &ClientConfiguration,
	state: &str,
	pkce: &PkceMaterial,
) -> Result<Url> {
	let mut url = config.authorize_url()?;

	{
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &config.client_id);
		pairs.append_pair("redirect_uri", config.redirect_uri.as_str());
		pairs.append_pair("scope", &config.scope);
		pairs.append_pair("state", state);
		pairs.append_pair("code_challenge", pkce.challenge());
		pairs.append_pair("code_challenge_method", pkce.method().as_str());
	}

	Ok(url)
}
