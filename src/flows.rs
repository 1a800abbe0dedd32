//! High-level OAuth flow orchestrators built around the [`FlowEngine`] context.

pub mod authorize;
pub mod callback;
pub mod exchange;

pub use authorize::*;
pub use callback::*;
pub use exchange::*;

// self
use crate::{
	_prelude::*,
	config::ClientConfiguration,
	http::HttpTransport,
	relay::ResourceRoute,
	store::SessionStore,
};

/// Coordinates OAuth 2.1 flows for a single client session.
///
/// The engine is the explicitly constructed session context: it owns the session store,
/// HTTP transport, client configuration, and the refresh single-flight guard so individual
/// flow implementations can focus on grant-specific logic (state + PKCE generation, code
/// exchanges, refresh rotation, resource forwarding). Construct one per logical session;
/// clones share the same store and guard.
#[derive(Clone)]
pub struct FlowEngine {
	/// Session store holding the token set and pending authorization material.
	pub store: Arc<dyn SessionStore>,
	/// HTTP transport used for every outbound request.
	pub transport: Arc<dyn HttpTransport>,
	config: ClientConfiguration,
	token_route: TokenRoute,
	resource_route: ResourceRoute,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl FlowEngine {
	/// Creates an engine that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn SessionStore>,
		config: ClientConfiguration,
		transport: impl HttpTransport + 'static,
	) -> Self {
		Self {
			store,
			transport: Arc::new(transport),
			config,
			token_route: TokenRoute::Direct,
			resource_route: ResourceRoute::Direct,
			refresh_guard: Arc::new(AsyncMutex::new(())),
		}
	}

	/// Routes token exchanges through a trusted relay endpoint instead of posting the
	/// form-encoded body directly (same-origin / secret-exposure constraints).
	pub fn with_token_route(mut self, route: TokenRoute) -> Self {
		self.token_route = route;

		self
	}

	/// Routes resource fetches through the relay's forwarding endpoint.
	pub fn with_resource_route(mut self, route: ResourceRoute) -> Self {
		self.resource_route = route;

		self
	}

	/// Current client configuration.
	pub fn configuration(&self) -> &ClientConfiguration {
		&self.config
	}

	/// Replaces the configuration, invalidating the token set and any pending session.
	pub async fn reconfigure(&mut self, config: ClientConfiguration) -> Result<()> {
		self.store.clear().await?;
		self.config = config;

		Ok(())
	}

	/// Tears down all session state.
	pub async fn logout(&self) -> Result<()> {
		self.store.clear().await?;

		Ok(())
	}

	pub(crate) fn token_route(&self) -> &TokenRoute {
		&self.token_route
	}

	pub(crate) fn resource_route(&self) -> &ResourceRoute {
		&self.resource_route
	}

	pub(crate) fn refresh_guard(&self) -> &AsyncMutex<()> {
		&self.refresh_guard
	}
}
#[cfg(feature = "reqwest")]
impl FlowEngine {
	/// Creates a new engine with the crate's default reqwest transport.
	pub fn new(store: Arc<dyn SessionStore>, config: ClientConfiguration) -> Self {
		Self::with_transport(store, config, crate::http::ReqwestTransport::default())
	}
}
impl Debug for FlowEngine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FlowEngine")
			.field("base_url", &self.config.base_url)
			.field("client_id", &self.config.client_id)
			.field("client_secret_set", &self.config.client_secret.is_some())
			.field("token_route", &self.token_route)
			.field("resource_route", &self.resource_route)
			.finish()
	}
}
