//! Client configuration surface consumed by the flow engine.
//!
//! Configuration is supplied by an external settings editor (or the environment) and is
//! immutable for the duration of one flow; swapping it through
//! [`FlowEngine::reconfigure`](crate::flows::FlowEngine::reconfigure) invalidates all
//! session state.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_AUTHORIZE_PATH: &str = "/connect/authorize";
const DEFAULT_TOKEN_PATH: &str = "/connect/token";
const ENV_PREFIX: &str = "PKCE_RELAY_";

/// OAuth client settings for a single authorization server.
///
/// The optional `client_secret` preserves the observed behavior of confidential
/// deployments; public PKCE clients leave it unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfiguration {
	/// Authorization server origin (scheme + host, optionally a path prefix).
	pub base_url: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret for confidential clients.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<String>,
	/// Redirect URI registered for the authorization code flow.
	pub redirect_uri: Url,
	/// Default protected resource reached through the relay.
	pub protected_resource_url: Url,
	/// Space-delimited scope string requested during authorization.
	pub scope: String,
	/// Path of the authorization endpoint, appended to `base_url`.
	pub authorize_endpoint_path: String,
	/// Path of the token endpoint, appended to `base_url`.
	pub token_endpoint_path: String,
}
impl ClientConfiguration {
	/// Returns a builder seeded with the default endpoint paths.
	pub fn builder() -> ClientConfigurationBuilder {
		ClientConfigurationBuilder::new()
	}

	/// Reads the configuration from `PKCE_RELAY_*` environment variables.
	///
	/// Required: `BASE_URL`, `CLIENT_ID`, `REDIRECT_URI`, `PROTECTED_RESOURCE_URL`, `SCOPE`.
	/// Optional: `CLIENT_SECRET`, `AUTHORIZE_ENDPOINT_PATH`, `TOKEN_ENDPOINT_PATH`.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder()
			.base_url(env_url("PKCE_RELAY_BASE_URL")?)
			.client_id(env_string("PKCE_RELAY_CLIENT_ID")?)
			.redirect_uri(env_url("PKCE_RELAY_REDIRECT_URI")?)
			.protected_resource_url(env_url("PKCE_RELAY_PROTECTED_RESOURCE_URL")?)
			.scope(env_string("PKCE_RELAY_SCOPE")?);

		if let Ok(secret) = env::var("PKCE_RELAY_CLIENT_SECRET") {
			builder = builder.client_secret(secret);
		}
		if let Ok(path) = env::var("PKCE_RELAY_AUTHORIZE_ENDPOINT_PATH") {
			builder = builder.authorize_endpoint_path(path);
		}
		if let Ok(path) = env::var("PKCE_RELAY_TOKEN_ENDPOINT_PATH") {
			builder = builder.token_endpoint_path(path);
		}

		builder.build()
	}

	/// Authorization endpoint URL (`base_url` + `authorize_endpoint_path`).
	pub fn authorize_url(&self) -> Result<Url, ConfigError> {
		join_endpoint(&self.base_url, &self.authorize_endpoint_path)
	}

	/// Token endpoint URL (`base_url` + `token_endpoint_path`).
	pub fn token_url(&self) -> Result<Url, ConfigError> {
		join_endpoint(&self.base_url, &self.token_endpoint_path)
	}
}

/// Builder for [`ClientConfiguration`] values.
#[derive(Clone, Debug, Default)]
pub struct ClientConfigurationBuilder {
	base_url: Option<Url>,
	client_id: Option<String>,
	client_secret: Option<String>,
	redirect_uri: Option<Url>,
	protected_resource_url: Option<Url>,
	scope: Option<String>,
	authorize_endpoint_path: Option<String>,
	token_endpoint_path: Option<String>,
}
impl ClientConfigurationBuilder {
	fn new() -> Self {
		Self::default()
	}

	/// Sets the authorization server base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, id: impl Into<String>) -> Self {
		self.client_id = Some(id.into());

		self
	}

	/// Sets the optional client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Sets the default protected resource URL.
	pub fn protected_resource_url(mut self, url: Url) -> Self {
		self.protected_resource_url = Some(url);

		self
	}

	/// Sets the requested scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Overrides the authorization endpoint path (defaults to `/connect/authorize`).
	pub fn authorize_endpoint_path(mut self, path: impl Into<String>) -> Self {
		self.authorize_endpoint_path = Some(path.into());

		self
	}

	/// Overrides the token endpoint path (defaults to `/connect/token`).
	pub fn token_endpoint_path(mut self, path: impl Into<String>) -> Self {
		self.token_endpoint_path = Some(path.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfiguration, ConfigError> {
		let config = ClientConfiguration {
			base_url: self.base_url.ok_or(ConfigError::MissingField { field: "base_url" })?,
			client_id: require_non_empty(self.client_id, "client_id")?,
			client_secret: self.client_secret,
			redirect_uri: self
				.redirect_uri
				.ok_or(ConfigError::MissingField { field: "redirect_uri" })?,
			protected_resource_url: self
				.protected_resource_url
				.ok_or(ConfigError::MissingField { field: "protected_resource_url" })?,
			scope: self.scope.ok_or(ConfigError::MissingField { field: "scope" })?,
			authorize_endpoint_path: self
				.authorize_endpoint_path
				.unwrap_or_else(|| DEFAULT_AUTHORIZE_PATH.into()),
			token_endpoint_path: self
				.token_endpoint_path
				.unwrap_or_else(|| DEFAULT_TOKEN_PATH.into()),
		};

		// Both joins must be valid up front so flows never fail mid-exchange on a bad path.
		config.authorize_url()?;
		config.token_url()?;

		Ok(config)
	}
}

fn require_non_empty(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
	match value {
		Some(value) if !value.is_empty() => Ok(value),
		_ => Err(ConfigError::MissingField { field }),
	}
}

/// Appends an endpoint path onto the base URL without collapsing a path prefix.
///
/// A path missing its leading `/` would otherwise concatenate into the host and still
/// parse, so the separator is normalized here.
fn join_endpoint(base: &Url, path: &str) -> Result<Url, ConfigError> {
	let base = base.as_str().trim_end_matches('/');
	let joined = if path.starts_with('/') {
		format!("{base}{path}")
	} else {
		format!("{base}/{path}")
	};

	Url::parse(&joined)
		.map_err(|source| ConfigError::InvalidEndpointPath { path: path.into(), source })
}

fn env_string(variable: &'static str) -> Result<String, ConfigError> {
	debug_assert!(variable.starts_with(ENV_PREFIX));

	env::var(variable).map_err(|_| ConfigError::MissingEnvVar {
		variable: variable.strip_prefix(ENV_PREFIX).unwrap_or(variable),
	})
}

fn env_url(variable: &'static str) -> Result<Url, ConfigError> {
	let raw = env_string(variable)?;

	Url::parse(&raw).map_err(|source| ConfigError::InvalidEnvUrl {
		variable: variable.strip_prefix(ENV_PREFIX).unwrap_or(variable),
		source,
	})
}
