//! Optional observability helpers for engine flows.
//!
//! Enable the `tracing` feature to emit structured spans named `pkce_relay.flow` with the
//! `flow` (grant or relay operation) and `stage` (call site) fields; without the feature
//! every helper compiles to a noop.

mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization Code + PKCE flow (authorize URL, callback, exchange).
	AuthorizationCode,
	/// Client Credentials flow.
	ClientCredentials,
	/// Refresh token flow.
	Refresh,
	/// Relay resource fetch.
	ResourceFetch,
	/// Connector performance probe.
	ConnectorProbe,
}
impl FlowKind {
	/// Returns a stable label suitable for span fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Refresh => "refresh",
			FlowKind::ResourceFetch => "resource_fetch",
			FlowKind::ConnectorProbe => "connector_probe",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
