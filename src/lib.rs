//! Client-side OAuth 2.1 flow engine—Authorization Code + PKCE and Client Credentials grants,
//! a durable token lifecycle manager, and a credential-forwarding relay that reaches protected
//! resources without leaking transport framing.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod probe;
pub mod relay;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfiguration,
		flows::FlowEngine,
		http::ReqwestTransport,
		store::{MemoryStore, SessionStore},
	};

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Client configuration fixture pointing every endpoint at the provided mock base URL.
	pub fn test_configuration(base_url: &str) -> ClientConfiguration {
		ClientConfiguration::builder()
			.base_url(Url::parse(base_url).expect("Failed to parse test base URL."))
			.client_id("test-client")
			.client_secret("test-secret")
			.redirect_uri(
				Url::parse("https://app.test/callback").expect("Failed to parse test redirect URI."),
			)
			.protected_resource_url(
				Url::parse(&format!("{base_url}/api/resource"))
					.expect("Failed to parse test resource URL."),
			)
			.scope("openid profile")
			.build()
			.expect("Failed to build test client configuration.")
	}

	/// Constructs a [`FlowEngine`] backed by an in-memory store and the insecure reqwest
	/// transport used across integration tests.
	pub fn build_test_engine(config: ClientConfiguration) -> (FlowEngine, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();
		let engine = FlowEngine::with_transport(store, config, test_reqwest_transport());

		(engine, store_backend)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
