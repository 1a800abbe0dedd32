//! Connector registry and authenticated reachability probing.
//!
//! A [`Connector`] is a named protected endpoint; [`ConnectorProbe`] fetches each one
//! through the engine's relay (bearer attachment and 401 recovery included) and records a
//! timed [`PerformanceResult`] per attempt. Probe failures are results, not errors: only
//! local preconditions (unknown connector, no stored token) abort a run.

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	flows::FlowEngine,
	obs::{FlowKind, FlowSpan},
	relay::ResponseEnvelope,
};

/// A registered protected endpoint that can be probed.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
	/// Stable identifier, unique within the registry.
	pub id: String,
	/// Human-readable name.
	pub name: String,
	/// Absolute URL of the protected endpoint.
	pub url: Url,
	/// Optional free-form description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

/// Outcome of a single probe attempt.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
	/// Identifier of the probed connector.
	pub connector_id: String,
	/// When the attempt started.
	pub timestamp: OffsetDateTime,
	/// Wall-clock duration of the attempt in milliseconds.
	pub duration_ms: f64,
	/// Whether the endpoint answered with a 2xx status.
	pub success: bool,
	/// Failure description when `success` is false.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Upstream status code when a response was received at all.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_code: Option<u16>,
}

/// Selection criteria for [`ConnectorProbe::results`].
#[derive(Clone, Debug, Default)]
pub struct ResultFilter {
	/// Restrict to one connector.
	pub connector_id: Option<String>,
	/// Cap the number of returned results.
	pub limit: Option<usize>,
}

/// Probes registered connectors through a [`FlowEngine`] and keeps a result log.
#[derive(Debug)]
pub struct ConnectorProbe {
	engine: FlowEngine,
	connectors: RwLock<Vec<Connector>>,
	results: RwLock<Vec<PerformanceResult>>,
}
impl ConnectorProbe {
	/// Creates an empty probe around the given engine.
	pub fn new(engine: FlowEngine) -> Self {
		Self { engine, connectors: RwLock::new(Vec::new()), results: RwLock::new(Vec::new()) }
	}

	/// Registers a connector, replacing any previous entry with the same id.
	pub fn add_connector(&self, connector: Connector) {
		let mut connectors = self.connectors.write();

		connectors.retain(|existing| existing.id != connector.id);
		connectors.push(connector);
	}

	/// Updates a registered connector in place.
	pub fn update_connector(&self, connector: Connector) -> Result<()> {
		let mut connectors = self.connectors.write();
		let slot = connectors
			.iter_mut()
			.find(|existing| existing.id == connector.id)
			.ok_or_else(|| Error::UnknownConnector { id: connector.id.clone() })?;

		*slot = connector;

		Ok(())
	}

	/// Removes a connector and every result recorded for it.
	pub fn delete_connector(&self, id: &str) -> Result<()> {
		let mut connectors = self.connectors.write();
		let before = connectors.len();

		connectors.retain(|existing| existing.id != id);

		if connectors.len() == before {
			return Err(Error::UnknownConnector { id: id.to_owned() });
		}

		self.results.write().retain(|result| result.connector_id != id);

		Ok(())
	}

	/// Snapshot of the registered connectors.
	pub fn connectors(&self) -> Vec<Connector> {
		self.connectors.read().clone()
	}

	/// Looks up a connector by id.
	pub fn connector_by_id(&self, id: &str) -> Option<Connector> {
		self.connectors.read().iter().find(|connector| connector.id == id).cloned()
	}

	/// Recorded results, newest first.
	pub fn results(&self, filter: &ResultFilter) -> Vec<PerformanceResult> {
		let results = self.results.read();
		let selected = results
			.iter()
			.rev()
			.filter(|result| {
				filter
					.connector_id
					.as_deref()
					.is_none_or(|id| result.connector_id == id)
			})
			.cloned();

		match filter.limit {
			Some(limit) => selected.take(limit).collect(),
			None => selected.collect(),
		}
	}

	/// Clears recorded results, optionally for one connector only.
	pub fn clear_results(&self, connector_id: Option<&str>) {
		match connector_id {
			Some(id) => self.results.write().retain(|result| result.connector_id != id),
			None => self.results.write().clear(),
		}
	}

	/// Probes one connector and records the timed outcome.
	///
	/// Local preconditions are checked before the clock starts: probing an unregistered id
	/// or probing without a stored access token is an error, not a recorded failure.
	pub async fn test(&self, id: &str) -> Result<PerformanceResult> {
		let span = FlowSpan::new(FlowKind::ConnectorProbe, "test");

		span.instrument(async move {
			let connector = self
				.connector_by_id(id)
				.ok_or_else(|| Error::UnknownConnector { id: id.to_owned() })?;

			if self.engine.store.tokens().await?.is_none() {
				return Err(Error::TokenMissing);
			}

			let timestamp = OffsetDateTime::now_utc();
			let started = Instant::now();
			let outcome = self.engine.fetch_resource(&connector.url).await;
			let duration_ms = started.elapsed().as_secs_f64() * 1_000.0;
			let result = match outcome {
				Ok(envelope) => result_from_envelope(&connector.id, timestamp, duration_ms, &envelope),
				Err(Error::Http { status, .. }) => PerformanceResult {
					connector_id: connector.id.clone(),
					timestamp,
					duration_ms,
					success: false,
					error: Some(format!("HTTP Error: {status} {}", status_text(status))),
					status_code: Some(status),
				},
				Err(error) => PerformanceResult {
					connector_id: connector.id.clone(),
					timestamp,
					duration_ms,
					success: false,
					error: Some(error.to_string()),
					status_code: None,
				},
			};

			self.results.write().push(result.clone());

			Ok(result)
		})
		.await
	}

	/// Probes every registered connector in registration order.
	///
	/// Individual probe failures are carried in their results; only precondition errors
	/// (no stored token) abort the run.
	pub async fn test_all(&self) -> Result<Vec<PerformanceResult>> {
		let ids: Vec<String> =
			self.connectors.read().iter().map(|connector| connector.id.clone()).collect();
		let mut results = Vec::with_capacity(ids.len());

		for id in ids {
			results.push(self.test(&id).await?);
		}

		Ok(results)
	}
}

fn result_from_envelope(
	connector_id: &str,
	timestamp: OffsetDateTime,
	duration_ms: f64,
	envelope: &ResponseEnvelope,
) -> PerformanceResult {
	let error = (!envelope.is_success())
		.then(|| format!("HTTP Error: {} {}", envelope.status, status_text(envelope.status)));

	PerformanceResult {
		connector_id: connector_id.to_owned(),
		timestamp,
		duration_ms,
		success: envelope.is_success(),
		error,
		status_code: Some(envelope.status),
	}
}

fn status_text(status: u16) -> &'static str {
	match status {
		200 => "OK",
		201 => "Created",
		204 => "No Content",
		301 => "Moved Permanently",
		302 => "Found",
		304 => "Not Modified",
		400 => "Bad Request",
		401 => "Unauthorized",
		403 => "Forbidden",
		404 => "Not Found",
		405 => "Method Not Allowed",
		408 => "Request Timeout",
		429 => "Too Many Requests",
		500 => "Internal Server Error",
		502 => "Bad Gateway",
		503 => "Service Unavailable",
		504 => "Gateway Timeout",
		_ => "Unknown Status",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn connector(id: &str) -> Connector {
		Connector {
			id: id.into(),
			name: format!("Connector {id}"),
			url: Url::parse("https://api.test/resource").expect("Connector URL fixture should parse."),
			description: None,
		}
	}

	fn result(connector_id: &str, success: bool) -> PerformanceResult {
		PerformanceResult {
			connector_id: connector_id.into(),
			timestamp: OffsetDateTime::now_utc(),
			duration_ms: 12.5,
			success,
			error: None,
			status_code: Some(if success { 200 } else { 503 }),
		}
	}

	fn probe() -> ConnectorProbe {
		// self
		use crate::{config::ClientConfiguration, http::TransportFuture, store::MemoryStore};

		struct NoTransport;
		impl crate::http::HttpTransport for NoTransport {
			fn execute(&self, _: crate::http::HttpRequest) -> TransportFuture<'_> {
				Box::pin(async { panic!("Registry operations must never touch the network.") })
			}
		}

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

		ConnectorProbe::new(FlowEngine::with_transport(
			std::sync::Arc::new(MemoryStore::default()),
			config,
			NoTransport,
		))
	}

	#[test]
	fn add_replaces_connectors_with_the_same_id() {
		let probe = probe();

		probe.add_connector(connector("a"));
		probe.add_connector(Connector { name: "Renamed".into(), ..connector("a") });

		let connectors = probe.connectors();

		assert_eq!(connectors.len(), 1);
		assert_eq!(connectors[0].name, "Renamed");
	}

	#[test]
	fn delete_cascades_to_recorded_results() {
		let probe = probe();

		probe.add_connector(connector("a"));
		probe.add_connector(connector("b"));
		probe.results.write().push(result("a", true));
		probe.results.write().push(result("b", false));

		probe.delete_connector("a").expect("Registered connector should delete.");

		assert!(probe.connector_by_id("a").is_none());

		let remaining = probe.results(&ResultFilter::default());

		assert_eq!(remaining.len(), 1);
		assert_eq!(remaining[0].connector_id, "b");
	}

	#[test]
	fn delete_unknown_connector_is_an_error() {
		let probe = probe();
		let err = probe
			.delete_connector("ghost")
			.expect_err("Deleting an unregistered connector should fail.");

		assert!(matches!(err, Error::UnknownConnector { id } if id == "ghost"));
	}

	#[test]
	fn results_filter_by_connector_and_limit_newest_first() {
		let probe = probe();

		probe.add_connector(connector("a"));

		for success in [true, false, true] {
			probe.results.write().push(result("a", success));
		}
		probe.results.write().push(result("b", true));

		let all = probe.results(&ResultFilter::default());

		assert_eq!(all.len(), 4);
		assert_eq!(all[0].connector_id, "b", "Newest result should come first.");

		let filtered = probe.results(&ResultFilter {
			connector_id: Some("a".into()),
			limit: Some(2),
		});

		assert_eq!(filtered.len(), 2);
		assert!(filtered.iter().all(|result| result.connector_id == "a"));
		assert!(filtered[0].success, "Newest `a` result was a success.");
	}

	#[test]
	fn clear_results_scopes_to_one_connector_when_asked() {
		let probe = probe();

		probe.results.write().push(result("a", true));
		probe.results.write().push(result("b", true));

		probe.clear_results(Some("a"));

		assert_eq!(probe.results(&ResultFilter::default()).len(), 1);

		probe.clear_results(None);

		assert!(probe.results(&ResultFilter::default()).is_empty());
	}

	#[test]
	fn status_text_covers_common_codes() {
		assert_eq!(status_text(200), "OK");
		assert_eq!(status_text(401), "Unauthorized");
		assert_eq!(status_text(503), "Service Unavailable");
		assert_eq!(status_text(999), "Unknown Status");
	}
}
