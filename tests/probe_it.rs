#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use pkce_relay::{
	_preludet::*,
	auth::{TokenSecret, TokenSet},
	probe::{Connector, ConnectorProbe, ResultFilter},
	store::{MemoryStore, SessionStore},
};

async fn seed_tokens(store: &MemoryStore, access: &str) {
	let tokens = TokenSet {
		access_token: TokenSecret::new(access),
		refresh_token: None,
		token_type: "Bearer".into(),
		expires_in: 3600,
		scope: Some("openid profile".into()),
		issued_at: OffsetDateTime::now_utc(),
	};

	store.set_tokens(tokens).await.expect("Failed to seed the token set.");
}

fn connector(server: &MockServer, id: &str, path: &str) -> Connector {
	Connector {
		id: id.into(),
		name: format!("Connector {id}"),
		url: Url::parse(&server.url(path)).expect("Connector URL fixture should parse."),
		description: None,
	}
}

#[tokio::test]
async fn a_reachable_connector_records_a_timed_success() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_test_engine(test_configuration(&server.base_url()));

	seed_tokens(&store, "access-live").await;

	let probe = ConnectorProbe::new(engine);

	probe.add_connector(connector(&server, "crm", "/connectors/crm"));

	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/connectors/crm")
				.header("authorization", "Bearer access-live");
			then.status(200).body("ok");
		})
		.await;
	let result = probe.test("crm").await.expect("Probing a reachable connector should succeed.");

	mock.assert_async().await;

	assert!(result.success);
	assert_eq!(result.connector_id, "crm");
	assert_eq!(result.status_code, Some(200));
	assert!(result.error.is_none());
	assert!(result.duration_ms >= 0.0);

	let log = probe.results(&ResultFilter::default());

	assert_eq!(log.len(), 1);
	assert!(log[0].success);
}

#[tokio::test]
async fn an_upstream_failure_is_recorded_not_raised() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_test_engine(test_configuration(&server.base_url()));

	seed_tokens(&store, "access-live").await;

	let probe = ConnectorProbe::new(engine);

	probe.add_connector(connector(&server, "down", "/connectors/down"));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/connectors/down");
			then.status(503).body("maintenance");
		})
		.await;

	let result = probe.test("down").await.expect("A failing upstream is a result, not an error.");

	assert!(!result.success);
	assert_eq!(result.status_code, Some(503));
	assert_eq!(result.error.as_deref(), Some("HTTP Error: 503 Service Unavailable"));
}

#[tokio::test]
async fn probing_requires_a_registered_connector_and_a_stored_token() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_test_engine(test_configuration(&server.base_url()));
	let probe = ConnectorProbe::new(engine);
	let err = probe.test("ghost").await.expect_err("Unknown connectors should be rejected.");

	assert!(matches!(err, Error::UnknownConnector { id } if id == "ghost"));

	probe.add_connector(connector(&server, "crm", "/connectors/crm"));

	let err = probe.test("crm").await.expect_err("Probing without a token should fail.");

	assert!(matches!(err, Error::TokenMissing));
	assert!(
		probe.results(&ResultFilter::default()).is_empty(),
		"Precondition failures must not pollute the result log.",
	);

	seed_tokens(&store, "access-late").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/connectors/crm");
			then.status(200).body("ok");
		})
		.await;

	probe.test("crm").await.expect("Probing should succeed once a token exists.");
}

#[tokio::test]
async fn test_all_probes_every_connector_and_tolerates_failures() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_test_engine(test_configuration(&server.base_url()));

	seed_tokens(&store, "access-live").await;

	let probe = ConnectorProbe::new(engine);

	probe.add_connector(connector(&server, "alpha", "/connectors/alpha"));
	probe.add_connector(connector(&server, "beta", "/connectors/beta"));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/connectors/alpha");
			then.status(200).body("ok");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/connectors/beta");
			then.status(500).body("boom");
		})
		.await;

	let results = probe.test_all().await.expect("Sweeping all connectors should succeed.");

	assert_eq!(results.len(), 2);
	assert_eq!(results[0].connector_id, "alpha");
	assert!(results[0].success);
	assert_eq!(results[1].connector_id, "beta");
	assert!(!results[1].success);
	assert_eq!(results[1].error.as_deref(), Some("HTTP Error: 500 Internal Server Error"));

	let log = probe.results(&ResultFilter { connector_id: Some("beta".into()), limit: None });

	assert_eq!(log.len(), 1);
	assert_eq!(log[0].status_code, Some(500));
}
