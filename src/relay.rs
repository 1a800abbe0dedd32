//! Credential-forwarding resource fetches with transparent 401 recovery.
//!
//! The relay attaches the stored access token as a bearer credential, forwards the request
//! either straight to the resource or through a trusted proxy endpoint, and retries exactly
//! once after a refresh when the resource answers 401. Responses come back as
//! [`ResponseEnvelope`]s with hop-by-hop headers stripped, so non-2xx statuses are data for
//! the caller rather than errors.

// self
use crate::{
	_prelude::*,
	flows::FlowEngine,
	http::{HttpRequest, HttpResponse},
	obs::{FlowKind, FlowSpan},
};

/// Headers that describe the connection between two hops, not the payload. Forwarding them
/// to the caller would misrepresent the already-decoded body.
const HOP_BY_HOP_HEADERS: [&str; 10] = [
	"content-encoding",
	"content-length",
	"transfer-encoding",
	"connection",
	"keep-alive",
	"proxy-authenticate",
	"proxy-authorization",
	"te",
	"trailer",
	"upgrade",
];

/// Route used for protected resource fetches.
#[derive(Clone, Debug)]
pub enum ResourceRoute {
	/// GET straight to the resource URL.
	Direct,
	/// POST `{"url": ...}` to a trusted forwarding endpoint (`POST /api/proxy`) which
	/// performs the upstream GET server-side.
	Relayed {
		/// Absolute URL of the forwarding endpoint.
		endpoint: Url,
	},
}

/// Upstream response handed back to the caller after sanitization.
#[derive(Clone, Debug)]
pub struct ResponseEnvelope {
	/// Upstream HTTP status code.
	pub status: u16,
	/// End-to-end response headers; hop-by-hop entries are stripped.
	pub headers: Vec<(String, String)>,
	/// Raw response body, binary-safe.
	pub body: Vec<u8>,
}
impl ResponseEnvelope {
	/// Whether the upstream status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// JSON body posted to the relay's forwarding endpoint.
#[derive(Debug, Serialize)]
struct RelayProxyRequest<'a> {
	url: &'a str,
}

fn is_hop_by_hop(name: &str) -> bool {
	HOP_BY_HOP_HEADERS.iter().any(|hop| name.eq_ignore_ascii_case(hop))
}

fn sanitize(response: HttpResponse) -> ResponseEnvelope {
	let headers =
		response.headers.into_iter().filter(|(name, _)| !is_hop_by_hop(name)).collect();

	ResponseEnvelope { status: response.status, headers, body: response.body }
}

impl FlowEngine {
	/// Fetches a protected resource with the stored access token attached.
	///
	/// A 401 from the upstream triggers a single refresh-and-retry when a refresh token is
	/// available; a second 401 after the retry is a hard [`Error::Http`] so callers don't
	/// loop. Every other status, success or failure, is returned in the envelope.
	pub async fn fetch_resource(&self, url: &Url) -> Result<ResponseEnvelope> {
		let span = FlowSpan::new(FlowKind::ResourceFetch, "fetch_resource");

		span.instrument(async move {
			let tokens = self.store.tokens().await?.ok_or(Error::TokenMissing)?;
			let response =
				self.dispatch_resource(url, tokens.access_token.expose()).await?;

			if response.status != 401 {
				return Ok(sanitize(response));
			}

			let can_refresh = tokens.refresh_token.is_some();

			if !can_refresh {
				return Ok(sanitize(response));
			}

			let rotated = self.refresh_if_stale(tokens.access_token.expose()).await?;
			let retried =
				self.dispatch_resource(url, rotated.access_token.expose()).await?;

			if retried.status == 401 {
				return Err(Error::Http {
					status: retried.status,
					body: retried.body_string(),
				});
			}

			Ok(sanitize(retried))
		})
		.await
	}

	/// Fetches the configured protected resource.
	pub async fn fetch_protected_resource(&self) -> Result<ResponseEnvelope> {
		let url = self.configuration().protected_resource_url.clone();

		self.fetch_resource(&url).await
	}

	async fn dispatch_resource(&self, url: &Url, access_token: &str) -> Result<HttpResponse> {
		let request = match self.resource_route() {
			ResourceRoute::Direct => HttpRequest::get(url.clone()).bearer(access_token),
			ResourceRoute::Relayed { endpoint } => HttpRequest::post(endpoint.clone())
				.bearer(access_token)
				.json(&RelayProxyRequest { url: url.as_str() })?,
		};

		self.transport.execute(request).await
	}
}
