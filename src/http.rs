//! Transport primitives shared by the token exchanges and the resource relay.
//!
//! [`HttpTransport`] is the engine's only dependency on an HTTP stack. It trades in plain
//! value types — [`HttpRequest`] / [`HttpResponse`] — so the token endpoint, the relay
//! endpoints, and arbitrary upstream resources all ride the same seam, and tests can
//! substitute a scripted transport without any network. Response bodies stay raw bytes
//! end to end; nothing on this seam re-encodes them.

// self
use crate::{_prelude::*, error::ConfigError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Abstraction over HTTP transports used for every outbound request.
///
/// Implementations resolve to [`HttpResponse`] for *any* upstream status; a non-2xx
/// answer is data, not a transport failure. Only failures that occur before a response
/// is received (DNS, TCP, TLS, timeouts) surface as [`Error::Network`].
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// Executes the request, resolving to the raw response.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// HTTP methods used by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
}

/// Minimal outbound request representation handed to transports.
#[derive(Clone, Debug)]
pub struct HttpRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Absolute target URL.
	pub url: Url,
	/// Header name/value pairs, sent in order.
	pub headers: Vec<(String, String)>,
	/// Raw request body bytes.
	pub body: Vec<u8>,
}
impl HttpRequest {
	/// Starts a `GET` request.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, headers: Vec::new(), body: Vec::new() }
	}

	/// Starts a `POST` request.
	pub fn post(url: Url) -> Self {
		Self { method: HttpMethod::Post, url, headers: Vec::new(), body: Vec::new() }
	}

	/// Appends a header pair.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Attaches an `Authorization: Bearer` header.
	pub fn bearer(self, token: &str) -> Self {
		self.header("authorization", format!("Bearer {token}"))
	}

	/// Sets a `application/x-www-form-urlencoded` body from the provided fields.
	pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in fields {
			serializer.append_pair(key, value);
		}

		self.body = serializer.finish().into_bytes();

		self.header("content-type", "application/x-www-form-urlencoded")
	}

	/// Sets a JSON body from the provided value.
	pub fn json<T>(mut self, value: &T) -> Result<Self>
	where
		T: Serialize,
	{
		self.body = serde_json::to_vec(value)
			.map_err(|source| ConfigError::RequestEncode { source })?;

		Ok(self.header("content-type", "application/json"))
	}
}

/// Raw response captured from a transport.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Header name/value pairs as received.
	pub headers: Vec<(String, String)>,
	/// Raw body bytes, never re-encoded.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body interpreted as lossy UTF-8, for error envelopes and diagnostics.
	pub fn body_string(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests must not follow redirects; configure any custom [`ReqwestClient`]
/// accordingly before passing it in.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = match request.method {
				HttpMethod::Get => client.get(request.url),
				HttpMethod::Post => client.post(request.url),
			};

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if !request.body.is_empty() {
				builder = builder.body(request.body);
			}

			let response = builder.send().await.map_err(Error::network)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
				})
				.collect();
			let body = response.bytes().await.map_err(Error::network)?.to_vec();

			Ok(HttpResponse { status, headers, body })
		})
	}
}
