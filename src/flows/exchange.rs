//! Token exchanges for the three supported grants, over the direct or relayed route.
//!
//! Every grant normalizes through the same response parser and the same store update, so
//! the direct form-encoded route and the JSON-wrapped relay route yield identical
//! [`TokenSet`]s on the happy path. Non-2xx responses surface as [`Error::Http`] and leave
//! all prior session state untouched.

// self
use crate::{
	_prelude::*,
	auth::{TokenResponse, TokenSet},
	flows::{ExchangeRequest, FlowEngine},
	http::{HttpRequest, HttpResponse},
	obs::{FlowKind, FlowSpan},
};

/// Route used for token endpoint calls.
#[derive(Clone, Debug)]
pub enum TokenRoute {
	/// Form-url-encoded POST straight to the configured token endpoint.
	Direct,
	/// JSON-wrapped POST to a trusted relay endpoint that performs the form encoding
	/// server-side (`POST /api/oauth/token`).
	Relayed {
		/// Absolute URL of the relay's token-exchange endpoint.
		endpoint: Url,
	},
}

/// Grant selector plus the per-grant request material.
#[derive(Clone, Copy, Debug)]
enum Grant<'a> {
	AuthorizationCode { code: &'a str, code_verifier: &'a str },
	ClientCredentials { scope: &'a str },
	RefreshToken { refresh_token: &'a str },
}
impl Grant<'_> {
	const fn as_str(&self) -> &'static str {
		match self {
			Grant::AuthorizationCode { .. } => "authorization_code",
			Grant::ClientCredentials { .. } => "client_credentials",
			Grant::RefreshToken { .. } => "refresh_token",
		}
	}
}

/// JSON body posted to the relay's token-exchange endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayTokenRequest<'a> {
	token_url: &'a str,
	client_id: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	client_secret: Option<&'a str>,
	grant_type: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	code: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	redirect_uri: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	code_verifier: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	refresh_token: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	scope: Option<&'a str>,
}

impl FlowEngine {
	/// Exchanges a validated authorization code for a token set.
	///
	/// On success the pending session is cleared, making the code one-time-use: replaying
	/// the same callback afterwards fails validation with
	/// [`Error::SessionExpired`](crate::error::Error::SessionExpired). On failure the
	/// pending session stays intact so the exchange can be retried.
	pub async fn exchange_authorization_code(&self, request: ExchangeRequest) -> Result<TokenSet> {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "exchange_authorization_code");

		span.instrument(async move {
			let response = self
				.post_token_request(Grant::AuthorizationCode {
					code: &request.code,
					code_verifier: request.code_verifier.expose(),
				})
				.await?;
			let tokens = self.apply_token_response(response).await?;

			self.store.clear_pending_session().await?;

			Ok(tokens)
		})
		.await
	}

	/// Performs the `client_credentials` grant with the configured scope.
	pub async fn exchange_client_credentials(&self) -> Result<TokenSet> {
		let span = FlowSpan::new(FlowKind::ClientCredentials, "exchange_client_credentials");

		span.instrument(async move {
			let response = self
				.post_token_request(Grant::ClientCredentials {
					scope: &self.configuration().scope,
				})
				.await?;

			self.apply_token_response(response).await
		})
		.await
	}

	/// Refreshes the access token using the stored refresh token.
	///
	/// Refreshes are single-flight: the guard serializes concurrent attempts so they
	/// cannot race each other's store writes.
	pub async fn refresh(&self) -> Result<TokenSet> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh");

		span.instrument(async move {
			let _singleflight = self.refresh_guard().lock().await;

			self.refresh_locked().await
		})
		.await
	}

	/// Refreshes only if the token set still matches the access token that just failed.
	///
	/// Used by the relay's 401 recovery: concurrent fetches that each observe a 401
	/// collapse into one network refresh, and late waiters reuse the rotated set.
	pub(crate) async fn refresh_if_stale(&self, stale_access_token: &str) -> Result<TokenSet> {
		let _singleflight = self.refresh_guard().lock().await;

		if let Some(current) = self.store.tokens().await? {
			if current.access_token.expose() != stale_access_token {
				return Ok(current);
			}
		}

		self.refresh_locked().await
	}

	async fn refresh_locked(&self) -> Result<TokenSet> {
		let current = self.store.tokens().await?;
		let refresh_token = current
			.as_ref()
			.and_then(|tokens| tokens.refresh_token.clone())
			.ok_or(Error::NoRefreshToken)?;
		let response = self
			.post_token_request(Grant::RefreshToken { refresh_token: refresh_token.expose() })
			.await?;

		self.apply_token_response(response).await
	}

	/// Posts a grant to the token endpoint over the configured route and parses the body.
	async fn post_token_request(&self, grant: Grant<'_>) -> Result<TokenResponse> {
		let request = match self.token_route() {
			TokenRoute::Direct => self.direct_token_request(&grant)?,
			TokenRoute::Relayed { endpoint } => self.relayed_token_request(endpoint, &grant)?,
		};
		let response = self.transport.execute(request).await?;

		if !response.is_success() {
			return Err(Error::Http { status: response.status, body: response.body_string() });
		}

		parse_token_response(&response)
	}

	fn direct_token_request(&self, grant: &Grant<'_>) -> Result<HttpRequest> {
		let config = self.configuration();
		let token_url = config.token_url()?;
		let redirect_uri = config.redirect_uri.to_string();
		let mut fields: Vec<(&str, &str)> = vec![("grant_type", grant.as_str())];

		match *grant {
			Grant::AuthorizationCode { code, code_verifier } => {
				fields.push(("code", code));
				fields.push(("redirect_uri", &redirect_uri));
				fields.push(("client_id", &config.client_id));

				if let Some(secret) = &config.client_secret {
					fields.push(("client_secret", secret));
				}

				fields.push(("code_verifier", code_verifier));
			},
			Grant::ClientCredentials { scope } => {
				fields.push(("client_id", &config.client_id));

				if let Some(secret) = &config.client_secret {
					fields.push(("client_secret", secret));
				}

				fields.push(("scope", scope));
			},
			Grant::RefreshToken { refresh_token } => {
				fields.push(("refresh_token", refresh_token));
				fields.push(("client_id", &config.client_id));

				if let Some(secret) = &config.client_secret {
					fields.push(("client_secret", secret));
				}
			},
		}

		Ok(HttpRequest::post(token_url).form(&fields))
	}

	fn relayed_token_request(&self, endpoint: &Url, grant: &Grant<'_>) -> Result<HttpRequest> {
		let config = self.configuration();
		let token_url = config.token_url()?;
		let redirect_uri = config.redirect_uri.to_string();
		let mut body = RelayTokenRequest {
			token_url: token_url.as_str(),
			client_id: &config.client_id,
			client_secret: config.client_secret.as_deref(),
			grant_type: grant.as_str(),
			code: None,
			redirect_uri: None,
			code_verifier: None,
			refresh_token: None,
			scope: None,
		};

		match *grant {
			Grant::AuthorizationCode { code, code_verifier } => {
				body.code = Some(code);
				body.redirect_uri = Some(&redirect_uri);
				body.code_verifier = Some(code_verifier);
			},
			Grant::ClientCredentials { scope } => body.scope = Some(scope),
			Grant::RefreshToken { refresh_token } => body.refresh_token = Some(refresh_token),
		}

		HttpRequest::post(endpoint.clone()).json(&body)
	}

	/// Normalizes a parsed response into the store: whole-record token replacement with
	/// refresh-token retention against the previously stored set.
	async fn apply_token_response(&self, response: TokenResponse) -> Result<TokenSet> {
		let previous = self.store.tokens().await?;
		let tokens = TokenSet::from_response(response, previous.as_ref());

		self.store.set_tokens(tokens.clone()).await?;

		Ok(tokens)
	}
}

fn parse_token_response(response: &HttpResponse) -> Result<TokenResponse> {
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::TokenResponseParse { source, status: response.status })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn relay_body_omits_absent_fields() {
		let body = RelayTokenRequest {
			token_url: "https://idp.test/connect/token",
			client_id: "abc",
			client_secret: None,
			grant_type: "client_credentials",
			code: None,
			redirect_uri: None,
			code_verifier: None,
			refresh_token: None,
			scope: Some("openid"),
		};
		let payload = serde_json::to_string(&body).expect("Relay body should serialize.");

		assert_eq!(
			payload,
			"{\"tokenUrl\":\"https://idp.test/connect/token\",\"clientId\":\"abc\",\
			 \"grantType\":\"client_credentials\",\"scope\":\"openid\"}",
		);
	}

	#[test]
	fn malformed_token_json_reports_the_failing_path() {
		let response = HttpResponse {
			status: 200,
			headers: Vec::new(),
			body: b"{\"access_token\":42}".to_vec(),
		};
		let err = parse_token_response(&response)
			.expect_err("Non-string access_token should fail to parse.");

		assert!(matches!(err, Error::TokenResponseParse { status: 200, .. }));

		let source = std::error::Error::source(&err)
			.expect("Parse failures should expose the structured source.");

		assert!(source.to_string().contains("access_token"));
	}
}
