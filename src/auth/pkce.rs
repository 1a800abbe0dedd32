//! PKCE verifier/challenge generation (RFC 7636 `S256`).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::TokenSecret};

const ENTROPY_BYTES: usize = 32;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Verifier/challenge pair created once per authorization attempt and consumed exactly once.
#[derive(Clone)]
pub struct PkceMaterial {
	verifier: TokenSecret,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkceMaterial {
	/// Generates fresh material from 32 bytes of CSPRNG entropy.
	///
	/// The verifier is the base64url (no padding) encoding of the raw bytes, which yields 43
	/// characters of the RFC 3986 unreserved charset; the challenge is the base64url encoding
	/// of the verifier's SHA-256 digest.
	pub fn generate() -> Self {
		let verifier = random_urlsafe(ENTROPY_BYTES);
		let challenge = compute_challenge(&verifier);

		Self {
			verifier: TokenSecret::new(verifier),
			challenge,
			method: PkceCodeChallengeMethod::S256,
		}
	}

	/// Secret code verifier sent with the token exchange.
	pub fn verifier(&self) -> &TokenSecret {
		&self.verifier
	}

	/// Code challenge embedded into the authorization URL.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (currently always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}
}
impl Debug for PkceMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkceMaterial")
			.field("verifier", &self.verifier)
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

/// Computes the `S256` challenge for a verifier.
pub fn compute_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Base64url-encodes `len` bytes drawn from the thread-local CSPRNG.
///
/// Shared by the PKCE verifier and the authorization `state` nonce so both carry the
/// same entropy guarantee.
pub(crate) fn random_urlsafe(len: usize) -> String {
	let mut bytes = vec![0_u8; len];

	rand::rng().fill_bytes(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}
