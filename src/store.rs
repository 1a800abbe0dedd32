//! Storage contracts and built-in session store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{PendingAuthorizationSession, TokenSet},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable persistence contract for the single-session client.
///
/// Implementations hold exactly one token set and at most one pending authorization
/// session. Every mutation is a whole-record replacement so a concurrent reader never
/// observes a half-written value.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Fetches the current token set, if one is stored.
	fn tokens(&self) -> StoreFuture<'_, Option<TokenSet>>;

	/// Replaces the token set wholesale.
	fn set_tokens(&self, tokens: TokenSet) -> StoreFuture<'_, ()>;

	/// Fetches the pending authorization session, if one exists.
	fn pending_session(&self) -> StoreFuture<'_, Option<PendingAuthorizationSession>>;

	/// Replaces the pending authorization session, overwriting any stale one.
	fn set_pending_session(&self, pending: PendingAuthorizationSession) -> StoreFuture<'_, ()>;

	/// Removes the pending authorization session, keeping tokens intact.
	fn clear_pending_session(&self) -> StoreFuture<'_, ()>;

	/// Tears down all session state (logout or configuration change).
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Complete session state snapshot held by a store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Issued token set, if any.
	pub tokens: Option<TokenSet>,
	/// Pending authorization session, if any.
	pub pending: Option<PendingAuthorizationSession>,
}
