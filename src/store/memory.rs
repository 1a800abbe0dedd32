//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{PendingAuthorizationSession, TokenSet},
	store::{SessionSnapshot, SessionStore, StoreFuture},
};

type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

/// Thread-safe storage backend that keeps session state in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SharedSnapshot);
impl SessionStore for MemoryStore {
	fn tokens(&self) -> StoreFuture<'_, Option<TokenSet>> {
		let snapshot = self.0.clone();

		Box::pin(async move { Ok(snapshot.read().tokens.clone()) })
	}

	fn set_tokens(&self, tokens: TokenSet) -> StoreFuture<'_, ()> {
		let snapshot = self.0.clone();

		Box::pin(async move {
			snapshot.write().tokens = Some(tokens);

			Ok(())
		})
	}

	fn pending_session(&self) -> StoreFuture<'_, Option<PendingAuthorizationSession>> {
		let snapshot = self.0.clone();

		Box::pin(async move { Ok(snapshot.read().pending.clone()) })
	}

	fn set_pending_session(&self, pending: PendingAuthorizationSession) -> StoreFuture<'_, ()> {
		let snapshot = self.0.clone();

		Box::pin(async move {
			snapshot.write().pending = Some(pending);

			Ok(())
		})
	}

	fn clear_pending_session(&self) -> StoreFuture<'_, ()> {
		let snapshot = self.0.clone();

		Box::pin(async move {
			snapshot.write().pending = None;

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let snapshot = self.0.clone();

		Box::pin(async move {
			*snapshot.write() = SessionSnapshot::default();

			Ok(())
		})
	}
}
