//! Session authentication state.

use std::time::{Duration, Instant};

use amigo_protocol::ResourceId;

use crate::error::{Error, Result};

/// Upper bound applied to `expires_in` so the expiry instant cannot overflow.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Authentication state of a session.
///
/// The token, its expiry and the user id only exist together.
#[derive(Clone, Default)]
pub enum AuthState {
	#[default]
	Anonymous,
	Authenticated {
		token: String,
		expires_at: Instant,
		user_id: ResourceId,
	},
}

impl AuthState {
	/// State after a token issued at `issued_at` for `lifetime`.
	pub fn authenticated(token: String, issued_at: Instant, lifetime: Duration, user_id: ResourceId) -> Self {
		AuthState::Authenticated {
			token,
			expires_at: issued_at + lifetime.min(MAX_TOKEN_LIFETIME),
			user_id,
		}
	}

	/// `Authorization` header value for a request made at `now`.
	///
	/// No token yields `None`; an expired token is an error rather than an
	/// anonymous request.
	pub fn authorization_header(&self, now: Instant) -> Result<Option<String>> {
		match self {
			AuthState::Anonymous => Ok(None),
			AuthState::Authenticated { token, expires_at, .. } if now < *expires_at => {
				Ok(Some(bearer(token)))
			}
			AuthState::Authenticated { .. } => Err(Error::AuthExpired),
		}
	}

	/// User id of a session that is usable at `now`.
	pub fn require_login(&self, now: Instant) -> Result<&ResourceId> {
		match self {
			AuthState::Anonymous => Err(Error::NotLoggedIn),
			AuthState::Authenticated {
				expires_at, user_id, ..
			} if now < *expires_at => Ok(user_id),
			AuthState::Authenticated { .. } => Err(Error::AuthExpired),
		}
	}

	pub fn is_valid_at(&self, now: Instant) -> bool {
		matches!(self, AuthState::Authenticated { expires_at, .. } if now < *expires_at)
	}

	pub fn user_id(&self) -> Option<&ResourceId> {
		match self {
			AuthState::Authenticated { user_id, .. } => Some(user_id),
			AuthState::Anonymous => None,
		}
	}

	pub fn expires_at(&self) -> Option<Instant> {
		match self {
			AuthState::Authenticated { expires_at, .. } => Some(*expires_at),
			AuthState::Anonymous => None,
		}
	}
}

pub(crate) fn bearer(token: &str) -> String {
	format!("Bearer {token}")
}

impl std::fmt::Debug for AuthState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			AuthState::Anonymous => f.write_str("Anonymous"),
			AuthState::Authenticated {
				expires_at, user_id, ..
			} => f
				.debug_struct("Authenticated")
				.field("token", &"<redacted>")
				.field("expires_at", expires_at)
				.field("user_id", user_id)
				.finish(),
		}
	}
}
