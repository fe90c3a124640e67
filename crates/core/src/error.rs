//! Error types for the session client.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A response with a 4xx or 5xx status, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedResponse {
	pub status: StatusCode,
	pub url: String,
	pub body: Bytes,
}

impl FailedResponse {
	/// Body decoded as UTF-8, lossily.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	fn body_suffix(&self) -> String {
		let text = self.text();
		if text.is_empty() { String::new() } else { format!("\n{text}") }
	}
}

/// Errors returned by [`Client`](crate::Client).
#[derive(Debug, Error)]
pub enum Error {
	/// The platform answered with an error status.
	#[error("{message}{}", .response.body_suffix())]
	Http {
		message: String,
		response: Box<FailedResponse>,
	},

	/// A token is held but it is past its expiry.
	#[error("Your access token has expired. Please log in again.")]
	AuthExpired,

	/// The operation needs a logged-in session.
	#[error("You must be logged in to start receiving websocket events.")]
	NotLoggedIn,

	/// The request never produced a response.
	#[error("request to {url} failed: {source}")]
	Transport {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	/// A successful response whose body is not the expected JSON.
	#[error("unexpected response body from {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	/// The client was built without an event channel.
	#[error("the event channel is disabled for this client")]
	EventChannelDisabled,

	#[error(transparent)]
	EventChannel(#[from] amigo_runtime::Error),

	#[error("invalid configuration: {0}")]
	Config(String),
}

impl Error {
	pub(crate) fn http(status: StatusCode, url: String, body: Bytes) -> Self {
		let kind = if status.is_server_error() { "Server Error" } else { "Client Error" };
		let reason = status.canonical_reason().unwrap_or("Unknown");
		Error::Http {
			message: format!("{} {kind}: {reason} for url: {url}", status.as_u16()),
			response: Box::new(FailedResponse { status, url, body }),
		}
	}

	/// Status of the failed response, for HTTP errors.
	pub fn status(&self) -> Option<StatusCode> {
		self.response().map(|response| response.status)
	}

	pub fn response(&self) -> Option<&FailedResponse> {
		match self {
			Error::Http { response, .. } => Some(response),
			_ => None,
		}
	}

	pub fn is_auth_expired(&self) -> bool {
		matches!(self, Error::AuthExpired)
	}

	pub fn is_not_logged_in(&self) -> bool {
		matches!(self, Error::NotLoggedIn)
	}

	/// Returns true if logging in again may fix this error.
	pub fn requires_login(&self) -> bool {
		self.is_auth_expired() || self.is_not_logged_in() || self.status() == Some(StatusCode::UNAUTHORIZED)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn http_error_message_carries_status_url_and_body() {
		let err = Error::http(
			StatusCode::NOT_FOUND,
			"https://example.test/api/v1/nope".to_string(),
			Bytes::from_static(br#"{"detail":"Not found."}"#),
		);

		assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
		assert_eq!(
			err.to_string(),
			"404 Client Error: Not Found for url: https://example.test/api/v1/nope\n{\"detail\":\"Not found.\"}"
		);
		assert_eq!(err.response().unwrap().text(), r#"{"detail":"Not found."}"#);
	}

	#[test]
	fn empty_body_adds_no_suffix() {
		let err = Error::http(StatusCode::BAD_GATEWAY, "u".to_string(), Bytes::new());
		assert_eq!(err.to_string(), "502 Server Error: Bad Gateway for url: u");
	}

	#[test]
	fn login_related_errors() {
		assert!(Error::AuthExpired.requires_login());
		assert!(Error::NotLoggedIn.requires_login());
		assert!(Error::http(StatusCode::UNAUTHORIZED, "u".to_string(), Bytes::new()).requires_login());
		assert!(!Error::http(StatusCode::FORBIDDEN, "u".to_string(), Bytes::new()).requires_login());
		assert!(!Error::EventChannelDisabled.requires_login());
		assert_eq!(Error::AuthExpired.status(), None);
	}
}
