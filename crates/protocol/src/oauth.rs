//! OAuth2 password-grant exchange.
//!
//! The platform's token endpoint speaks the classic form-encoded contract:
//! the client posts [`PasswordGrant`] as `application/x-www-form-urlencoded`
//! and receives an [`AccessToken`] as JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Value of the `grant_type` field for the resource-owner password flow.
pub const PASSWORD_GRANT: &str = "password";

/// Form body for the password-grant token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordGrant {
	/// OAuth application id issued to the composing application.
	pub client_id: String,
	/// OAuth application secret paired with `client_id`.
	pub client_secret: String,
	/// Always [`PASSWORD_GRANT`].
	pub grant_type: String,
	/// Account identity, usually the e-mail address.
	pub username: String,
	/// Account password.
	pub password: String,
}

impl PasswordGrant {
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			grant_type: PASSWORD_GRANT.to_string(),
			username: username.into(),
			password: password.into(),
		}
	}

	/// Flattens the grant into ordered form fields.
	pub fn into_form(self) -> Vec<(String, String)> {
		vec![
			("client_id".to_string(), self.client_id),
			("client_secret".to_string(), self.client_secret),
			("grant_type".to_string(), self.grant_type),
			("username".to_string(), self.username),
			("password".to_string(), self.password),
		]
	}
}

/// Successful token response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer credential for subsequent requests.
	pub access_token: String,
	/// Lifetime of `access_token` in seconds, counted from issue.
	pub expires_in: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
}

impl AccessToken {
	/// Lifetime as a [`Duration`].
	pub fn lifetime(&self) -> Duration {
		Duration::from_secs(self.expires_in)
	}
}

// Tokens must never end up in logs through `{:?}`.
impl std::fmt::Debug for AccessToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.finish()
	}
}
