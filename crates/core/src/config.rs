//! Client configuration.
//!
//! [`ClientConfig`] is a plain owned value: build it with [`ClientConfig::new`]
//! and the `with_*` methods, or read it from the environment with
//! [`ClientConfig::from_env`]. It is validated when a [`Client`](crate::Client)
//! is built from it.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Platform the client talks to unless told otherwise.
pub const DEFAULT_BASE_URL: &str = "https://www.amigocloud.com";

/// Per-request timeout applied by default.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "AMIGOCLOUD_BASE_URL";
pub const ENV_CLIENT_ID: &str = "AMIGOCLOUD_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AMIGOCLOUD_CLIENT_SECRET";
pub const ENV_EMAIL: &str = "AMIGOCLOUD_EMAIL";
pub const ENV_PASSWORD: &str = "AMIGOCLOUD_PASSWORD";
pub const ENV_WEBSOCKET_PORT: &str = "AMIGOCLOUD_WEBSOCKET_PORT";

/// User credentials for the password grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	pub email: String,
	pub password: String,
}

impl Credentials {
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

impl std::fmt::Debug for Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Everything needed to build a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
	/// Platform root, e.g. `https://www.amigocloud.com`. Trailing slashes are ignored.
	pub base_url: String,
	/// OAuth application id of the composing application.
	pub client_id: String,
	/// OAuth application secret paired with `client_id`.
	pub client_secret: String,
	/// When set, [`Client::connect`](crate::Client::connect) logs in immediately.
	pub credentials: Option<Credentials>,
	/// Whether [`Client::connect`](crate::Client::connect) opens the event channel.
	pub use_websockets: bool,
	/// Overrides the port of the event channel endpoint.
	pub websocket_port: Option<u16>,
	/// Per-request timeout. `None` waits indefinitely.
	pub request_timeout: Option<Duration>,
}

impl ClientConfig {
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			credentials: None,
			use_websockets: true,
			websocket_port: None,
			request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	pub fn with_credentials(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
		self.credentials = Some(Credentials::new(email, password));
		self
	}

	pub fn with_websockets(mut self, enabled: bool) -> Self {
		self.use_websockets = enabled;
		self
	}

	pub fn with_websocket_port(mut self, port: u16) -> Self {
		self.websocket_port = Some(port);
		self
	}

	pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Reads the configuration from `AMIGOCLOUD_*` environment variables.
	///
	/// `AMIGOCLOUD_CLIENT_ID` and `AMIGOCLOUD_CLIENT_SECRET` are required.
	/// Credentials are picked up only when both `AMIGOCLOUD_EMAIL` and
	/// `AMIGOCLOUD_PASSWORD` are set.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
		let required = |key: &str| var(key).ok_or_else(|| Error::Config(format!("{key} is not set")));

		let mut config = Self::new(required(ENV_CLIENT_ID)?, required(ENV_CLIENT_SECRET)?);
		if let Some(base_url) = var(ENV_BASE_URL) {
			config.base_url = base_url;
		}
		if let (Some(email), Some(password)) = (var(ENV_EMAIL), var(ENV_PASSWORD)) {
			config.credentials = Some(Credentials::new(email, password));
		}
		if let Some(port) = var(ENV_WEBSOCKET_PORT) {
			let port = port
				.parse()
				.map_err(|e| Error::Config(format!("{ENV_WEBSOCKET_PORT}={port}: {e}")))?;
			config.websocket_port = Some(port);
		}
		Ok(config)
	}

	/// Validates the configuration and returns the base URL without trailing slashes.
	pub(crate) fn validated_base_url(&self) -> Result<String> {
		if self.client_id.trim().is_empty() {
			return Err(Error::Config("client id must not be empty".to_string()));
		}
		if self.client_secret.trim().is_empty() {
			return Err(Error::Config("client secret must not be empty".to_string()));
		}

		let base_url = self.base_url.trim().trim_end_matches('/');
		let parsed = Url::parse(base_url).map_err(|e| Error::Config(format!("invalid base URL '{base_url}': {e}")))?;
		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(Error::Config(format!("base URL must be http or https, got '{base_url}'")));
		}
		Ok(base_url.to_string())
	}
}

impl std::fmt::Debug for ClientConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientConfig")
			.field("base_url", &self.base_url)
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("credentials", &self.credentials)
			.field("use_websockets", &self.use_websockets)
			.field("websocket_port", &self.websocket_port)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}
