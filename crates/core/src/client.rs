//! The session client.

use std::sync::Arc;
use std::time::{Duration, Instant};

use amigo_protocol::{
	AUTHENTICATE_EVENT, AccessToken, AuthenticatePayload, CurrentUser, EVENT_NAMESPACE, PasswordGrant, ResourceId,
	WebsocketSession,
};
use amigo_runtime::{Connection, Event, EventChannel};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::{AuthState, bearer};
use crate::config::ClientConfig;
use crate::endpoints;
use crate::error::{Error, Result};
use crate::request::{Body, Payload, RequestOptions, Verb, resolve_url};

const USER_AGENT: &str = concat!("amigo-rs/", env!("CARGO_PKG_VERSION"));

/// Authenticated access to the platform's REST API and event channel.
///
/// State transitions ([`login`](Self::login), [`logout`](Self::logout)) take
/// `&mut self`; everything else borrows the client shared.
pub struct Client {
	http: reqwest::Client,
	base_url: String,
	api_url: String,
	client_id: String,
	client_secret: String,
	auth: AuthState,
	events: Option<Arc<dyn EventChannel>>,
}

impl Client {
	/// Builds a client without touching the network.
	///
	/// No event channel is attached; see [`connect`](Self::connect) and
	/// [`with_event_channel`](Self::with_event_channel).
	pub fn new(config: ClientConfig) -> Result<Self> {
		let base_url = config.validated_base_url()?;

		let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}
		let http = builder
			.build()
			.map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

		Ok(Self {
			http,
			api_url: format!("{base_url}{}", endpoints::API_PREFIX),
			base_url,
			client_id: config.client_id,
			client_secret: config.client_secret,
			auth: AuthState::Anonymous,
			events: None,
		})
	}

	/// Builds a client, opens the event channel when `use_websockets` is set,
	/// and logs in when credentials are configured.
	pub async fn connect(config: ClientConfig) -> Result<Self> {
		let use_websockets = config.use_websockets;
		let websocket_port = config.websocket_port;
		let credentials = config.credentials.clone();
		let mut client = Self::new(config)?;

		if use_websockets {
			let connection = Connection::connect(&client.base_url, websocket_port, EVENT_NAMESPACE).await?;
			tracing::debug!(sid = connection.sid(), "Event channel connected");
			client.events = Some(Arc::new(connection));
		}

		if let Some(credentials) = credentials {
			client.login(&credentials.email, &credentials.password).await?;
		}
		Ok(client)
	}

	/// Attaches an event channel, replacing any existing one.
	pub fn with_event_channel(mut self, channel: Arc<dyn EventChannel>) -> Self {
		self.events = Some(channel);
		self
	}

	pub fn event_channel(&self) -> Option<&Arc<dyn EventChannel>> {
		self.events.as_ref()
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// REST root, `base_url` followed by `/api/v1`.
	pub fn api_url(&self) -> &str {
		&self.api_url
	}

	pub fn resolve_url(&self, target: &str) -> String {
		resolve_url(&self.api_url, target)
	}

	pub fn auth_state(&self) -> &AuthState {
		&self.auth
	}

	/// Returns true if a token is held and has not expired.
	pub fn is_authenticated(&self) -> bool {
		self.auth.is_valid_at(Instant::now())
	}

	pub fn logged_user_id(&self) -> Option<&ResourceId> {
		self.auth.user_id()
	}

	pub fn token_expires_at(&self) -> Option<Instant> {
		self.auth.expires_at()
	}

	/// Exchanges user credentials for an access token and loads the user id.
	///
	/// The session only becomes authenticated once both the token exchange and
	/// the `/me` lookup succeed. Any failure leaves it anonymous, even if it
	/// was logged in before.
	pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
		self.auth = AuthState::Anonymous;

		let token_url = self.resolve_url(endpoints::ACCESS_TOKEN);
		let grant = PasswordGrant::new(&self.client_id, &self.client_secret, email, password);
		let options = RequestOptions::new().body(Body::Form(grant.into_form()));
		let payload = self.dispatch(Verb::Post, token_url.clone(), options, None).await?;
		let token: AccessToken = decode(&token_url, payload)?;
		let issued_at = Instant::now();

		let me_url = self.resolve_url(endpoints::CURRENT_USER);
		let payload = self
			.dispatch(Verb::Get, me_url.clone(), RequestOptions::new(), Some(bearer(&token.access_token)))
			.await?;
		let user: CurrentUser = decode(&me_url, payload)?;

		tracing::info!(user_id = %user.id, expires_in = token.expires_in, "Logged in");
		let lifetime = token.lifetime();
		self.auth = AuthState::authenticated(token.access_token, issued_at, lifetime, user.id);
		Ok(())
	}

	/// Forgets the token and user id. Nothing is sent to the server.
	pub fn logout(&mut self) {
		if let Some(user_id) = self.auth.user_id() {
			tracing::info!(%user_id, "Logged out");
		}
		self.auth = AuthState::Anonymous;
	}

	pub async fn get(&self, url: &str, query: &[(&str, &str)], raw: bool) -> Result<Payload> {
		let options = RequestOptions::new().query(query.iter().copied()).raw(raw);
		self.request(Verb::Get, url, options).await
	}

	pub async fn post(&self, url: &str, body: impl Into<Option<Body>>, raw: bool) -> Result<Payload> {
		self.request(Verb::Post, url, RequestOptions::new().body(body).raw(raw))
			.await
	}

	pub async fn put(&self, url: &str, body: impl Into<Option<Body>>, raw: bool) -> Result<Payload> {
		self.request(Verb::Put, url, RequestOptions::new().body(body).raw(raw))
			.await
	}

	pub async fn patch(&self, url: &str, body: impl Into<Option<Body>>, raw: bool) -> Result<Payload> {
		self.request(Verb::Patch, url, RequestOptions::new().body(body).raw(raw))
			.await
	}

	pub async fn delete(&self, url: &str, body: impl Into<Option<Body>>, raw: bool) -> Result<Payload> {
		self.request(Verb::Delete, url, RequestOptions::new().body(body).raw(raw))
			.await
	}

	/// Sends an authorized request and decodes the response.
	///
	/// `url` is resolved with [`resolve_url`](Self::resolve_url). Mutating
	/// verbs without a body send `{}` as JSON.
	pub async fn request(&self, verb: Verb, url: &str, options: RequestOptions) -> Result<Payload> {
		let authorization = self.auth.authorization_header(Instant::now())?;
		self.dispatch(verb, self.resolve_url(url), options, authorization)
			.await
	}

	async fn dispatch(
		&self,
		verb: Verb,
		url: String,
		options: RequestOptions,
		authorization: Option<String>,
	) -> Result<Payload> {
		tracing::debug!(%verb, %url, "Dispatching request");

		let mut builder = self.http.request(verb.method(), &url);
		if !options.query.is_empty() {
			builder = builder.query(&options.query);
		}
		if let Some(value) = authorization {
			builder = builder.header(AUTHORIZATION, value);
		}
		let body = options.body.or_else(|| verb.sends_body().then(Body::default));
		builder = match body {
			Some(Body::Json(value)) => builder.json(&value),
			Some(Body::Form(fields)) => builder.form(&fields),
			None => builder,
		};

		let response = builder.send().await.map_err(|source| Error::Transport {
			url: url.clone(),
			source,
		})?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(|source| Error::Transport {
			url: url.clone(),
			source,
		})?;

		if status.is_client_error() || status.is_server_error() {
			tracing::debug!(%verb, %url, status = status.as_u16(), "Request failed");
			return Err(Error::http(status, url, bytes));
		}

		if options.raw {
			Ok(Payload::Raw(bytes))
		} else if bytes.is_empty() {
			Ok(Payload::Empty)
		} else {
			serde_json::from_slice(&bytes)
				.map(Payload::Json)
				.map_err(|source| Error::Decode { url, source })
		}
	}

	async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
		let payload = self.request(Verb::Get, path, RequestOptions::new()).await?;
		decode(&self.resolve_url(path), payload)
	}

	/// Subscribes the event channel to the logged-in user's events.
	pub async fn listen_user_events(&self) -> Result<()> {
		let user_id = self.auth.require_login(Instant::now())?.clone();
		let channel = self.channel()?;

		let session: WebsocketSession = self.fetch(endpoints::USER_WEBSOCKET_SESSION).await?;
		authenticate(channel, AuthenticatePayload::user(user_id, session.websocket_session)).await
	}

	/// Subscribes the event channel to events of one dataset.
	pub async fn listen_dataset_events(
		&self,
		owner: impl Into<ResourceId>,
		project: impl Into<ResourceId>,
		dataset: impl Into<ResourceId>,
	) -> Result<()> {
		let user_id = self.auth.require_login(Instant::now())?.clone();
		let channel = self.channel()?;

		let dataset = dataset.into();
		let path = endpoints::dataset_websocket_session(&owner.into(), &project.into(), &dataset);
		let session: WebsocketSession = self.fetch(&path).await?;
		authenticate(
			channel,
			AuthenticatePayload::dataset(user_id, dataset, session.websocket_session),
		)
		.await
	}

	/// Registers `handler` for `event`, replacing any previous handler for that name.
	pub fn add_callback<F>(&self, event: &str, handler: F) -> Result<()>
	where
		F: Fn(&Event) + Send + Sync + 'static,
	{
		self.channel()?.on(event, Arc::new(handler));
		Ok(())
	}

	/// Processes events until `duration` elapses, or forever when `None`.
	pub async fn start_listening(&self, duration: Option<Duration>) -> Result<()> {
		self.channel()?.wait(duration).await?;
		Ok(())
	}

	fn channel(&self) -> Result<&Arc<dyn EventChannel>> {
		self.events.as_ref().ok_or(Error::EventChannelDisabled)
	}
}

impl std::fmt::Debug for Client {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Client")
			.field("base_url", &self.base_url)
			.field("client_id", &self.client_id)
			.field("auth", &self.auth)
			.field("event_channel", &self.events.is_some())
			.finish()
	}
}

fn decode<T: DeserializeOwned>(url: &str, payload: Payload) -> Result<T> {
	payload.deserialize().map_err(|source| Error::Decode {
		url: url.to_string(),
		source,
	})
}

async fn authenticate(channel: &Arc<dyn EventChannel>, payload: AuthenticatePayload) -> Result<()> {
	let payload: Value = serde_json::to_value(&payload).map_err(amigo_runtime::Error::from)?;
	tracing::debug!(datasetid = ?payload.get("datasetid"), "Authenticating event channel");
	channel.emit(AUTHENTICATE_EVENT, payload).await?;
	Ok(())
}
