//! In-process mock of the platform's REST API, plus a recording event channel.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use amigo::runtime::{ChannelFuture, EventChannel, EventHandler, HandlerRegistry};
use amigo::{Client, ClientConfig, Event};
use axum::{Json, Router};
use axum::body::Bytes;
use axum::extract::{Form, Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";

/// Password that yields a long-lived token for user 42.
pub const GOOD_PASSWORD: &str = "good";
/// Password that yields a token which is already expired.
pub const EXPIRING_PASSWORD: &str = "expiring";
/// Password that yields a token `/me` refuses with a 500.
pub const BROKEN_ME_PASSWORD: &str = "no-me";

pub const TOKEN: &str = "t";
const BROKEN_TOKEN: &str = "broken";

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
	pub method: String,
	pub path: String,
	pub authorization: Option<String>,
	pub content_type: Option<String>,
}

#[derive(Default)]
struct MockState {
	requests: Mutex<Vec<Recorded>>,
	last_token_form: Mutex<Option<HashMap<String, String>>>,
}

pub struct TestServer {
	addr: SocketAddr,
	state: Arc<MockState>,
	shutdown: Option<oneshot::Sender<()>>,
	handle: JoinHandle<()>,
}

impl TestServer {
	pub async fn start() -> Self {
		init_tracing();

		let state = Arc::new(MockState::default());
		let app = Router::new()
			.route("/api/v1/oauth2/access_token", post(access_token))
			.route("/api/v1/me", get(me))
			.route("/api/v1/me/start_websocket_session", get(user_session))
			.route(
				"/api/v1/users/{owner}/projects/{project}/datasets/{dataset}/start_websocket_session",
				get(dataset_session),
			)
			.route("/api/v1/echo", post(echo).put(echo).patch(echo).delete(echo))
			.route(
				"/api/v1/inspect",
				get(inspect).post(inspect).put(inspect).patch(inspect).delete(inspect),
			)
			.route("/api/v1/empty", get(|| async { StatusCode::NO_CONTENT }))
			.route("/api/v1/not-json", get(|| async { "definitely not json" }))
			.route(
				"/api/v1/teapot",
				get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }),
			)
			.layer(middleware::from_fn_with_state(Arc::clone(&state), record))
			.with_state(Arc::clone(&state));

		let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
		let addr = listener.local_addr().expect("test server address");
		let (tx, rx) = oneshot::channel::<()>();

		let handle = tokio::spawn(async move {
			axum::serve(listener, app)
				.with_graceful_shutdown(async {
					let _ = rx.await;
				})
				.await
				.expect("test server");
		});

		Self {
			addr,
			state,
			shutdown: Some(tx),
			handle,
		}
	}

	pub fn url(&self) -> String {
		format!("http://{}", self.addr)
	}

	/// Config pointing at this server with the event channel disabled.
	pub fn config(&self) -> ClientConfig {
		ClientConfig::new(CLIENT_ID, CLIENT_SECRET)
			.with_base_url(self.url())
			.with_websockets(false)
	}

	pub fn client(&self) -> Client {
		Client::new(self.config()).expect("client for test server")
	}

	pub async fn logged_in_client(&self) -> Client {
		let mut client = self.client();
		client.login("me@example.test", GOOD_PASSWORD).await.expect("login");
		client
	}

	pub fn requests(&self) -> Vec<Recorded> {
		self.state.requests.lock().clone()
	}

	pub fn paths(&self) -> Vec<String> {
		self.requests().into_iter().map(|r| r.path).collect()
	}

	pub fn last_token_form(&self) -> Option<HashMap<String, String>> {
		self.state.last_token_form.lock().clone()
	}

	pub fn shutdown(mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
		self.handle.abort();
	}
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
	let recorded = {
		let headers = request.headers();
		let header = |name| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
		Recorded {
			method: request.method().to_string(),
			path: request.uri().path().to_string(),
			authorization: header(AUTHORIZATION),
			content_type: header(CONTENT_TYPE),
		}
	};
	state.requests.lock().push(recorded);
	next.run(request).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
	headers
		.get(AUTHORIZATION)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized() -> Response {
	(
		StatusCode::UNAUTHORIZED,
		Json(json!({"detail": "Authentication credentials were not provided."})),
	)
		.into_response()
}

async fn access_token(State(state): State<Arc<MockState>>, Form(form): Form<HashMap<String, String>>) -> Response {
	*state.last_token_form.lock() = Some(form.clone());

	let known_client = form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
		&& form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
		&& form.get("grant_type").map(String::as_str) == Some("password");
	let issued = match form.get("password").map(String::as_str) {
		Some(GOOD_PASSWORD) if known_client => Some((TOKEN, 3600)),
		Some(EXPIRING_PASSWORD) if known_client => Some((TOKEN, 0)),
		Some(BROKEN_ME_PASSWORD) if known_client => Some((BROKEN_TOKEN, 3600)),
		_ => None,
	};

	match issued {
		Some((token, expires_in)) => Json(json!({
			"access_token": token,
			"expires_in": expires_in,
			"token_type": "Bearer",
			"scope": "read write",
		}))
		.into_response(),
		None => (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))).into_response(),
	}
}

async fn me(headers: HeaderMap) -> Response {
	match bearer(&headers) {
		Some(TOKEN) => Json(json!({"id": 42, "email": "me@example.test", "first_name": "Ada"})).into_response(),
		Some(BROKEN_TOKEN) => (StatusCode::INTERNAL_SERVER_ERROR, "user lookup failed").into_response(),
		_ => unauthorized(),
	}
}

async fn user_session(headers: HeaderMap) -> Response {
	match bearer(&headers) {
		Some(TOKEN) => Json(json!({"websocket_session": "ws-user"})).into_response(),
		_ => unauthorized(),
	}
}

async fn dataset_session(
	headers: HeaderMap,
	Path((owner, project, dataset)): Path<(String, String, String)>,
) -> Response {
	match bearer(&headers) {
		Some(TOKEN) => Json(json!({"websocket_session": format!("ws-{owner}-{project}-{dataset}")})).into_response(),
		_ => unauthorized(),
	}
}

/// Sends the request body back with its content type.
async fn echo(headers: HeaderMap, body: Bytes) -> Response {
	let mut response = body.into_response();
	if let Some(content_type) = headers.get(CONTENT_TYPE) {
		response.headers_mut().insert(CONTENT_TYPE, content_type.clone());
	}
	response
}

/// Describes the request it received as JSON.
async fn inspect(
	method: Method,
	headers: HeaderMap,
	Query(query): Query<HashMap<String, String>>,
	body: Bytes,
) -> Json<Value> {
	let header = |name| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
	Json(json!({
		"method": method.as_str(),
		"authorization": header(AUTHORIZATION),
		"content_type": header(CONTENT_TYPE),
		"query": query,
		"body": String::from_utf8_lossy(&body),
	}))
}

/// Event channel that records emits and replays queued events on `wait`.
#[derive(Default)]
pub struct RecordingChannel {
	emitted: Mutex<Vec<(String, Value)>>,
	waits: Mutex<Vec<Option<Duration>>>,
	queued: Mutex<Vec<Event>>,
	handlers: HandlerRegistry,
}

impl RecordingChannel {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn emitted(&self) -> Vec<(String, Value)> {
		self.emitted.lock().clone()
	}

	pub fn waits(&self) -> Vec<Option<Duration>> {
		self.waits.lock().clone()
	}

	/// Queues an event for delivery on the next `wait`.
	pub fn queue(&self, name: &str, payload: Value) {
		self.queued.lock().push(Event::new(name, vec![payload]));
	}

	pub fn handlers(&self) -> &HandlerRegistry {
		&self.handlers
	}
}

impl EventChannel for RecordingChannel {
	fn emit(&self, event: &str, payload: Value) -> ChannelFuture<'_> {
		self.emitted.lock().push((event.to_string(), payload));
		Box::pin(async { Ok(()) })
	}

	fn on(&self, event: &str, handler: EventHandler) {
		self.handlers.insert(event, handler);
	}

	fn wait(&self, duration: Option<Duration>) -> ChannelFuture<'_> {
		self.waits.lock().push(duration);
		let queued = std::mem::take(&mut *self.queued.lock());
		for event in &queued {
			self.handlers.dispatch(event);
		}
		Box::pin(async { Ok(()) })
	}
}
