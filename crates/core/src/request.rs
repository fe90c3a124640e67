//! Request building blocks: verbs, bodies, decoded payloads and URL resolution.

use std::fmt;

use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// HTTP verbs the pipeline dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl Verb {
	pub fn method(self) -> Method {
		match self {
			Verb::Get => Method::GET,
			Verb::Post => Method::POST,
			Verb::Put => Method::PUT,
			Verb::Patch => Method::PATCH,
			Verb::Delete => Method::DELETE,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Verb::Get => "GET",
			Verb::Post => "POST",
			Verb::Put => "PUT",
			Verb::Patch => "PATCH",
			Verb::Delete => "DELETE",
		}
	}

	/// Mutating verbs always send a body, `{}` when none is given.
	pub fn sends_body(self) -> bool {
		!matches!(self, Verb::Get)
	}
}

impl fmt::Display for Verb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Request body and its encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
	/// Sent as `application/json`.
	Json(Value),
	/// Sent as `application/x-www-form-urlencoded`.
	Form(Vec<(String, String)>),
}

impl Body {
	pub fn form<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		Body::Form(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

impl Default for Body {
	fn default() -> Self {
		Body::Json(json!({}))
	}
}

impl From<Value> for Body {
	fn from(value: Value) -> Self {
		Body::Json(value)
	}
}

/// Per-request options shared by every verb.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
	pub query: Vec<(String, String)>,
	pub body: Option<Body>,
	/// Return the body bytes untouched instead of parsing JSON.
	pub raw: bool,
}

impl RequestOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
		self
	}

	pub fn body(mut self, body: impl Into<Option<Body>>) -> Self {
		self.body = body.into();
		self
	}

	pub fn raw(mut self, raw: bool) -> Self {
		self.raw = raw;
		self
	}
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
	Json(Value),
	/// Body bytes, returned in raw mode.
	Raw(Bytes),
	/// The response had no body.
	Empty,
}

impl Payload {
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Payload::Json(value) => Some(value),
			_ => None,
		}
	}

	pub fn into_json(self) -> Option<Value> {
		match self {
			Payload::Json(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			Payload::Raw(bytes) => Some(bytes),
			_ => None,
		}
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, Payload::Empty)
	}

	/// Deserializes the payload into `T`. An empty payload is treated as `null`.
	pub fn deserialize<T: DeserializeOwned>(self) -> serde_json::Result<T> {
		match self {
			Payload::Json(value) => serde_json::from_value(value),
			Payload::Raw(bytes) => serde_json::from_slice(&bytes),
			Payload::Empty => serde_json::from_value(Value::Null),
		}
	}
}

/// Resolves `target` against `api_url`.
///
/// Absolute targets (starting with `http`) are returned unchanged, a leading
/// `/` is appended to the API root as is, anything else gets a `/` separator.
pub fn resolve_url(api_url: &str, target: &str) -> String {
	if target.starts_with("http") {
		target.to_string()
	} else if target.starts_with('/') {
		format!("{api_url}{target}")
	} else {
		format!("{api_url}/{target}")
	}
}
