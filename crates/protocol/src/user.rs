//! The authenticated user and opaque resource identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Opaque identifier of a platform resource (user, project, dataset).
///
/// The platform mostly uses positive integers but nothing in this client
/// depends on that: any JSON number or string is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
	Number(Number),
	Text(String),
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ResourceId::Number(n) => write!(f, "{n}"),
			ResourceId::Text(s) => f.write_str(s),
		}
	}
}

impl From<u64> for ResourceId {
	fn from(value: u64) -> Self {
		ResourceId::Number(value.into())
	}
}

impl From<u32> for ResourceId {
	fn from(value: u32) -> Self {
		ResourceId::Number(value.into())
	}
}

impl From<i64> for ResourceId {
	fn from(value: i64) -> Self {
		ResourceId::Number(value.into())
	}
}

impl From<Number> for ResourceId {
	fn from(value: Number) -> Self {
		ResourceId::Number(value)
	}
}

impl From<&str> for ResourceId {
	fn from(value: &str) -> Self {
		ResourceId::Text(value.to_string())
	}
}

impl From<String> for ResourceId {
	fn from(value: String) -> Self {
		ResourceId::Text(value)
	}
}

/// Response of the `/me` endpoint.
///
/// Only `id` is required; every other field the platform returns is kept in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
	pub id: ResourceId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
