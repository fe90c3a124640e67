//! REST paths used by the session itself.
//!
//! Paths are relative to the API root and resolved with
//! [`resolve_url`](crate::request::resolve_url).

use amigo_protocol::ResourceId;

/// Suffix appended to the base URL to form the API root.
pub const API_PREFIX: &str = "/api/v1";

pub const ACCESS_TOKEN: &str = "/oauth2/access_token";

pub const CURRENT_USER: &str = "/me";

pub const USER_WEBSOCKET_SESSION: &str = "/me/start_websocket_session";

/// Websocket session endpoint scoped to one dataset.
pub fn dataset_websocket_session(owner: &ResourceId, project: &ResourceId, dataset: &ResourceId) -> String {
	format!("/users/{owner}/projects/{project}/datasets/{dataset}/start_websocket_session")
}
