//! Event-channel bootstrap types.
//!
//! Before the platform pushes events over the real-time channel, the client
//! obtains a short-lived websocket session over HTTP and presents it on the
//! channel with an [`AUTHENTICATE_EVENT`] carrying an [`AuthenticatePayload`].

use serde::{Deserialize, Serialize};

use crate::user::ResourceId;

/// Socket.IO namespace the platform publishes events on.
pub const EVENT_NAMESPACE: &str = "/amigosocket";

/// Event name used to bind a websocket session to the channel.
pub const AUTHENTICATE_EVENT: &str = "authenticate";

/// Response of the `start_websocket_session` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsocketSession {
	pub websocket_session: String,
}

/// Payload of the `authenticate` event.
///
/// User-scoped subscriptions omit `datasetid`; dataset-scoped ones carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatePayload {
	pub userid: ResourceId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub datasetid: Option<ResourceId>,
	pub websocket_session: String,
}

impl AuthenticatePayload {
	pub fn user(userid: ResourceId, websocket_session: impl Into<String>) -> Self {
		Self {
			userid,
			datasetid: None,
			websocket_session: websocket_session.into(),
		}
	}

	pub fn dataset(userid: ResourceId, datasetid: ResourceId, websocket_session: impl Into<String>) -> Self {
		Self {
			userid,
			datasetid: Some(datasetid),
			websocket_session: websocket_session.into(),
		}
	}
}
