//! Error types for the event channel.

use thiserror::Error;

/// Result type alias for event-channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur on the event channel.
#[derive(Debug, Error)]
pub enum Error {
	/// The endpoint could not be derived from the configured base URL.
	#[error("Invalid event channel URL: {0}")]
	InvalidUrl(String),

	/// Failed to establish the WebSocket connection.
	#[error("Failed to connect to event channel: {0}")]
	ConnectionFailed(String),

	/// Transport-level error (WebSocket I/O).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// The peer sent something that does not fit the protocol state.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// A frame could not be decoded.
	#[error("Malformed frame: {0}")]
	Packet(#[from] amigo_protocol::PacketError),

	/// Timeout waiting for the peer.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The server refused the namespace or the session.
	#[error("Rejected by server: {0}")]
	Rejected(String),

	/// Channel closed by the peer or the transport.
	#[error("Event channel closed")]
	ChannelClosed,

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the channel can no longer be used.
	pub fn is_closed(&self) -> bool {
		matches!(self, Error::ChannelClosed | Error::TransportError(_))
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}
}
