//! Engine.IO (protocol 3) and Socket.IO text framing.
//!
//! The event channel is two nested layers. Every WebSocket text frame is one
//! [`EnginePacket`]; its first character is the packet type:
//!
//! | char | packet |
//! |---|---|
//! | `0` | open (JSON [`Handshake`]) |
//! | `1` | close |
//! | `2` | ping |
//! | `3` | pong |
//! | `4` | message (carries a [`SocketPacket`]) |
//! | `5` | upgrade |
//! | `6` | noop |
//!
//! A Socket.IO packet is again a type digit, an optional namespace ending in
//! `,`, an optional numeric ack id and an optional JSON body, e.g.
//! `2/amigosocket,["authenticate",{"userid":1}]`.
//!
//! Binary attachments are not used by the platform and are rejected.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Namespace used when a packet does not name one.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Errors decoding a frame.
#[derive(Debug, Error)]
pub enum PacketError {
	#[error("empty frame")]
	Empty,

	#[error("unknown {layer} packet type '{kind}'")]
	UnknownType { layer: &'static str, kind: char },

	#[error("malformed packet: {0}")]
	Malformed(String),

	#[error("unsupported packet: {0}")]
	Unsupported(&'static str),

	#[error("invalid packet JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Engine.IO `open` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
	pub sid: String,
	#[serde(default)]
	pub upgrades: Vec<String>,
	/// Milliseconds between client heartbeats.
	pub ping_interval: u64,
	/// Milliseconds after which the server drops a silent client.
	pub ping_timeout: u64,
}

impl Handshake {
	pub fn ping_interval(&self) -> Duration {
		Duration::from_millis(self.ping_interval)
	}

	pub fn ping_timeout(&self) -> Duration {
		Duration::from_millis(self.ping_timeout)
	}
}

/// One Engine.IO frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
	Open(Handshake),
	Close,
	Ping(Option<String>),
	Pong(Option<String>),
	Message(String),
	Upgrade,
	Noop,
}

impl EnginePacket {
	pub fn encode(&self) -> String {
		match self {
			EnginePacket::Open(handshake) => {
				let body = json!({
					"sid": handshake.sid,
					"upgrades": handshake.upgrades,
					"pingInterval": handshake.ping_interval,
					"pingTimeout": handshake.ping_timeout,
				});
				format!("0{body}")
			}
			EnginePacket::Close => "1".to_string(),
			EnginePacket::Ping(data) => format!("2{}", data.as_deref().unwrap_or_default()),
			EnginePacket::Pong(data) => format!("3{}", data.as_deref().unwrap_or_default()),
			EnginePacket::Message(body) => format!("4{body}"),
			EnginePacket::Upgrade => "5".to_string(),
			EnginePacket::Noop => "6".to_string(),
		}
	}

	pub fn decode(frame: &str) -> Result<Self, PacketError> {
		let mut chars = frame.chars();
		let kind = chars.next().ok_or(PacketError::Empty)?;
		let rest = chars.as_str();
		let data = (!rest.is_empty()).then(|| rest.to_string());

		match kind {
			'0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
			'1' => Ok(EnginePacket::Close),
			'2' => Ok(EnginePacket::Ping(data)),
			'3' => Ok(EnginePacket::Pong(data)),
			'4' => Ok(EnginePacket::Message(rest.to_string())),
			'5' => Ok(EnginePacket::Upgrade),
			'6' => Ok(EnginePacket::Noop),
			other => Err(PacketError::UnknownType {
				layer: "engine.io",
				kind: other,
			}),
		}
	}
}

/// One Socket.IO packet, carried inside [`EnginePacket::Message`].
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
	Connect {
		namespace: String,
	},
	Disconnect {
		namespace: String,
	},
	Event {
		namespace: String,
		id: Option<u64>,
		name: String,
		args: Vec<Value>,
	},
	Ack {
		namespace: String,
		id: u64,
		args: Vec<Value>,
	},
	Error {
		namespace: String,
		data: Option<Value>,
	},
}

impl SocketPacket {
	pub fn connect(namespace: &str) -> Self {
		SocketPacket::Connect {
			namespace: namespace.to_string(),
		}
	}

	/// Builds an event whose single argument is `payload`.
	pub fn event(namespace: &str, name: &str, payload: Value) -> Self {
		SocketPacket::Event {
			namespace: namespace.to_string(),
			id: None,
			name: name.to_string(),
			args: vec![payload],
		}
	}

	pub fn namespace(&self) -> &str {
		match self {
			SocketPacket::Connect { namespace }
			| SocketPacket::Disconnect { namespace }
			| SocketPacket::Event { namespace, .. }
			| SocketPacket::Ack { namespace, .. }
			| SocketPacket::Error { namespace, .. } => namespace,
		}
	}

	pub fn encode(&self) -> String {
		let (kind, id, data) = match self {
			SocketPacket::Connect { .. } => ('0', None, None),
			SocketPacket::Disconnect { .. } => ('1', None, None),
			SocketPacket::Event { id, name, args, .. } => {
				let mut items = Vec::with_capacity(args.len() + 1);
				items.push(Value::String(name.clone()));
				items.extend(args.iter().cloned());
				('2', *id, Some(Value::Array(items)))
			}
			SocketPacket::Ack { id, args, .. } => ('3', Some(*id), Some(Value::Array(args.clone()))),
			SocketPacket::Error { data, .. } => ('4', None, data.clone()),
		};

		let mut out = String::new();
		out.push(kind);
		let namespace = self.namespace();
		if namespace != DEFAULT_NAMESPACE {
			out.push_str(namespace);
			if id.is_some() || data.is_some() {
				out.push(',');
			}
		}
		if let Some(id) = id {
			out.push_str(&id.to_string());
		}
		if let Some(data) = data {
			out.push_str(&data.to_string());
		}
		out
	}

	pub fn decode(body: &str) -> Result<Self, PacketError> {
		let mut chars = body.chars();
		let kind = chars.next().ok_or(PacketError::Empty)?;
		let mut rest = chars.as_str();

		if matches!(kind, '5' | '6') {
			return Err(PacketError::Unsupported("binary attachments"));
		}

		let namespace = if rest.starts_with('/') {
			match rest.find(',') {
				Some(end) => {
					let namespace = &rest[..end];
					rest = &rest[end + 1..];
					namespace.to_string()
				}
				None => {
					let namespace = rest.to_string();
					rest = "";
					namespace
				}
			}
		} else {
			DEFAULT_NAMESPACE.to_string()
		};

		let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
		let id = if digits > 0 {
			let id = rest[..digits]
				.parse::<u64>()
				.map_err(|e| PacketError::Malformed(format!("ack id: {e}")))?;
			rest = &rest[digits..];
			Some(id)
		} else {
			None
		};

		match kind {
			'0' => Ok(SocketPacket::Connect { namespace }),
			'1' => Ok(SocketPacket::Disconnect { namespace }),
			'2' => {
				let mut items = parse_array(rest)?.into_iter();
				let name = match items.next() {
					Some(Value::String(name)) => name,
					_ => return Err(PacketError::Malformed("event without a name".to_string())),
				};
				Ok(SocketPacket::Event {
					namespace,
					id,
					name,
					args: items.collect(),
				})
			}
			'3' => {
				let id = id.ok_or_else(|| PacketError::Malformed("ack without id".to_string()))?;
				let args = if rest.is_empty() { Vec::new() } else { parse_array(rest)? };
				Ok(SocketPacket::Ack { namespace, id, args })
			}
			'4' => {
				// Older servers send the reason unquoted.
				let data = (!rest.is_empty())
					.then(|| serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_string())));
				Ok(SocketPacket::Error { namespace, data })
			}
			other => Err(PacketError::UnknownType {
				layer: "socket.io",
				kind: other,
			}),
		}
	}
}

fn parse_array(data: &str) -> Result<Vec<Value>, PacketError> {
	match serde_json::from_str(data)? {
		Value::Array(items) => Ok(items),
		_ => Err(PacketError::Malformed("expected a JSON array".to_string())),
	}
}
