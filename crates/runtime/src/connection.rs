//! Socket.IO connection over a frame transport.
//!
//! # Lifecycle
//!
//! 1. [`Connection::open`] waits for the Engine.IO `open` frame and reads the
//!    heartbeat interval from it
//! 2. It joins the configured namespace with a Socket.IO `CONNECT`
//! 3. [`Connection::emit`] writes `EVENT` packets on that namespace at any time
//! 4. [`Connection::wait`] drives the channel: pongs and handler dispatch for
//!    namespace events, until its deadline or closure
//!
//! Heartbeat pings are sent by a background task from the end of the
//! handshake until the connection is closed or dropped, so the server keeps
//! the session alive while nobody waits. Frames that arrive in the meantime
//! are buffered by the transport and processed by the next `wait`.

use std::sync::Arc;
use std::time::Duration;

use amigo_protocol::packet::DEFAULT_NAMESPACE;
use amigo_protocol::{EnginePacket, SocketPacket};
use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::channel::{ChannelFuture, EventChannel};
use crate::error::{Error, Result};
use crate::handlers::{Event, EventHandler, HandlerRegistry};
use crate::transport::{TransportParts, TransportSender, WebSocketTransport, socketio_endpoint};

/// How long [`Connection::connect`] waits for the server handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Heartbeat interval used until the server announces its own.
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);

/// Socket.IO client bound to one namespace.
pub struct Connection {
	namespace: String,
	sid: String,
	ping_interval: Duration,
	sender: SharedSender,
	frames: TokioMutex<mpsc::UnboundedReceiver<String>>,
	handlers: HandlerRegistry,
	reader: Option<JoinHandle<()>>,
	heartbeat: Option<JoinHandle<()>>,
}

type SharedSender = Arc<TokioMutex<Box<dyn TransportSender>>>;

impl Connection {
	/// Connects to the Socket.IO server behind `base_url` over WebSocket.
	pub async fn connect(base_url: &str, port: Option<u16>, namespace: &str) -> Result<Self> {
		let url = socketio_endpoint(base_url, port)?;
		let parts = WebSocketTransport::connect(&url).await?;
		Self::open(parts, namespace, DEFAULT_HANDSHAKE_TIMEOUT).await
	}

	/// Performs the handshake over an already connected transport.
	pub async fn open(parts: TransportParts, namespace: &str, handshake_timeout: Duration) -> Result<Self> {
		let TransportParts {
			sender,
			frames,
			reader,
		} = parts;

		// Built first so a failed handshake still aborts the reader on drop.
		let mut connection = Self {
			namespace: namespace.to_string(),
			sid: String::new(),
			ping_interval: DEFAULT_PING_INTERVAL,
			sender: Arc::new(TokioMutex::new(sender)),
			frames: TokioMutex::new(frames),
			handlers: HandlerRegistry::new(),
			reader,
			heartbeat: None,
		};
		connection.handshake(handshake_timeout).await?;
		connection.heartbeat = Some(spawn_heartbeat(Arc::clone(&connection.sender), connection.ping_interval));
		Ok(connection)
	}

	async fn handshake(&mut self, timeout: Duration) -> Result<()> {
		let first = {
			let frames = self.frames.get_mut();
			tokio::time::timeout(timeout, frames.recv())
				.await
				.map_err(|_| Error::Timeout(format!("no handshake from server within {}ms", timeout.as_millis())))?
				.ok_or(Error::ChannelClosed)?
		};

		let handshake = match EnginePacket::decode(&first)? {
			EnginePacket::Open(handshake) => handshake,
			other => {
				return Err(Error::ProtocolError(format!("expected open packet, got {other:?}")));
			}
		};

		tracing::debug!(
			sid = %handshake.sid,
			ping_interval_ms = handshake.ping_interval,
			"Event channel handshake complete"
		);

		self.sid = handshake.sid.clone();
		if !handshake.ping_interval().is_zero() {
			self.ping_interval = handshake.ping_interval();
		}

		if self.namespace != DEFAULT_NAMESPACE {
			tracing::debug!(namespace = %self.namespace, "Joining event namespace");
			self.send_packet(EnginePacket::Message(SocketPacket::connect(&self.namespace).encode()))
				.await?;
		}
		Ok(())
	}

	/// Engine.IO session id assigned by the server.
	pub fn sid(&self) -> &str {
		&self.sid
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn ping_interval(&self) -> Duration {
		self.ping_interval
	}

	pub fn handlers(&self) -> &HandlerRegistry {
		&self.handlers
	}

	/// Emits `event` with `payload` as its single argument.
	pub async fn emit(&self, event: &str, payload: Value) -> Result<()> {
		tracing::debug!(event, namespace = %self.namespace, "Emitting event");
		let packet = SocketPacket::event(&self.namespace, event, payload);
		self.send_packet(EnginePacket::Message(packet.encode())).await
	}

	/// Registers `handler` for `event`, replacing any previous handler.
	pub fn on(&self, event: &str, handler: EventHandler) {
		if self.handlers.insert(event, handler).is_some() {
			tracing::debug!(event, "Replaced event handler");
		}
	}

	/// Drives the channel until `duration` elapses, or forever when `None`.
	pub async fn wait(&self, duration: Option<Duration>) -> Result<()> {
		let mut frames = self.frames.lock().await;
		let deadline = duration.map(|d| Instant::now() + d);

		loop {
			tokio::select! {
				_ = sleep_until(deadline) => return Ok(()),
				frame = frames.recv() => {
					let Some(frame) = frame else {
						return Err(Error::ChannelClosed);
					};
					self.handle_frame(&frame).await?;
				}
			}
		}
	}

	/// Leaves the namespace and closes the transport.
	pub async fn close(&self) -> Result<()> {
		if let Some(heartbeat) = &self.heartbeat {
			heartbeat.abort();
		}
		let mut sender = self.sender.lock().await;
		if self.namespace != DEFAULT_NAMESPACE {
			let leave = SocketPacket::Disconnect {
				namespace: self.namespace.clone(),
			};
			sender.send(EnginePacket::Message(leave.encode()).encode()).await?;
		}
		sender.send(EnginePacket::Close.encode()).await?;
		sender.close().await
	}

	async fn send_packet(&self, packet: EnginePacket) -> Result<()> {
		self.sender.lock().await.send(packet.encode()).await
	}

	async fn handle_frame(&self, frame: &str) -> Result<()> {
		let packet = match EnginePacket::decode(frame) {
			Ok(packet) => packet,
			Err(e) => {
				tracing::debug!(error = %e, frame, "Skipping undecodable frame");
				return Ok(());
			}
		};

		match packet {
			EnginePacket::Ping(data) => self.send_packet(EnginePacket::Pong(data)).await,
			EnginePacket::Pong(_) => {
				tracing::trace!("Heartbeat acknowledged");
				Ok(())
			}
			EnginePacket::Message(body) => self.handle_message(&body),
			EnginePacket::Close => Err(Error::ChannelClosed),
			EnginePacket::Open(_) | EnginePacket::Upgrade | EnginePacket::Noop => Ok(()),
		}
	}

	fn handle_message(&self, body: &str) -> Result<()> {
		let packet = match SocketPacket::decode(body) {
			Ok(packet) => packet,
			Err(e) => {
				tracing::debug!(error = %e, body, "Skipping undecodable packet");
				return Ok(());
			}
		};

		if packet.namespace() != self.namespace {
			tracing::trace!(namespace = packet.namespace(), "Ignoring packet for another namespace");
			return Ok(());
		}

		match packet {
			SocketPacket::Connect { .. } => {
				tracing::debug!(namespace = %self.namespace, "Namespace joined");
				Ok(())
			}
			SocketPacket::Disconnect { .. } => Err(Error::ChannelClosed),
			SocketPacket::Event { name, args, .. } => {
				let event = Event::new(name, args);
				if !self.handlers.dispatch(&event) {
					tracing::debug!(event = %event.name, "No handler registered for event");
				}
				Ok(())
			}
			SocketPacket::Ack { id, .. } => {
				tracing::trace!(id, "Ignoring acknowledgment");
				Ok(())
			}
			SocketPacket::Error { data, .. } => Err(Error::Rejected(match data {
				Some(Value::String(reason)) => reason,
				Some(other) => other.to_string(),
				None => "namespace error".to_string(),
			})),
		}
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		if let Some(reader) = self.reader.take() {
			reader.abort();
		}
		if let Some(heartbeat) = self.heartbeat.take() {
			heartbeat.abort();
		}
	}
}

impl std::fmt::Debug for Connection {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Connection")
			.field("namespace", &self.namespace)
			.field("sid", &self.sid)
			.field("ping_interval", &self.ping_interval)
			.field("handlers", &self.handlers)
			.finish()
	}
}

impl EventChannel for Connection {
	fn emit(&self, event: &str, payload: Value) -> ChannelFuture<'_> {
		let event = event.to_string();
		Box::pin(async move { Connection::emit(self, &event, payload).await })
	}

	fn on(&self, event: &str, handler: EventHandler) {
		Connection::on(self, event, handler)
	}

	fn wait(&self, duration: Option<Duration>) -> ChannelFuture<'_> {
		Box::pin(Connection::wait(self, duration))
	}
}

/// Sends an Engine.IO ping every `interval` until the transport refuses a frame.
fn spawn_heartbeat(sender: SharedSender, interval: Duration) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticks = tokio::time::interval_at(Instant::now() + interval, interval);
		ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
		loop {
			ticks.tick().await;
			tracing::trace!("Sending heartbeat");
			if let Err(e) = sender.lock().await.send(EnginePacket::Ping(None).encode()).await {
				tracing::debug!(error = %e, "Heartbeat stopped");
				break;
			}
		}
	})
}

async fn sleep_until(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => tokio::time::sleep_until(deadline).await,
		None => std::future::pending().await,
	}
}
