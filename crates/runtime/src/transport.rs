//! Frame transports for the event channel.
//!
//! A transport moves Engine.IO text frames and nothing else. Like the
//! connection layer above it, it is split into parts at construction:
//!
//! - a [`TransportSender`] the connection writes frames through,
//! - an unbounded receiver fed by a background reader task,
//! - the reader task handle, aborted when the connection is dropped.
//!
//! The reader task ends when the peer closes or the socket fails; the closed
//! receiver is how the connection learns the channel is gone.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{Error, Result};

/// Engine.IO protocol revision requested from the server.
pub const ENGINE_IO_VERSION: u8 = 3;

/// Path the Socket.IO server is mounted on.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Boxed future returned by [`TransportSender`] operations.
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Write half of a transport.
pub trait TransportSender: Send {
	/// Sends one text frame.
	fn send(&mut self, frame: String) -> SendFuture<'_>;

	/// Closes the write half. Further sends fail.
	fn close(&mut self) -> SendFuture<'_>;
}

/// A connected transport, split for the connection layer.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub frames: mpsc::UnboundedReceiver<String>,
	pub reader: Option<JoinHandle<()>>,
}

/// Derives the Socket.IO WebSocket endpoint from the platform base URL.
///
/// `http`/`https` map to `ws`/`wss`, `port` overrides the URL's port, and
/// any path on the base URL is replaced by the Socket.IO mount point.
pub fn socketio_endpoint(base_url: &str, port: Option<u16>) -> Result<Url> {
	let mut url = Url::parse(base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;

	let scheme = match url.scheme() {
		"http" | "ws" => "ws",
		"https" | "wss" => "wss",
		other => return Err(Error::InvalidUrl(format!("unsupported scheme '{other}' in {base_url}"))),
	};
	url.set_scheme(scheme)
		.map_err(|()| Error::InvalidUrl(format!("cannot use scheme '{scheme}' for {base_url}")))?;

	if port.is_some() {
		url.set_port(port)
			.map_err(|()| Error::InvalidUrl(format!("cannot set a port on {base_url}")))?;
	}

	url.set_path(SOCKET_IO_PATH);
	url.set_query(Some(&format!("EIO={ENGINE_IO_VERSION}&transport=websocket")));
	url.set_fragment(None);
	Ok(url)
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// WebSocket transport backed by `tokio-tungstenite`.
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Opens the socket and spawns the reader task.
	pub async fn connect(url: &Url) -> Result<TransportParts> {
		tracing::debug!(url = %url, "Opening event channel socket");

		let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{url}: {e}")))?;
		let (sink, mut source) = stream.split();
		let (tx, frames) = mpsc::unbounded_channel();

		let reader = tokio::spawn(async move {
			while let Some(message) = source.next().await {
				match message {
					Ok(Message::Text(text)) => {
						if tx.send(text).is_err() {
							break;
						}
					}
					Ok(Message::Close(frame)) => {
						tracing::debug!(?frame, "Event channel socket closed by peer");
						break;
					}
					// Control frames are answered by tungstenite itself.
					Ok(_) => {}
					Err(e) => {
						tracing::debug!(error = %e, "Event channel socket read failed");
						break;
					}
				}
			}
		});

		Ok(TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			frames,
			reader: Some(reader),
		})
	}
}

struct WebSocketSender {
	sink: WsSink,
}

impl TransportSender for WebSocketSender {
	fn send(&mut self, frame: String) -> SendFuture<'_> {
		Box::pin(async move {
			self.sink
				.send(Message::Text(frame))
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}

	fn close(&mut self) -> SendFuture<'_> {
		Box::pin(async move { self.sink.close().await.map_err(|e| Error::TransportError(e.to_string())) })
	}
}

/// In-process transport pair.
///
/// The connection side gets ordinary [`TransportParts`]; the other side is a
/// [`MemoryPeer`] that plays the server.
pub struct MemoryTransport;

impl MemoryTransport {
	pub fn pair() -> (TransportParts, MemoryPeer) {
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

		let parts = TransportParts {
			sender: Box::new(MemorySender { tx: Some(outbound_tx) }),
			frames: inbound_rx,
			reader: None,
		};
		let peer = MemoryPeer {
			outbound: outbound_rx,
			inbound: Some(inbound_tx),
		};
		(parts, peer)
	}
}

struct MemorySender {
	tx: Option<mpsc::UnboundedSender<String>>,
}

impl TransportSender for MemorySender {
	fn send(&mut self, frame: String) -> SendFuture<'_> {
		let result = match &self.tx {
			Some(tx) => tx.send(frame).map_err(|_| Error::ChannelClosed),
			None => Err(Error::ChannelClosed),
		};
		Box::pin(async move { result })
	}

	fn close(&mut self) -> SendFuture<'_> {
		self.tx = None;
		Box::pin(async { Ok(()) })
	}
}

/// Server side of a [`MemoryTransport`].
pub struct MemoryPeer {
	outbound: mpsc::UnboundedReceiver<String>,
	inbound: Option<mpsc::UnboundedSender<String>>,
}

impl MemoryPeer {
	/// Delivers a frame to the connection. Returns false once the connection is gone.
	pub fn push(&self, frame: impl Into<String>) -> bool {
		self.inbound.as_ref().is_some_and(|tx| tx.send(frame.into()).is_ok())
	}

	/// Next frame written by the connection, `None` once its sender is closed.
	pub async fn next_frame(&mut self) -> Option<String> {
		self.outbound.recv().await
	}

	/// Frame already written by the connection, if any.
	pub fn try_next_frame(&mut self) -> Option<String> {
		self.outbound.try_recv().ok()
	}

	/// Simulates the socket going away.
	pub fn hang_up(&mut self) {
		self.inbound = None;
	}
}

#[cfg(test)]
mod tests;
