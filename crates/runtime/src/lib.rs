//! AmigoCloud runtime - the real-time event channel
//!
//! This crate provides the event-channel capability the session client
//! bootstraps after login:
//!
//! - **Transport**: Engine.IO text frames over WebSocket, or in memory
//! - **Connection**: Socket.IO handshake, namespace join, heartbeats, and
//!   event dispatch
//! - **Handlers**: named callbacks invoked from the wait loop
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   amigo-rs   │  Session client (emit authenticate, add callbacks)
//! └──────┬───────┘
//!        │ uses dyn EventChannel
//! ┌──────▼───────┐
//! │amigo-runtime │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  Socket.IO namespace + wait loop
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket / memory transport
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod channel;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod transport;

pub use channel::{ChannelFuture, EventChannel};
pub use connection::{Connection, DEFAULT_HANDSHAKE_TIMEOUT};
pub use error::{Error, Result};
pub use handlers::{Event, EventHandler, HandlerRegistry};
pub use transport::{
	MemoryPeer, MemoryTransport, SendFuture, TransportParts, TransportSender, WebSocketTransport, socketio_endpoint,
};
