//! The event-channel capability the session client is written against.
//!
//! [`Connection`](crate::Connection) is the Socket.IO implementation; tests
//! and embedders can supply their own.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::handlers::EventHandler;

/// Boxed future returned by [`EventChannel`] operations.
pub type ChannelFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A connected real-time channel scoped to one namespace.
pub trait EventChannel: Send + Sync {
	/// Sends a named event carrying `payload`. Does not wait for an acknowledgment.
	fn emit(&self, event: &str, payload: Value) -> ChannelFuture<'_>;

	/// Registers `handler` for events named `event`, replacing any previous one.
	fn on(&self, event: &str, handler: EventHandler);

	/// Processes incoming events until `duration` elapses, or forever when `None`.
	///
	/// Handlers run on the waiting task. Fails if the channel closes.
	fn wait(&self, duration: Option<Duration>) -> ChannelFuture<'_>;
}
