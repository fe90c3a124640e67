//! Named event handlers.
//!
//! Handlers are keyed by event name in an [`IndexMap`] so listing them keeps
//! registration order. One handler per name: registering a name again
//! replaces the previous handler, the same rule Socket.IO namespaces apply.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

/// An event received on the channel namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
	pub name: String,
	pub args: Vec<Value>,
}

impl Event {
	pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			name: name.into(),
			args,
		}
	}

	/// First argument, which is the whole payload for platform events.
	pub fn payload(&self) -> Option<&Value> {
		self.args.first()
	}
}

/// Callback invoked from the wait loop for a matching event.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handler storage shared between registration and the wait loop.
#[derive(Default)]
pub struct HandlerRegistry {
	handlers: Mutex<IndexMap<String, EventHandler>>,
}

impl HandlerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for `name`, returning the handler it replaced.
	pub fn insert(&self, name: impl Into<String>, handler: EventHandler) -> Option<EventHandler> {
		self.handlers.lock().insert(name.into(), handler)
	}

	/// Removes the handler for `name`. Returns true if one was registered.
	pub fn remove(&self, name: &str) -> bool {
		self.handlers.lock().shift_remove(name).is_some()
	}

	pub fn get(&self, name: &str) -> Option<EventHandler> {
		self.handlers.lock().get(name).cloned()
	}

	/// Invokes the handler registered for `event.name`.
	///
	/// The lock is released before the call so handlers may register others.
	/// Returns false if no handler matched.
	pub fn dispatch(&self, event: &Event) -> bool {
		match self.get(&event.name) {
			Some(handler) => {
				handler(event);
				true
			}
			None => false,
		}
	}

	/// Registered event names in registration order.
	pub fn names(&self) -> Vec<String> {
		self.handlers.lock().keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.handlers.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.handlers.lock().is_empty()
	}
}

impl std::fmt::Debug for HandlerRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerRegistry").field("events", &self.names()).finish()
	}
}
