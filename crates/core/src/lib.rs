//! amigo: session client for the AmigoCloud platform
//!
//! This crate provides authenticated access to the platform's REST API and
//! bootstraps its real-time event channel:
//!
//! - **Session**: OAuth password-grant login, token expiry tracking, logout
//! - **Requests**: one pipeline for every verb with consistent authorization,
//!   body encoding and error translation
//! - **Events**: websocket session bootstrap, callbacks and a bounded wait loop
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//!
//! use amigo::{Body, Client, ClientConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> amigo::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     let mut client = Client::connect(config).await?;
//!     client.login("me@example.com", "secret").await?;
//!
//!     let me = client.get("/me", &[], false).await?;
//!     println!("{:?}", me.as_json());
//!
//!     client
//!         .post("/users/1/projects", Body::Json(json!({"name": "demo"})), false)
//!         .await?;
//!
//!     client.add_callback("dataset:update", |event| println!("{:?}", event.payload()))?;
//!     client.listen_user_events().await?;
//!     client.start_listening(Some(Duration::from_secs(30))).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   amigo-rs   │  This crate: Client, AuthState, request pipeline
//! └──────┬───────┘
//!        │ reqwest (REST) + dyn EventChannel
//! ┌──────▼───────┐
//! │amigo-runtime │  Socket.IO connection over WebSocket
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │amigo-protocol│  Wire types and packet codec
//! └──────────────┘
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod request;

pub use amigo_protocol::{CurrentUser, ResourceId};
pub use amigo_runtime::{Event, EventChannel, EventHandler};
pub use auth::AuthState;
pub use client::Client;
pub use config::{ClientConfig, Credentials, DEFAULT_BASE_URL};
pub use error::{Error, FailedResponse, Result};
pub use request::{Body, Payload, RequestOptions, Verb, resolve_url};

/// Wire types, re-exported for callers that need them directly.
pub mod protocol {
	pub use amigo_protocol::*;
}

/// Event-channel runtime, re-exported for custom transports and tests.
pub mod runtime {
	pub use amigo_runtime::*;
}
