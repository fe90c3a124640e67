//! Wire types for the AmigoCloud platform.
//!
//! This crate holds the serde-serializable shapes exchanged with the
//! platform, split by channel:
//!
//! - [`oauth`]: the password-grant form and the issued access token
//! - [`user`]: the `/me` resource and opaque resource identifiers
//! - [`events`]: websocket session bootstrap and the `authenticate` payload
//! - [`packet`]: Engine.IO / Socket.IO text framing used by the event channel
//!
//! Types here are pure data. Session state, request dispatch and the event
//! loop live in `amigo-rs` and `amigo-runtime`.

pub mod events;
pub mod oauth;
pub mod packet;
pub mod user;

pub use events::{AUTHENTICATE_EVENT, AuthenticatePayload, EVENT_NAMESPACE, WebsocketSession};
pub use oauth::{AccessToken, PASSWORD_GRANT, PasswordGrant};
pub use packet::{EnginePacket, Handshake, PacketError, SocketPacket};
pub use user::{CurrentUser, ResourceId};
