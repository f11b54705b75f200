//! Client for the vendor "open event" push service (KSO-1).
//!
//! Establishes and maintains a long-lived, signed WebSocket connection,
//! verifies and decrypts each inbound event, optionally acknowledges
//! delivery, and routes decoded events to user-supplied handlers —
//! surviving transient network failures and server-initiated teardowns via
//! exponential-backoff reconnection.
//!
//! # Features
//! - KSO-1 HMAC-SHA256 handshake signing and per-event signature verification
//! - AES-256-CBC decryption with tolerant PKCS7 unpadding
//! - Exponential backoff with jitter and a configurable retry ceiling
//! - Typed dispatch for the seven well-known `kso.*` event codes
//! - At-least-once ACK under a configurable mode
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), kso_event_client::Error> {
//! use kso_event_client::{Client, ClientConfig, Dispatcher};
//!
//! let dispatcher = Dispatcher::new().on_v7_app_chat_message_create(|event| async move {
//!     println!("chat message in {}", event.parsed_data.chat.id);
//!     Ok(())
//! });
//!
//! let config = ClientConfig::new("app_id", "app_secret").with_dispatcher(dispatcher);
//! let client = Client::new(config);
//! client.start().await?;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod cipher;
mod client;
mod config;
mod connection;
mod dispatcher;
mod error;
mod event;
mod logger;
mod payloads;
mod pipeline;
mod rfc1123;
mod signer;

pub use client::{Client, ConnectionState};
pub use config::{ClientConfig, ReconnectConfig, TimingConfig};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use event::{Event, TypedEvent};
pub use logger::{LogLevel, Logger, TracingLogger};
pub use payloads::{
    AppChatCreate, AppChatMessageCreate, ChatRef, GroupChatDelete, GroupChatMemberChange,
    MessageBody, MessageContent, SenderRef,
};
