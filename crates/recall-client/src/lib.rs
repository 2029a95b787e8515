//! recall-client: HTTP and event-stream access to the recall service.
//!
//! [`ApiClient`] wraps every REST endpoint behind one request pipeline that
//! attaches credentials, turns failed responses into notifications, and
//! expires the session when the server refuses the token. [`events::open`]
//! starts the server-push stream.

pub mod client;
pub mod config;
pub mod error;
pub mod events;

pub use client::{ApiClient, Failure, Outcome};
pub use config::{build_session, load_config, load_config_from, RecallConfig};
pub use error::ClientError;
pub use events::{EventStream, StreamEvent};
