//! recall-core: data model, session context, and client-side plumbing.
//!
//! This crate defines the types shared by the HTTP client and the terminal
//! front end: server entities, the per-client [`session::Session`] context,
//! the notification sink, the localized error table, and the navigation guard.

pub mod error;
pub mod guard;
pub mod i18n;
pub mod model;
pub mod notify;
pub mod session;

pub use error::SessionError;
pub use guard::{guard, Decision, Route};
pub use notify::{Level, Notification, NotificationSink};
pub use session::{FileTokenStore, MemoryTokenStore, Session, StreamHandle, TokenStore};
