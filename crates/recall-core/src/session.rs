//! Per-client session context.
//!
//! A [`Session`] is built once at startup and shared by `Arc` with every
//! component that needs credentials or UI state. Only the token is durable;
//! it lives in a [`TokenStore`]. Everything else resets when the client
//! restarts.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::SessionError;

/// Default layout class for a freshly started client.
pub const DEFAULT_LAYOUT_CLASS: &str = "container";

// ---------------------------------------------------------------------------
// Durable token storage
// ---------------------------------------------------------------------------

/// Durable home of the bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Replace the stored token.
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Forget the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Keeps the raw token string in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionError::ReadToken {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        let write_err = |source| SessionError::WriteToken {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(write_err)?;
        // mode() only applies on creation; tighten files left by older runs
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        file.write_all(token.as_bytes()).map_err(write_err)
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::WriteToken {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-memory token store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    /// Current stored value, bypassing the session's in-memory copy.
    pub fn stored(&self) -> Option<String> {
        self.token.lock().map(|t| t.clone()).unwrap_or(None)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.stored())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
        Ok(())
    }
}

impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<String>, SessionError> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<(), SessionError> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// Push-connection handle
// ---------------------------------------------------------------------------

/// Opaque handle to a live server-push connection.
pub trait StreamHandle: Send + Sync {
    /// Stop receiving events.
    fn close(&self);

    /// Whether the connection has ended (closed locally or by the server).
    fn is_closed(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Credentials and client-wide state for one running client.
pub struct Session {
    store: Box<dyn TokenStore>,
    telegram_init_data: Option<String>,
    api_url: String,
    token: RwLock<Option<String>>,
    stream: Mutex<Option<Box<dyn StreamHandle>>>,
    layout_class: watch::Sender<String>,
    expiry: watch::Sender<u64>,
}

impl Session {
    /// Build the session, reading any token left by a previous run.
    ///
    /// A blank `telegram_init_data` is treated as absent.
    pub fn new(
        store: impl TokenStore + 'static,
        telegram_init_data: Option<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let token = store.load()?;
        let telegram_init_data = telegram_init_data.filter(|d| !d.trim().is_empty());
        let (layout_class, _) = watch::channel(DEFAULT_LAYOUT_CLASS.to_string());
        let (expiry, _) = watch::channel(0);

        debug!(
            telegram = telegram_init_data.is_some(),
            has_token = token.is_some(),
            "session initialized"
        );

        Ok(Self {
            store: Box::new(store),
            telegram_init_data,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(token),
            stream: Mutex::new(None),
            layout_class,
            expiry,
        })
    }

    /// Whether the client was launched inside a Telegram Mini-App.
    pub fn is_telegram_context(&self) -> bool {
        self.telegram_init_data.is_some()
    }

    /// Whether a token is present. Meaningless in Telegram context.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Value of the `Authorization` header for authenticated endpoints.
    ///
    /// Always produces a value, even without a token; the server decides
    /// whether it is acceptable.
    pub fn authorization_header_value(&self) -> String {
        match &self.telegram_init_data {
            Some(init_data) => format!("tma {init_data}"),
            None => format!("Bearer {}", self.token().unwrap_or_default()),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Persist a freshly issued token and start using it.
    pub fn set_token(&self, token: &str) -> Result<(), SessionError> {
        self.store.save(token)?;
        *self.token_mut() = Some(token.to_string());
        info!("token stored");
        Ok(())
    }

    /// Forget the token, durably.
    pub fn clear_token(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self.token_mut() = None;
        info!("token cleared");
        Ok(())
    }

    /// Credentials were refused: clear them and raise the expiry signal.
    ///
    /// The signal is raised even if clearing the store fails, so the
    /// application still returns to the unauthenticated view.
    pub fn expire(&self) -> Result<(), SessionError> {
        let cleared = self.clear_token();
        self.expiry.send_modify(|epoch| *epoch += 1);
        cleared
    }

    /// How many times the session has expired since startup.
    pub fn expiry_count(&self) -> u64 {
        *self.expiry.borrow()
    }

    /// Observe session expiry. The value is the expiry count.
    pub fn subscribe_expiry(&self) -> watch::Receiver<u64> {
        self.expiry.subscribe()
    }

    /// Store the live push-connection handle.
    ///
    /// A previous handle is dropped without being closed, so its connection
    /// keeps running. Close it first with [`Session::close_event_stream`].
    pub fn set_event_stream_handle(&self, handle: Box<dyn StreamHandle>) {
        let previous = self.stream_slot().replace(handle);
        if previous.is_some() {
            tracing::warn!("replacing an event stream handle that was not closed");
        }
    }

    /// Whether a push connection has been registered and is still running.
    pub fn has_open_event_stream(&self) -> bool {
        self.stream_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_closed())
    }

    /// Detach the registered handle, leaving the slot empty.
    pub fn take_event_stream_handle(&self) -> Option<Box<dyn StreamHandle>> {
        self.stream_slot().take()
    }

    /// Close and forget the registered handle. Returns `false` if there was none.
    pub fn close_event_stream(&self) -> bool {
        match self.take_event_stream_handle() {
            Some(handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }

    pub fn layout_class(&self) -> String {
        self.layout_class.borrow().clone()
    }

    pub fn set_layout_class(&self, value: impl Into<String>) {
        self.layout_class.send_replace(value.into());
    }

    /// Observe layout class changes.
    pub fn subscribe_layout_class(&self) -> watch::Receiver<String> {
        self.layout_class.subscribe()
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn token_mut(&self) -> std::sync::RwLockWriteGuard<'_, Option<String>> {
        self.token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stream_slot(&self) -> std::sync::MutexGuard<'_, Option<Box<dyn StreamHandle>>> {
        self.stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_url", &self.api_url)
            .field("telegram", &self.is_telegram_context())
            .field("token", &self.token().map(|_| "***"))
            .field("layout_class", &self.layout_class())
            .finish()
    }
}
