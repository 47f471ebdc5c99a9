//! Collaborator interfaces the client requires from its host environment.
//!
//! The core only needs three narrow seams: somewhere to read and evict the
//! persisted auth token, somewhere to surface transient messages, and a way
//! to send the user back to the login entry point when the session expires.
//! Hosts (CLI, embedded UI) supply their own implementations.

use std::sync::Arc;

/// Persisted-credential store.
pub trait CredentialStore: Send + Sync {
    /// Read the current auth token, if one is persisted.
    fn read_token(&self) -> Option<String>;

    /// Remove the persisted auth token.
    fn evict_token(&self);
}

/// User-notification sink. Fire-and-forget; no return value is consumed.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
}

/// Navigation trigger for redirect-on-session-expiry.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Bundle of the three collaborators, shared across the client.
#[derive(Clone)]
pub struct Platform {
    pub credentials: Arc<dyn CredentialStore>,
    pub notifier: Arc<dyn NotificationSink>,
    pub navigator: Arc<dyn Navigator>,
}

impl Platform {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            credentials,
            notifier,
            navigator,
        }
    }
}
