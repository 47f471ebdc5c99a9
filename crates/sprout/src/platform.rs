//! Terminal implementations of the core's collaborator traits.
//!
//! The CLI keeps the bearer token in a plain file under the config
//! directory, prints transient notifications to stderr, and turns the
//! login redirect into a hint about `sprout login`.

use sprout_core::config::AuthConfig;
use sprout_core::{Config, CredentialStore, Navigator, NotificationSink, Platform};
use std::path::PathBuf;
use std::sync::Arc;

/// Token persisted in a file, path configured via `auth.token_path`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        let expanded = shellexpand::tilde(&config.token_path);
        Self {
            path: PathBuf::from(expanded.as_ref()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Persist a token, creating the parent directory if needed.
    pub fn write_token(&self, token: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }
}

impl CredentialStore for FileTokenStore {
    fn read_token(&self) -> Option<String> {
        std::fs::read_to_string(&self.path)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    fn evict_token(&self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), %err, "failed to remove token file");
            }
        }
    }
}

/// Transient messages go to stderr, keeping stdout clean for data.
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {message}");
    }
}

/// The CLI cannot navigate anywhere; tell the user how to sign in again.
pub struct LoginHintNavigator;

impl Navigator for LoginHintNavigator {
    fn redirect_to_login(&self) {
        eprintln!("Session expired. Run `sprout login --token <token>` to sign in again.");
    }
}

/// Assemble the CLI platform bundle from configuration.
pub fn build_platform(config: &Config) -> Platform {
    Platform::new(
        Arc::new(FileTokenStore::from_config(&config.auth)),
        Arc::new(StderrNotifier),
        Arc::new(LoginHintNavigator),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path) -> FileTokenStore {
        FileTokenStore::from_config(&AuthConfig {
            token_path: dir.join("token").to_string_lossy().into_owned(),
        })
    }

    #[test]
    fn test_token_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.read_token().is_none());
        store.write_token("tok-abc\n").unwrap();
        assert_eq!(store.read_token().unwrap(), "tok-abc");

        store.evict_token();
        assert!(store.read_token().is_none());
    }

    #[test]
    fn test_empty_token_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.write_token("   ").unwrap();
        assert!(store.read_token().is_none());
    }

    #[test]
    fn test_evict_missing_token_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        // No token file exists; eviction must not panic or error.
        store.evict_token();
    }
}
