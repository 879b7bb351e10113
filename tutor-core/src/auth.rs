//! Bearer credential held by the chat session, and its on-disk store.

use anyhow::Context;
use config::PathManager;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Opaque bearer token. Debug output never shows the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential(String);

impl AuthCredential {
    /// Returns `None` for a blank token
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(AuthCredential(token))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthCredential(***)")
    }
}

/// Persists the credential across restarts, sealed with the machine key.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    /// Store under the platform data directory
    pub fn default_location() -> Option<Self> {
        PathManager::session_token_path().map(Self::new)
    }

    /// Load the saved credential. A missing or unreadable file means logged out.
    pub fn load(&self) -> Option<AuthCredential> {
        let sealed = fs::read_to_string(&self.path).ok()?;
        match config::crypto::unseal(sealed.trim()) {
            Ok(token) => AuthCredential::new(token),
            Err(e) => {
                warn!("Ignoring unreadable session token at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, credential: &AuthCredential) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let sealed = config::crypto::seal(credential.token()).map_err(anyhow::Error::msg)?;
        fs::write(&self.path, sealed)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Forget the saved credential. Clearing an absent token is not an error.
    pub fn clear(&self) -> anyhow::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
