//! Persisted login session.
//!
//! The access token and user ID are kept in a single JSON file under a
//! configurable directory (default: `$XDG_DATA_HOME/fintrack-rs/`), so the
//! CLI stays logged in between runs.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{FinTrackError, Result};
use crate::models::{Session, UserId};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "fintrack-rs";

/// Session file name.
const SESSION_FILE: &str = "session.json";

/// On-disk form of a [`Session`].
#[derive(Serialize, Deserialize)]
struct StoredSession {
    /// Bearer access token.
    token: String,
    /// Logged-in user.
    user_id: UserId,
    /// E-mail used to log in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: SecretString::from(stored.token),
            user_id: stored.user_id,
            email: stored.email,
        }
    }
}

/// File-backed store for the current [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Directory holding the session file.
    dir: PathBuf,
}

impl SessionStore {
    /// Creates a store rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(session_io_error)?;
        Ok(Self { dir })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/fintrack-rs/` (typically
    /// `~/.local/share/fintrack-rs/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                FinTrackError::Session("could not determine platform data directory".into())
            })
    }

    /// Directory holding the session file.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the saved session, or `None` if nobody is logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[inline]
    pub fn load(&self) -> Result<Option<Session>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).map_err(session_io_error)?;
        let stored: StoredSession = serde_json::from_str(&data)?;
        tracing::debug!(user_id = %stored.user_id, "loaded session");
        Ok(Some(stored.into()))
    }

    /// Atomically saves the session (write-to-tmp then rename).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[inline]
    pub fn save(&self, session: &Session) -> Result<()> {
        let stored = StoredSession {
            token: session.token.expose_secret().to_owned(),
            user_id: session.user_id,
            email: session.email.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        let path = self.path();
        let tmp_path = self.dir.join(format!("{SESSION_FILE}.tmp"));
        fs::write(&tmp_path, json).map_err(session_io_error)?;
        restrict_permissions(&tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(session_io_error)?;
        tracing::debug!(user_id = %session.user_id, "saved session");
        Ok(())
    }

    /// Removes the saved session. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    #[inline]
    pub fn clear(&self) -> Result<bool> {
        let path = self.path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(session_io_error)?;
        Ok(true)
    }

    /// Full path of the session file.
    fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }
}

/// Makes the session file readable by its owner only.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt as _;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(session_io_error)
}

/// Makes the session file readable by its owner only.
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps, reason = "matches the unix signature")]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Converts an I/O error into a session error.
fn session_io_error(err: std::io::Error) -> FinTrackError {
    FinTrackError::Session(Box::new(err))
}
