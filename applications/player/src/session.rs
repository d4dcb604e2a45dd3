//! Session-local admin gate
//!
//! Checked once per process against the configured credential pair. This
//! only hides library mutation behind a login; it protects nothing.

use crate::config::AdminSettings;
use crate::error::{PlayerError, Result};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminSession {
    granted: bool,
}

impl AdminSession {
    /// Log in with optional credentials
    ///
    /// Missing credentials give a guest session. An unconfigured pair never
    /// matches.
    pub fn login(settings: &AdminSettings, username: Option<&str>, password: Option<&str>) -> Self {
        let (Some(username), Some(password)) = (username, password) else {
            return Self::default();
        };

        if settings.username.is_empty() || settings.password.is_empty() {
            warn!("Admin credentials given but no admin account is configured");
            return Self::default();
        }

        let granted = username == settings.username && password == settings.password;
        if granted {
            info!(user = %username, "Admin session granted");
        } else {
            warn!(user = %username, "Admin login rejected");
        }
        Self { granted }
    }

    pub fn is_admin(&self) -> bool {
        self.granted
    }

    /// Fail unless this is an admin session
    pub fn require_admin(&self, action: &str) -> Result<()> {
        if self.granted {
            Ok(())
        } else {
            Err(PlayerError::Unauthorized(format!(
                "{} requires admin credentials (--admin-user / --admin-password)",
                action
            )))
        }
    }
}
