//! Access authority - credential check and operating-mode state machine.
//!
//! Two states: anonymous and authenticated(mode). Every privileged call
//! into the engine passes through [`AccessAuthority::authorize`]; mode
//! suitability for a given action is checked by the façade, so identity
//! and mode remain independently queryable.
//!
//! The credential check is pluggable via [`CredentialVerifier`]. The
//! bundled [`StaticVerifier`] is a functional placeholder carrying the
//! observed system's fixed pair; production deployments inject a real
//! verifier.

use std::fmt;
use std::sync::RwLock;

use crate::error::EngineError;

/// Credential input for [`AccessAuthority::authenticate`]. Consumed by
/// value so the input is dropped after the check.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Pluggable credential check.
pub trait CredentialVerifier: Send + Sync {
    /// Returns true when the credentials identify a privileged operator.
    fn verify(&self, credentials: &Credentials) -> bool;
}

/// Fixed-pair verifier. Placeholder for development and tests, not a
/// security model.
pub struct StaticVerifier {
    username: String,
    password: String,
}

impl StaticVerifier {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for StaticVerifier {
    /// The pair the observed system shipped with.
    fn default() -> Self {
        Self::new("Admin", "password123")
    }
}

impl CredentialVerifier for StaticVerifier {
    fn verify(&self, credentials: &Credentials) -> bool {
        credentials.username == self.username && credentials.password == self.password
    }
}

/// Privileged action family selected by an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    /// Plain navigation; taps select destinations.
    #[default]
    Navigate,
    /// Taps create new locations (closed by default).
    Create,
    /// Taps toggle accessibility.
    Edit,
    /// Taps remove locations.
    Delete,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate => write!(f, "Navigate"),
            Self::Create => write!(f, "Create"),
            Self::Edit => write!(f, "Edit"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Ephemeral authenticated session. Dropped on logout; never persisted.
#[derive(Debug, Clone)]
struct Session {
    actor: String,
    mode: OperatingMode,
}

/// Credential check plus operating-mode state machine.
pub struct AccessAuthority {
    verifier: Box<dyn CredentialVerifier>,
    session: RwLock<Option<Session>>,
}

impl AccessAuthority {
    pub fn new(verifier: Box<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            session: RwLock::new(None),
        }
    }

    /// Attempt to authenticate. On success the session enters
    /// [`OperatingMode::Create`], the observed system's default editor
    /// mode. On failure the session stays anonymous.
    pub fn authenticate(&self, credentials: Credentials) -> Result<(), EngineError> {
        if !self.verifier.verify(&credentials) {
            tracing::warn!(username = %credentials.username, "login rejected");
            return Err(EngineError::Unauthorized);
        }
        let actor = credentials.username;
        tracing::info!(actor = %actor, "login successful");
        *self.session.write().unwrap() = Some(Session {
            actor,
            mode: OperatingMode::Create,
        });
        Ok(())
    }

    /// Return to anonymous unconditionally. The mode is discarded with
    /// the session.
    pub fn logout(&self) {
        if let Some(session) = self.session.write().unwrap().take() {
            tracing::info!(actor = %session.actor, "logged out");
        }
    }

    /// Switch operating mode. Legal only while authenticated; switching
    /// to the current mode is a no-op.
    pub fn set_mode(&self, mode: OperatingMode) -> Result<(), EngineError> {
        let mut session = self.session.write().unwrap();
        match session.as_mut() {
            Some(session) => {
                if session.mode != mode {
                    tracing::debug!(mode = %mode, "operating mode changed");
                    session.mode = mode;
                }
                Ok(())
            }
            None => Err(EngineError::Forbidden),
        }
    }

    /// True only while authenticated. Callers are responsible for also
    /// checking mode suitability before mutating the registry.
    pub fn authorize(&self) -> bool {
        self.session.read().unwrap().is_some()
    }

    /// Current operating mode, while authenticated.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.session.read().unwrap().as_ref().map(|s| s.mode)
    }

    /// Label of the authenticated actor, while authenticated.
    pub fn actor(&self) -> Option<String> {
        self.session.read().unwrap().as_ref().map(|s| s.actor.clone())
    }
}
