use crate::core::events::EventKind;
use chrono::{DateTime, Utc};
use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error, PartialEq)]
pub enum BusError {
    #[error(
        "BusError: cannot subscribe to '{0}', the bus has been sealed. \
Subscribers must be registered while modules are installed, before the application serves requests."
    )]
    BusSealed(EventKind),

    #[error("BusError: cannot register an event pipeline, the bus has been sealed.")]
    PipelineSealed,

        #[error("BusError: Incorrect Event type '{0}' by handler '{1}'")]
    EventTypeMismatch(String, String),

    #[error("BusError: Plugin registered already: '{0}'")]
    PluginAlreadyRegistered(String),

    #[error("BusError: Cant read plugin configuration '{0}' error '{1}'")]
    ConfigRead(String, String),

    #[error("BusError: Invalid plugin configuration '{0}' error '{1}'")]
    ConfigInvalid(String, String),

    #[error("BusError: Module '{0}' failed to install: '{1}'")]
    ModuleInstallFailed(String, String),
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    /// Deliberately does not say whether the identifier or the secret was wrong.
    #[error("AuthError: Email or password do not match")]
    InvalidCredentials,

    #[error("AuthError: Unauthenticated")]
    Unauthenticated,

    #[error("AuthError: Credential lookup failed: '{0}'")]
    CredentialLookup(String),

    #[error("AuthError: Token issuance failed: '{0}'")]
    TokenIssuance(String),

    #[error("AuthError: Token verification failed: '{0}'")]
    TokenVerification(String),
}

impl AuthError {
    /// `true` for failures the transport layer should surface as 401 Unauthorized.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::Unauthenticated)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PluginResolutionFailure {
    #[error("PluginError: No plugin registered under name '{0}'")]
    Unresolvable(String),

    #[error("PluginError: Plugin '{0}' failed to load: '{1}'")]
    LoadFailed(String, String),
}

impl PluginResolutionFailure {
    pub fn plugin_name(&self) -> &str {
        match self {
            PluginResolutionFailure::Unresolvable(name) => name,
            PluginResolutionFailure::LoadFailed(name, _) => name,
        }
    }
}

/// A subscriber that returned an error or panicked while handling an event.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberFailure {
    pub kind: EventKind,
    pub subscriber: &'static str,
    pub reason: String,
    pub panicked: bool,
    pub occurred_at: DateTime<Utc>,
}

impl std::fmt::Display for SubscriberFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.panicked { "panicked" } else { "failed" };
        write!(
            f,
            "SubscriberFailure: '{}' {} on '{}': {}",
            self.subscriber, verb, self.kind, self.reason
        )
    }
}
