//! The fixed set of authentication lifecycle events.
//!
//! Every event is a plain payload struct tied to exactly one [`EventKind`].
//! Events are cloned once per subscriber and never mutated after publish.

use crate::core::contracts::{IEvent, sealed};
use crate::core::models::{Principal, ProfileView, RequestContext, SessionToken};
use crate::core::secret::Secret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    LoginBeforeValidation,
    StrategyBeforeValidation,
    ValidationFailed,
    ValidationSucceeded,
    AfterLogin,
    BeforeProfile,
    AfterProfile,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::LoginBeforeValidation,
        EventKind::StrategyBeforeValidation,
        EventKind::ValidationFailed,
        EventKind::ValidationSucceeded,
        EventKind::AfterLogin,
        EventKind::BeforeProfile,
        EventKind::AfterProfile,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::LoginBeforeValidation => "auth.login.before_validation",
            EventKind::StrategyBeforeValidation => "auth.strategy.before_validation",
            EventKind::ValidationFailed => "auth.strategy.validation_failed",
            EventKind::ValidationSucceeded => "auth.strategy.validation_success",
            EventKind::AfterLogin => "auth.login.after_login",
            EventKind::BeforeProfile => "auth.profile.before_profile",
            EventKind::AfterProfile => "auth.profile.after_profile",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether credential events carry the presented secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSecretPolicy {
    #[default]
    Redact,
    Expose,
}

/// Identifier/secret pair as seen by subscribers.
///
/// With [`EventSecretPolicy::Redact`] the secret is `None`.
#[derive(Debug, Clone)]
pub struct CredentialPayload {
    pub identifier: String,
    pub secret: Option<Arc<Secret<String>>>,
}

impl CredentialPayload {
    pub(crate) fn new(
        identifier: &str,
        secret: &Arc<Secret<String>>,
        policy: EventSecretPolicy,
    ) -> Self {
        let secret = match policy {
            EventSecretPolicy::Redact => None,
            EventSecretPolicy::Expose => Some(Arc::clone(secret)),
        };
        Self {
            identifier: identifier.to_string(),
            secret,
        }
    }

    pub fn is_redacted(&self) -> bool {
        self.secret.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct LoginBeforeValidation {
    pub context: RequestContext,
}

#[derive(Debug, Clone)]
pub struct StrategyBeforeValidation {
    pub credential: CredentialPayload,
}

#[derive(Debug, Clone)]
pub struct ValidationFailed {
    pub credential: CredentialPayload,
}

#[derive(Debug, Clone)]
pub struct ValidationSucceeded {
    pub principal: Principal,
}

#[derive(Debug, Clone)]
pub struct AfterLogin {
    pub token: SessionToken,
}

#[derive(Debug, Clone)]
pub struct BeforeProfile {
    pub principal: Principal,
}

#[derive(Debug, Clone)]
pub struct AfterProfile {
    pub profile: ProfileView,
}

macro_rules! lifecycle_event {
    ($($event:ty => $kind:expr),+ $(,)?) => {
        $(
            impl sealed::Sealed for $event {}
            impl IEvent for $event {
                const KIND: EventKind = $kind;
            }
        )+
    };
}

lifecycle_event! {
    LoginBeforeValidation => EventKind::LoginBeforeValidation,
    StrategyBeforeValidation => EventKind::StrategyBeforeValidation,
    ValidationFailed => EventKind::ValidationFailed,
    ValidationSucceeded => EventKind::ValidationSucceeded,
    AfterLogin => EventKind::AfterLogin,
    BeforeProfile => EventKind::BeforeProfile,
    AfterProfile => EventKind::AfterProfile,
}
