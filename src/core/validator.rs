use crate::core::contracts::ICredentialChecker;
use crate::core::error_bus::AuthError;
use crate::core::event_handlers::EventBus;
use crate::core::events::{
    CredentialPayload, EventSecretPolicy, StrategyBeforeValidation, ValidationFailed,
    ValidationSucceeded,
};
use crate::core::models::{Credential, Principal};
use crate::core::secret::Secret;
use std::sync::Arc;

/// Maps an identifier/secret pair to a [`Principal`].
///
/// Publishes nothing, so it can be reused outside an instrumented flow.
/// Unknown identifiers and wrong secrets both yield
/// [`AuthError::InvalidCredentials`].
#[derive(Clone)]
pub struct CredentialValidator {
    checker: Arc<dyn ICredentialChecker>,
}

impl CredentialValidator {
    pub fn new(checker: Arc<dyn ICredentialChecker>) -> Self {
        Self { checker }
    }

    pub async fn validate(
        &self,
        identifier: &str,
        secret: &Secret<String>,
    ) -> Result<Principal, AuthError> {
        match self.checker.check_credentials(identifier, secret).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => Err(AuthError::InvalidCredentials),
            Err(err) => Err(AuthError::CredentialLookup(err.to_string())),
        }
    }
}

/// [`CredentialValidator`] instrumented with the strategy lifecycle events.
pub struct LocalStrategy {
    validator: CredentialValidator,
    bus: Arc<EventBus>,
    secret_policy: EventSecretPolicy,
}

impl LocalStrategy {
    pub fn new(validator: CredentialValidator, bus: Arc<EventBus>) -> Self {
        Self {
            validator,
            bus,
            secret_policy: EventSecretPolicy::default(),
        }
    }

    pub fn with_secret_policy(mut self, secret_policy: EventSecretPolicy) -> Self {
        self.secret_policy = secret_policy;
        self
    }

    /// Emits `before_validation`, then exactly one of `validation_success` or
    /// `validation_failed`. A failed lookup emits no outcome event.
    pub async fn validate(&self, credential: Credential) -> Result<Principal, AuthError> {
        let (identifier, secret) = credential.into_parts();
        let secret = Arc::new(secret);

        self.bus
            .publish(StrategyBeforeValidation {
                credential: CredentialPayload::new(&identifier, &secret, self.secret_policy),
            })
            .await;

        match self.validator.validate(&identifier, &secret).await {
            Ok(principal) => {
                self.bus
                    .publish(ValidationSucceeded {
                        principal: principal.clone(),
                    })
                    .await;
                Ok(principal)
            }
            Err(AuthError::InvalidCredentials) => {
                self.bus
                    .publish(ValidationFailed {
                        credential: CredentialPayload::new(
                            &identifier,
                            &secret,
                            self.secret_policy,
                        ),
                    })
                    .await;
                Err(AuthError::InvalidCredentials)
            }
            Err(err) => Err(err),
        }
    }
}
