use crate::core::contracts::{IProfileMapper, ITokenIssuer};
use crate::core::error_bus::AuthError;
use crate::core::event_handlers::EventBus;
use crate::core::events::{
    AfterLogin, AfterProfile, BeforeProfile, EventSecretPolicy, LoginBeforeValidation,
};
use crate::core::models::{Credential, Principal, ProfileView, RequestContext, SessionToken};
use crate::core::validator::{CredentialValidator, LocalStrategy};
use std::sync::Arc;

/// Login and profile flows, each wrapped in lifecycle events.
///
/// Flows are request-scoped and share nothing but the bus and the
/// collaborators, so any number may run concurrently.
pub struct AuthenticationPipeline {
    bus: Arc<EventBus>,
    strategy: LocalStrategy,
    tokens: Arc<dyn ITokenIssuer>,
    profiles: Arc<dyn IProfileMapper>,
}

impl AuthenticationPipeline {
    pub fn new(
        bus: Arc<EventBus>,
        validator: CredentialValidator,
        tokens: Arc<dyn ITokenIssuer>,
        profiles: Arc<dyn IProfileMapper>,
    ) -> Self {
        Self {
            strategy: LocalStrategy::new(validator, bus.clone()),
            bus,
            tokens,
            profiles,
        }
    }

    pub fn with_secret_policy(mut self, secret_policy: EventSecretPolicy) -> Self {
        self.strategy = self.strategy.with_secret_policy(secret_policy);
        self
    }

    /// Validates `credential` once and issues a session token.
    ///
    /// `remember_me` only selects the token lifetime.
    pub async fn login(
        &self,
        context: RequestContext,
        credential: Credential,
        remember_me: bool,
    ) -> Result<SessionToken, AuthError> {
        self.bus.publish(LoginBeforeValidation { context }).await;

        let principal = self.strategy.validate(credential).await?;

        let token = self
            .tokens
            .issue_token(&principal, remember_me)
            .await
            .map_err(|err| AuthError::TokenIssuance(err.to_string()))?;

        self.bus
            .publish(AfterLogin {
                token: token.clone(),
            })
            .await;

        Ok(token)
    }

    /// `principal` must already be authorized by the caller's guard.
    pub async fn profile(&self, principal: &Principal) -> ProfileView {
        self.bus
            .publish(BeforeProfile {
                principal: principal.clone(),
            })
            .await;

        let view = self.profiles.to_profile_view(principal).await;

        self.bus
            .publish(AfterProfile {
                profile: view.clone(),
            })
            .await;

        view
    }
}
