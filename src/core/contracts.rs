use crate::core::error_bus::BoxError;
use crate::core::event_handlers::EventBus;
use crate::core::events::EventKind;
use crate::core::models::{Principal, ProfileView, SessionToken};
use crate::core::secret::Secret;
use async_trait::async_trait;
use std::any::{Any, type_name};
use std::fmt::Debug;
use std::sync::Arc;

pub trait TypeNamed {
    fn type_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<T> TypeNamed for T {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A lifecycle event payload. The set of events is closed; see [`crate::core::events`].
pub trait IEvent: sealed::Sealed + TypeNamed + Clone + Debug + Send + Sync + 'static {
    const KIND: EventKind;
}

#[async_trait]
pub trait IEventHandler<TEvent>: Send + Sync + 'static
where
    TEvent: IEvent,
{
    async fn handle_async(&self, event: TEvent) -> Result<(), BoxError>;
}

#[async_trait]
pub trait IErasedEventHandler: Send + Sync {
    fn subscriber_name(&self) -> &'static str;

    async fn handle(&self, event: Box<dyn Any + Send + Sync>) -> Result<(), BoxError>;
}

#[async_trait]
pub trait IEventPipeline: Send + Sync {
    async fn handle(
        &self,
        kind: EventKind,
        event: Box<dyn Any + Send + Sync>,
        next: Arc<dyn IErasedEventHandler>,
    ) -> Result<(), BoxError>;
}

/// A unit of the composition graph. Base units and plugin units look the same.
pub trait IModuleUnit: Send + Sync {
    fn name(&self) -> &str;

    /// Registers the unit's subscribers. Called once, before the bus is sealed.
    fn install(&self, bus: &EventBus) -> Result<(), BoxError>;
}

#[async_trait]
pub trait ICredentialChecker: Send + Sync {
    /// `Ok(None)` when the identifier is unknown or the secret does not match.
    async fn check_credentials(
        &self,
        identifier: &str,
        secret: &Secret<String>,
    ) -> Result<Option<Principal>, BoxError>;
}

#[async_trait]
pub trait ITokenIssuer: Send + Sync {
    async fn issue_token(
        &self,
        principal: &Principal,
        extended_lifetime: bool,
    ) -> Result<SessionToken, BoxError>;
}

#[async_trait]
pub trait IProfileMapper: Send + Sync {
    async fn to_profile_view(&self, principal: &Principal) -> ProfileView;
}

#[async_trait]
pub trait ITokenVerifier: Send + Sync {
    /// `Ok(None)` for tokens that are well-formed but not valid (expired, revoked, unknown).
    async fn verify(&self, token: &str) -> Result<Option<Principal>, BoxError>;
}
