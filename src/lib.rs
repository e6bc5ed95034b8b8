pub mod core;
pub mod registry;

pub use crate::core::auth_pipeline::AuthenticationPipeline;
pub use crate::core::config::{DEFAULT_CONFIG_FILE, PluginConfig, PluginConfigSource};
pub use crate::core::contracts::{
    ICredentialChecker, IEvent, IEventHandler, IEventPipeline, IModuleUnit, IProfileMapper,
    ITokenIssuer, ITokenVerifier,
};
pub use crate::core::error_bus::{
    AuthError, BoxError, BusError, PluginResolutionFailure, SubscriberFailure,
};
pub use crate::core::event_handlers::{EventBus, PublishReport};
pub use crate::core::events::*;
pub use crate::core::factory::PluginProvidesFactory;
pub use crate::core::guards::{
    AccessGuard, AccessRequirement, Caller, EndpointAccessTable, PresentedAuth,
};
pub use crate::core::initialization::{
    Application, BootstrapReport, Collaborators, CompositionGraph, CompositionRoot, compose,
};
pub use crate::core::models::{Credential, Principal, ProfileView, RequestContext, SessionToken};
pub use crate::core::plugins::{PluginResolution, PluginResolver};
pub use crate::core::registry::{LoadedModule, PluginCatalog};
pub use crate::core::secret::Secret;
pub use crate::core::validator::{CredentialValidator, LocalStrategy};
