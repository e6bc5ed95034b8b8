//! Mock collaborators and an event recorder shared by the unit tests.

use crate::core::contracts::{
    ICredentialChecker, IEvent, IModuleUnit, IProfileMapper, ITokenIssuer, ITokenVerifier,
};
use crate::core::error_bus::BoxError;
use crate::core::event_handlers::EventBus;
use crate::core::events::*;
use crate::core::models::{Principal, ProfileView, SessionToken};
use crate::core::secret::Secret;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn principal(id: &str) -> Principal {
    let mut profile = Map::new();
    profile.insert("email".into(), json!(format!("{id}@example.com")));
    Principal::new(id, profile)
}

#[derive(Default)]
pub(crate) struct StaticCredentialChecker {
    pub users: HashMap<String, (String, Principal)>,
    pub calls: AtomicUsize,
    pub broken: bool,
}

impl StaticCredentialChecker {
    pub(crate) fn with_user(mut self, identifier: &str, secret: &str, principal: Principal) -> Self {
        self.users
            .insert(identifier.to_string(), (secret.to_string(), principal));
        self
    }
}

#[async_trait]
impl ICredentialChecker for StaticCredentialChecker {
    async fn check_credentials(
        &self,
        identifier: &str,
        secret: &Secret<String>,
    ) -> Result<Option<Principal>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err("user store unavailable".into());
        }
        Ok(self
            .users
            .get(identifier)
            .filter(|(expected, _)| expected == secret.expose_secret())
            .map(|(_, principal)| principal.clone()))
    }
}

#[derive(Default)]
pub(crate) struct MockTokenIssuer {
    pub broken: bool,
}

#[async_trait]
impl ITokenIssuer for MockTokenIssuer {
    async fn issue_token(
        &self,
        principal: &Principal,
        extended_lifetime: bool,
    ) -> Result<SessionToken, BoxError> {
        if self.broken {
            return Err("signing key missing".into());
        }
        let lifetime = if extended_lifetime { "30d" } else { "1h" };
        Ok(SessionToken::new(format!("{}:{lifetime}", principal.id())))
    }
}

pub(crate) struct CopyProfileMapper;

#[async_trait]
impl IProfileMapper for CopyProfileMapper {
    async fn to_profile_view(&self, principal: &Principal) -> ProfileView {
        ProfileView {
            id: principal.id().to_string(),
            attributes: principal.profile().clone(),
        }
    }
}

#[derive(Default)]
pub(crate) struct StaticTokenVerifier {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenVerifier {
    pub(crate) fn with_token(mut self, token: &str, principal: Principal) -> Self {
        self.tokens.insert(token.to_string(), principal);
        self
    }
}

#[async_trait]
impl ITokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Option<Principal>, BoxError> {
        if token == "malformed" {
            return Err("token is not a JWT".into());
        }
        Ok(self.tokens.get(token).cloned())
    }
}

/// Records the kind of every lifecycle event, in delivery order.
pub(crate) fn record_events(bus: &EventBus) -> Arc<Mutex<Vec<EventKind>>> {
    fn hook<E: IEvent>(bus: &EventBus, trace: &Arc<Mutex<Vec<EventKind>>>) {
        let trace = trace.clone();
        bus.subscribe_fn(move |_: E| {
            let trace = trace.clone();
            async move {
                trace.lock().push(E::KIND);
                Ok(())
            }
        })
        .expect("bus is not sealed in tests");
    }

    let trace = Arc::new(Mutex::new(Vec::new()));
    hook::<LoginBeforeValidation>(bus, &trace);
    hook::<StrategyBeforeValidation>(bus, &trace);
    hook::<ValidationFailed>(bus, &trace);
    hook::<ValidationSucceeded>(bus, &trace);
    hook::<AfterLogin>(bus, &trace);
    hook::<BeforeProfile>(bus, &trace);
    hook::<AfterProfile>(bus, &trace);
    trace
}

/// Module unit that subscribes a counter to `AfterLogin`.
pub(crate) struct CountingUnit {
    pub name: String,
    pub seen: Arc<AtomicUsize>,
}

impl CountingUnit {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seen: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl IModuleUnit for CountingUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn install(&self, bus: &EventBus) -> Result<(), BoxError> {
        let seen = self.seen.clone();
        bus.subscribe_fn(move |_: AfterLogin| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })?;
        Ok(())
    }
}
