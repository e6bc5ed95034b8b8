//! Endpoint access requirements as plain data.
//!
//! Each endpoint key maps to an [`AccessRequirement`]; the [`AccessGuard`]
//! consults the table before a handler runs. Credential endpoints are not
//! validated here: the guard hands the credential to the login flow, which
//! validates it exactly once.

use crate::core::contracts::ITokenVerifier;
use crate::core::error_bus::AuthError;
use crate::core::models::{Credential, Principal};
use crate::core::secret::Secret;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const LOGIN_ENDPOINT: &str = "auth/login";
pub const PROFILE_ENDPOINT: &str = "auth/profile";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRequirement {
    Public,
    LocalCredentials,
    BearerToken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointAccessTable {
    routes: HashMap<String, AccessRequirement>,
    fallback: AccessRequirement,
}

impl EndpointAccessTable {
    pub fn new(fallback: AccessRequirement) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, endpoint: impl Into<String>, requirement: AccessRequirement) -> Self {
        self.routes.insert(endpoint.into(), requirement);
        self
    }

    /// Login takes credentials, profile takes a bearer token, the rest is public.
    pub fn auth_defaults() -> Self {
        Self::new(AccessRequirement::Public)
            .with(LOGIN_ENDPOINT, AccessRequirement::LocalCredentials)
            .with(PROFILE_ENDPOINT, AccessRequirement::BearerToken)
    }

    pub fn requirement(&self, endpoint: &str) -> AccessRequirement {
        self.routes.get(endpoint).copied().unwrap_or(self.fallback)
    }
}

/// What the transport layer extracted from the request.
#[derive(Debug)]
pub enum PresentedAuth {
    Nothing,
    Credentials(Credential),
    Bearer(Secret<String>),
}

#[derive(Debug)]
pub enum Caller {
    Anonymous,
    /// Credentials that still have to go through the login flow.
    CredentialsPending(Credential),
    Authenticated(Principal),
}

pub struct AccessGuard {
    table: EndpointAccessTable,
    verifier: Arc<dyn ITokenVerifier>,
}

impl AccessGuard {
    pub fn new(table: EndpointAccessTable, verifier: Arc<dyn ITokenVerifier>) -> Self {
        Self { table, verifier }
    }

    pub fn table(&self) -> &EndpointAccessTable {
        &self.table
    }

    pub async fn authorize(
        &self,
        endpoint: &str,
        presented: PresentedAuth,
    ) -> Result<Caller, AuthError> {
        match (self.table.requirement(endpoint), presented) {
            (AccessRequirement::Public, _) => Ok(Caller::Anonymous),
            (AccessRequirement::LocalCredentials, PresentedAuth::Credentials(credential)) => {
                Ok(Caller::CredentialsPending(credential))
            }
            (AccessRequirement::BearerToken, PresentedAuth::Bearer(token)) => {
                match self.verifier.verify(token.expose_secret()).await {
                    Ok(Some(principal)) => Ok(Caller::Authenticated(principal)),
                    Ok(None) => Err(AuthError::Unauthenticated),
                    Err(err) => Err(AuthError::TokenVerification(err.to_string())),
                }
            }
            _ => Err(AuthError::Unauthenticated),
        }
    }
}
