use crate::core::secret::Secret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity produced by a successful credential check. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    id: String,
    profile: Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<String>, profile: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            profile,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.profile.get(key)
    }
}

/// Identifier/secret pair presented for validation. Lives for one validation call.
#[derive(Debug)]
pub struct Credential {
    identifier: String,
    secret: Secret<String>,
}

impl Credential {
    pub fn new(identifier: impl Into<String>, secret: impl Into<Secret<String>>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &Secret<String> {
        &self.secret
    }

    pub(crate) fn into_parts(self) -> (String, Secret<String>) {
        (self.identifier, self.secret)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
}

impl SessionToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

/// Client-facing projection of a [`Principal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub id: String,
    pub attributes: Map<String, Value>,
}

/// Per-request context handed to lifecycle events that carry nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    pub remote_addr: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = Some(remote_addr.into());
        self
    }
}
