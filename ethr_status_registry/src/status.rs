use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    credential::DecodedCredential,
    did_doc::KeyDocument,
    error::{Result, StatusRegistryError},
};

/// Outcome of a status check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusVerdict {
    Revocable { revoked: bool },
    /// The credential carries no status entry, so it cannot be revoked.
    NonRevocable,
}

impl StatusVerdict {
    pub fn is_revoked(&self) -> bool {
        matches!(self, StatusVerdict::Revocable { revoked: true })
    }
}

impl Serialize for StatusVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            StatusVerdict::Revocable { revoked } => map.serialize_entry("revoked", revoked)?,
            StatusVerdict::NonRevocable => map.serialize_entry("status", "NonRevocable")?,
        }
        map.end()
    }
}

/// A credential status method, checked against the issuer's key document.
#[async_trait]
pub trait StatusMethod: Send + Sync {
    async fn check_status(&self, credential: &str, doc: &KeyDocument) -> Result<StatusVerdict>;
}

/// Routes a credential to the [`StatusMethod`] named by its status entry.
#[derive(Clone, Default)]
pub struct StatusDispatcher {
    methods: HashMap<String, Arc<dyn StatusMethod>>,
}

impl StatusDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, (name, method): (&str, Arc<dyn StatusMethod>)) -> Self {
        self.methods.insert(name.to_owned(), method);
        self
    }

    pub async fn check_status(&self, credential: &str, doc: &KeyDocument) -> Result<StatusVerdict> {
        let decoded = DecodedCredential::decode(credential)?;
        let Some(status) = decoded.status else {
            return Ok(StatusVerdict::NonRevocable);
        };

        let method = self
            .methods
            .get(&status.method)
            .ok_or(StatusRegistryError::UnsupportedStatusMethod(status.method))?;
        method.check_status(credential, doc).await
    }
}
