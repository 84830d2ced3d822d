use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::Address;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    config::Networks,
    credential::{DecodedCredential, METHOD_NAME},
    did_doc::{KeyDocument, RevokerSet},
    error::{Result, StatusRegistryError},
    fingerprint::CredentialFingerprint,
    ledger::{LedgerError, RevocationRegistryClient},
    registry_id::parse_registry_id,
    status::{StatusMethod, StatusVerdict},
};

pub const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 8;

/// Resolves `EthrStatusRegistry2019` credential statuses.
pub struct EthrStatusResolver {
    networks: Arc<Networks>,
    max_concurrent_queries: usize,
}

impl EthrStatusResolver {
    pub fn new(networks: Arc<Networks>) -> Self {
        Self {
            networks,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }

    /// Caps how many registry queries run at once for a single credential.
    pub fn with_max_concurrent_queries(mut self, limit: usize) -> Self {
        self.max_concurrent_queries = limit.max(1);
        self
    }

    /// This resolver keyed by the status method it handles, for a
    /// [`crate::status::StatusDispatcher`].
    pub fn as_status_method(self) -> (&'static str, Arc<dyn StatusMethod>) {
        (METHOD_NAME, Arc::new(self))
    }

    /// Checks whether any revoker listed in `doc` has revoked `credential`.
    ///
    /// Fails before touching the network if the status entry is unsupported,
    /// unparsable or points at an unconfigured network. Once the registry is
    /// queried, every query is awaited; a single unreachable query fails the
    /// whole check with [`StatusRegistryError::ConnectivityError`], even if
    /// another revoker already answered `true`.
    pub async fn check_status(&self, credential: &str, doc: &KeyDocument) -> Result<StatusVerdict> {
        let decoded = DecodedCredential::decode(credential)?;

        let Some(status) = decoded.status else {
            tracing::debug!("credential has no status entry");
            return Ok(StatusVerdict::NonRevocable);
        };

        if status.method != METHOD_NAME {
            return Err(StatusRegistryError::UnsupportedStatusMethod(status.method));
        }

        let coords = parse_registry_id(&status.id)?;
        let client = self
            .networks
            .get(&coords.network_tag)
            .ok_or_else(|| StatusRegistryError::NetworkNotConfigured(coords.network_tag.clone()))?;

        let revokers = doc.revokers();
        tracing::debug!(
            issuer = ?decoded.issuer,
            registry = %coords,
            revokers = revokers.len(),
            "checking credential status"
        );

        let digest = CredentialFingerprint::of(credential);
        let revoked = self
            .query_revokers(client, coords.registry_address, revokers, digest)
            .await?;

        Ok(StatusVerdict::Revocable { revoked })
    }

    async fn query_revokers(
        &self,
        client: Arc<dyn RevocationRegistryClient>,
        registry: Address,
        revokers: RevokerSet,
        digest: CredentialFingerprint,
    ) -> Result<bool> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_queries));

        // dropping the set aborts whatever is still running
        let mut queries = JoinSet::new();
        for revoker in revokers {
            let client = client.clone();
            let permits = permits.clone();
            queries.spawn(async move {
                let answer = match permits.acquire_owned().await {
                    Ok(_permit) => client.revoked(registry, revoker, digest).await,
                    Err(e) => Err(LedgerError::Execution(e.to_string())),
                };
                (revoker, answer)
            });
        }

        let mut revoked = false;
        let mut unreachable = None;
        let mut failure = None;

        while let Some(joined) = queries.join_next().await {
            match joined {
                Ok((_, Ok(answer))) => revoked |= answer,
                Ok((revoker, Err(LedgerError::Connectivity(msg)))) => {
                    tracing::warn!(revoker = ?revoker, error = %msg, "registry unreachable");
                    unreachable.get_or_insert(msg);
                }
                Ok((revoker, Err(err))) => {
                    tracing::warn!(revoker = ?revoker, error = %err, "registry query failed");
                    failure.get_or_insert(StatusRegistryError::LedgerExecutionError(err.to_string()));
                }
                Err(e) => {
                    failure.get_or_insert(StatusRegistryError::LedgerExecutionError(format!(
                        "registry query did not complete: {e}"
                    )));
                }
            }
        }

        if let Some(msg) = unreachable {
            return Err(StatusRegistryError::ConnectivityError(msg));
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(revoked)
    }
}

#[async_trait]
impl StatusMethod for EthrStatusResolver {
    async fn check_status(&self, credential: &str, doc: &KeyDocument) -> Result<StatusVerdict> {
        EthrStatusResolver::check_status(self, credential, doc).await
    }
}
