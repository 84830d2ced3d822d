use std::sync::Arc;

use ethers::{
    signers::Signer,
    types::{Address, TxHash},
};

use crate::{
    config::Networks,
    credential::{DecodedCredential, METHOD_NAME},
    error::{NotRevocableReason, Result, StatusRegistryError},
    fingerprint::CredentialFingerprint,
    ledger::{LedgerError, RevocationRegistryClient, TxOptions},
    registry_id::parse_registry_id,
    signer::ExternalSigner,
};

/// Revert texts taken to mean the sender already revoked the credential.
/// Reverts without a decoded reason are confirmed against the registry
/// instead, since its `require` carries no message.
pub const DEFAULT_ALREADY_REVOKED_PATTERNS: [&str; 1] = ["already revoked"];

/// Submits revocations to `EthrStatusRegistry2019` registries.
pub struct EthrCredentialRevoker {
    networks: Arc<Networks>,
    already_revoked_patterns: Vec<String>,
}

impl EthrCredentialRevoker {
    pub fn new(networks: Arc<Networks>) -> Self {
        Self {
            networks,
            already_revoked_patterns: DEFAULT_ALREADY_REVOKED_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }

    /// Replaces the case-insensitive substrings used to recognise an
    /// "already revoked" revert.
    pub fn with_already_revoked_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.already_revoked_patterns = patterns
            .into_iter()
            .map(|p| p.into().to_lowercase())
            .collect();
        self
    }

    /// Revokes `credential` in the registry named by its status entry.
    ///
    /// The transaction is sent from `signer` when given, otherwise from the
    /// network's default account. `options` are layered over
    /// [`TxOptions::default`]. Returns as soon as the node accepted the
    /// transaction; it is not awaited to be mined.
    pub async fn revoke(
        &self,
        credential: &str,
        signer: Option<ExternalSigner>,
        options: Option<TxOptions>,
    ) -> Result<TxHash> {
        let decoded = DecodedCredential::decode(credential)?;

        let status = decoded.status.ok_or(StatusRegistryError::CredentialNotRevocable(
            NotRevocableReason::NoStatusEntry,
        ))?;

        if status.method != METHOD_NAME {
            return Err(StatusRegistryError::UnsupportedStatusMethod(status.method));
        }

        let coords = parse_registry_id(&status.id).map_err(|_| {
            StatusRegistryError::CredentialNotRevocable(NotRevocableReason::MalformedRegistryId(
                status.id.clone(),
            ))
        })?;

        let network = self
            .networks
            .get(&coords.network_tag)
            .ok_or_else(|| StatusRegistryError::NetworkNotConfigured(coords.network_tag.clone()))?;

        let client = match signer {
            Some(signer) => {
                tracing::debug!(revoker = ?signer.address(), "revoking with external signer");
                network.with_signer(signer)
            }
            None => network,
        };

        let options = match options {
            Some(overrides) => TxOptions::default().merged(overrides),
            None => TxOptions::default(),
        };
        let digest = CredentialFingerprint::of(credential);

        let tx_hash = match client.revoke(coords.registry_address, digest, &options).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                return Err(self
                    .classify_submission_error(client.as_ref(), coords.registry_address, digest, e)
                    .await)
            }
        };

        tracing::info!(registry = %coords, digest = %digest, tx_hash = ?tx_hash, "revocation submitted");
        Ok(tx_hash)
    }

    async fn classify_submission_error(
        &self,
        client: &dyn RevocationRegistryClient,
        registry: Address,
        digest: CredentialFingerprint,
        err: LedgerError,
    ) -> StatusRegistryError {
        let LedgerError::Revert { reason, message } = &err else {
            return err.into();
        };
        let has_reason = reason.is_some();

        // prefer the decoded reason, the message format differs between nodes
        let text = reason.as_deref().unwrap_or(message).to_lowercase();
        if self
            .already_revoked_patterns
            .iter()
            .any(|pattern| text.contains(pattern.as_str()))
        {
            return StatusRegistryError::CredentialAlreadyRevoked { source: err };
        }

        if !has_reason {
            if let Some(sender) = client.sender() {
                match client.revoked(registry, sender, digest).await {
                    Ok(true) => return StatusRegistryError::CredentialAlreadyRevoked { source: err },
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(sender = ?sender, error = %e, "could not check for an earlier revocation")
                    }
                }
            }
        }

        StatusRegistryError::LedgerExecutionError(err.to_string())
    }
}
