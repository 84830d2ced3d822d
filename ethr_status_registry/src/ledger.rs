use std::sync::Arc;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use thiserror::Error;

use crate::{fingerprint::CredentialFingerprint, signer::ExternalSigner};

pub const DEFAULT_GAS_LIMIT: u64 = 45_000;

/// Failures reported by a ledger adapter, split so callers can tell a node
/// that could not be reached from a contract that refused the call.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("ledger unreachable: {0}")]
    Connectivity(String),
    #[error("execution reverted: {message}")]
    Revert {
        /// Decoded `Error(string)` revert reason, when the node returned one.
        reason: Option<String>,
        message: String,
    },
    #[error("{0}")]
    Execution(String),
}

/// Gas parameters for a revocation. Unset fields fall back to the defaults or
/// are filled in by the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOptions {
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub nonce: Option<U256>,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            gas_limit: Some(U256::from(DEFAULT_GAS_LIMIT)),
            gas_price: None,
            nonce: None,
        }
    }
}

impl TxOptions {
    /// Layers the fields set in `overrides` over `self`.
    pub fn merged(self, overrides: TxOptions) -> Self {
        Self {
            gas_limit: overrides.gas_limit.or(self.gas_limit),
            gas_price: overrides.gas_price.or(self.gas_price),
            nonce: overrides.nonce.or(self.nonce),
        }
    }
}

/// Access to revocation registry contracts on one network.
#[async_trait]
pub trait RevocationRegistryClient: Send + Sync {
    /// Whether `revoker` has recorded a revocation of `digest` in `registry`.
    async fn revoked(
        &self,
        registry: Address,
        revoker: Address,
        digest: CredentialFingerprint,
    ) -> Result<bool, LedgerError>;

    /// Submits `revoke(digest)` from this client's signing identity and
    /// returns the transaction hash without waiting for it to be mined.
    async fn revoke(
        &self,
        registry: Address,
        digest: CredentialFingerprint,
        options: &TxOptions,
    ) -> Result<TxHash, LedgerError>;

    /// The account `revoke` sends from, when one is known.
    fn sender(&self) -> Option<Address>;

    /// The same network, with transactions signed by `signer`.
    fn with_signer(&self, signer: ExternalSigner) -> Arc<dyn RevocationRegistryClient>;
}
