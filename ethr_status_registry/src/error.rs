use thiserror::Error;

use crate::ledger::LedgerError;

pub type Result<T> = std::result::Result<T, StatusRegistryError>;

#[derive(Debug, Error)]
pub enum StatusRegistryError {
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("unsupported credential status method: {0}")]
    UnsupportedStatusMethod(String),

    #[error("not a valid status registry ID: {0}")]
    InvalidRegistryId(String),

    #[error("credential not revocable; {0}")]
    CredentialNotRevocable(NotRevocableReason),

    #[error("network ({0}) for status check not configured")]
    NetworkNotConfigured(String),

    #[error("connection error: {0}")]
    ConnectivityError(String),

    #[error("credential already revoked")]
    CredentialAlreadyRevoked {
        #[source]
        source: LedgerError,
    },

    #[error("ledger execution failed: {0}")]
    LedgerExecutionError(String),

    #[error("invalid network configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotRevocableReason {
    #[error("no status field embedded")]
    NoStatusEntry,
    #[error("malformed `id` field in credential status entry: {0}")]
    MalformedRegistryId(String),
}

impl StatusRegistryError {
    /// Whether the caller may reasonably retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StatusRegistryError::ConnectivityError(_))
    }
}

impl From<LedgerError> for StatusRegistryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Connectivity(msg) => StatusRegistryError::ConnectivityError(msg),
            other => StatusRegistryError::LedgerExecutionError(other.to_string()),
        }
    }
}
