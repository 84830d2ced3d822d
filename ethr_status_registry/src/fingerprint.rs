use std::fmt;

use ethers::{types::H256, utils::keccak256};

/// Keccak-256 of the credential exactly as it was presented (the encoded JWT
/// string, not its decoded payload). This is the key the registry contract
/// records revocations under, so resolution and revocation must both use it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialFingerprint([u8; 32]);

impl CredentialFingerprint {
    pub fn of(raw_credential: &str) -> Self {
        Self(keccak256(raw_credential.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<CredentialFingerprint> for [u8; 32] {
    fn from(fingerprint: CredentialFingerprint) -> Self {
        fingerprint.0
    }
}

impl From<CredentialFingerprint> for H256 {
    fn from(fingerprint: CredentialFingerprint) -> Self {
        H256(fingerprint.0)
    }
}

impl fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialFingerprint({self})")
    }
}
