use std::sync::Arc;

use ethers::{core::k256::ecdsa::SigningKey, signers::Wallet, types::TxHash};
use ethr_status_registry::{
    signer::ExternalSigner, EthrCredentialRevoker, Networks, StatusRegistryError,
};

pub struct Issuer {
    revoker: EthrCredentialRevoker,
    wallet: Option<Wallet<SigningKey>>,
}

impl Issuer {
    pub fn bootstrap(networks: Arc<Networks>, wallet: Option<Wallet<SigningKey>>) -> Self {
        Issuer {
            revoker: EthrCredentialRevoker::new(networks),
            wallet,
        }
    }

    /// Revokes the credential, treating an earlier revocation as success.
    pub async fn revoke_credential(&self, token: &str) -> anyhow::Result<Option<TxHash>> {
        println!("Issuer: revoking credential...");
        let signer = self.wallet.clone().map(ExternalSigner::new);

        match self.revoker.revoke(token, signer, None).await {
            Ok(tx_hash) => {
                println!("Issuer: submitted revocation {tx_hash:?}");
                Ok(Some(tx_hash))
            }
            Err(StatusRegistryError::CredentialAlreadyRevoked { .. }) => {
                println!("Issuer: credential was already revoked");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
