use std::{fmt, sync::Arc};

use async_trait::async_trait;
use ethers::{
    core::k256::ecdsa::SigningKey,
    signers::{Signer, Wallet},
    types::{
        transaction::{eip2718::TypedTransaction, eip712::Eip712},
        Address, Bytes, Signature,
    },
    utils::rlp::Rlp,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("external signer failed: {0}")]
    Signing(String),
    #[error("signed transaction could not be decoded: {0}")]
    Decoding(String),
    #[error("{0} is not supported by an external transaction signer")]
    Unsupported(&'static str),
}

/// Something outside this crate that can sign raw transactions, such as a
/// hardware wallet or a remote key service.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Returns the RLP encoding of `tx` signed by [`TransactionSigner::address`].
    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Bytes, SignerError>;
}

#[async_trait]
impl TransactionSigner for Wallet<SigningKey> {
    fn address(&self) -> Address {
        Signer::address(self)
    }

    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Bytes, SignerError> {
        // sign for the chain the transaction names, not the one the wallet was built for
        let chain_id = tx
            .chain_id()
            .map(|id| id.as_u64())
            .unwrap_or_else(|| Signer::chain_id(self));
        let wallet = self.clone().with_chain_id(chain_id);
        let signature = Signer::sign_transaction(&wallet, tx)
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(tx.rlp_signed(&signature))
    }
}

/// Adapts a [`TransactionSigner`] to ethers' [`Signer`], so it can sit in a
/// `SignerMiddleware` in place of a local wallet.
#[derive(Clone)]
pub struct ExternalSigner {
    inner: Arc<dyn TransactionSigner>,
    address: Address,
    chain_id: u64,
}

impl ExternalSigner {
    pub fn new(signer: impl TransactionSigner + 'static) -> Self {
        let address = signer.address();
        Self {
            inner: Arc::new(signer),
            address,
            chain_id: 1,
        }
    }
}

impl fmt::Debug for ExternalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalSigner")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Signer for ExternalSigner {
    type Error = SignerError;

    async fn sign_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        _message: S,
    ) -> Result<Signature, Self::Error> {
        Err(SignerError::Unsupported("message signing"))
    }

    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Signature, Self::Error> {
        let mut tx = tx.clone();
        if tx.chain_id().is_none() {
            tx.set_chain_id(self.chain_id);
        }

        let signed = self.inner.sign_transaction(&tx).await?;
        let (_, signature) = TypedTransaction::decode_signed(&Rlp::new(&signed))
            .map_err(|e| SignerError::Decoding(e.to_string()))?;
        Ok(signature)
    }

    async fn sign_typed_data<T: Eip712 + Send + Sync>(
        &self,
        _payload: &T,
    ) -> Result<Signature, Self::Error> {
        Err(SignerError::Unsupported("typed data signing"))
    }

    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn with_chain_id<T: Into<u64>>(mut self, chain_id: T) -> Self {
        self.chain_id = chain_id.into();
        self
    }
}
