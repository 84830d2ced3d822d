use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    abi::{self, ParamType, Token},
    contract::{abigen, ContractError},
    middleware::{signer::SignerMiddlewareError, SignerMiddleware},
    providers::{JsonRpcError, Middleware, ProviderError, RpcError},
    signers::Signer,
    types::{Address, TxHash, U256},
};

use crate::{
    fingerprint::CredentialFingerprint,
    ledger::{LedgerError, RevocationRegistryClient, TxOptions},
    signer::ExternalSigner,
};

abigen!(
    RevocationRegistryContract,
    r#"[
        function revoke(bytes32 digest)
        function revoked(address issuer, bytes32 digest) external view returns (uint256)
        event Revoked(address indexed issuer, bytes32 digest)
    ]"#
);

// selector of `Error(string)`
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Registry access through an ethers provider. Reads go straight to the
/// provider; writes are sent from the provider's default sender unless a
/// signer has been bound with [`RevocationRegistryClient::with_signer`].
#[derive(Clone, Debug)]
pub struct EthersRegistryClient<M> {
    client: Arc<M>,
    chain_id: Option<u64>,
    signer: Option<ExternalSigner>,
}

impl<M> EthersRegistryClient<M>
where
    M: Middleware<Error = ProviderError> + Clone + 'static,
{
    pub fn new(client: M) -> Self {
        Self {
            client: Arc::new(client),
            chain_id: None,
            signer: None,
        }
    }

    /// Chain id used for externally signed transactions. When unset it is
    /// fetched from the node at submission time.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    async fn chain_id(&self) -> Result<u64, LedgerError> {
        match self.chain_id {
            Some(chain_id) => Ok(chain_id),
            None => self
                .client
                .get_chainid()
                .await
                .map(|id| id.as_u64())
                .map_err(|e| {
                    let message = e.to_string();
                    classify_provider_error(&e, message)
                }),
        }
    }
}

#[async_trait]
impl<M> RevocationRegistryClient for EthersRegistryClient<M>
where
    M: Middleware<Error = ProviderError> + Clone + 'static,
{
    async fn revoked(
        &self,
        registry: Address,
        revoker: Address,
        digest: CredentialFingerprint,
    ) -> Result<bool, LedgerError> {
        let contract = RevocationRegistryContract::new(registry, self.client.clone());

        // the registry stores the block number of the revocation, zero if none
        let revoked_at: U256 = contract
            .revoked(revoker, digest.into())
            .call()
            .await
            .map_err(|e| classify_contract_error(e, classify_provider_error))?;

        Ok(!revoked_at.is_zero())
    }

    async fn revoke(
        &self,
        registry: Address,
        digest: CredentialFingerprint,
        options: &TxOptions,
    ) -> Result<TxHash, LedgerError> {
        match &self.signer {
            Some(signer) => {
                let signer = signer.clone().with_chain_id(self.chain_id().await?);
                let client = SignerMiddleware::new(self.client.as_ref().clone(), signer);
                submit_revocation(
                    Arc::new(client),
                    registry,
                    digest,
                    options,
                    classify_signer_error::<M>,
                )
                .await
            }
            None => {
                submit_revocation(
                    self.client.clone(),
                    registry,
                    digest,
                    options,
                    classify_provider_error,
                )
                .await
            }
        }
    }

    fn sender(&self) -> Option<Address> {
        match &self.signer {
            Some(signer) => Some(signer.address()),
            None => self.client.default_sender(),
        }
    }

    fn with_signer(&self, signer: ExternalSigner) -> Arc<dyn RevocationRegistryClient> {
        Arc::new(Self {
            signer: Some(signer),
            ..self.clone()
        })
    }
}

async fn submit_revocation<C: Middleware + 'static>(
    client: Arc<C>,
    registry: Address,
    digest: CredentialFingerprint,
    options: &TxOptions,
    classify: fn(&C::Error, String) -> LedgerError,
) -> Result<TxHash, LedgerError> {
    let contract = RevocationRegistryContract::new(registry, client);

    // `from` defaults to the client's sender: the signer, or the provider's
    // configured account
    let mut call = contract.revoke(digest.into());
    if let Some(gas_limit) = options.gas_limit {
        call = call.gas(gas_limit);
    }
    if let Some(gas_price) = options.gas_price {
        call = call.gas_price(gas_price);
    }
    if let Some(nonce) = options.nonce {
        call = call.nonce(nonce);
    }

    // dry run first: a revert is only reported by the node when simulated,
    // a broadcast transaction would just be mined as failed
    call.call()
        .await
        .map_err(|e| classify_contract_error(e, classify))?;

    let pending = call
        .send()
        .await
        .map_err(|e| classify_contract_error(e, classify))?;
    Ok(pending.tx_hash())
}

fn classify_contract_error<C: Middleware>(
    err: ContractError<C>,
    classify: fn(&C::Error, String) -> LedgerError,
) -> LedgerError {
    let message = err.to_string();
    match err {
        ContractError::Revert(data) => LedgerError::Revert {
            reason: decode_revert_reason(&data),
            message,
        },
        ContractError::MiddlewareError { e } => classify(&e, message),
        ContractError::ProviderError { e } => classify_provider_error(&e, message),
        _ => LedgerError::Execution(message),
    }
}

fn classify_signer_error<M>(
    err: &SignerMiddlewareError<M, ExternalSigner>,
    message: String,
) -> LedgerError
where
    M: Middleware<Error = ProviderError>,
{
    match err {
        SignerMiddlewareError::MiddlewareError(e) => classify_provider_error(e, message),
        _ => LedgerError::Execution(message),
    }
}

fn classify_provider_error(err: &ProviderError, message: String) -> LedgerError {
    if let Some(response) = RpcError::as_error_response(err) {
        return classify_error_response(response, message);
    }
    if is_transport_failure(err) {
        LedgerError::Connectivity(message)
    } else {
        LedgerError::Execution(message)
    }
}

fn classify_error_response(response: &JsonRpcError, message: String) -> LedgerError {
    let revert_data = response
        .data
        .as_ref()
        .and_then(|data| data.as_str())
        .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok());
    let reason = revert_data.as_deref().and_then(decode_revert_reason);

    if reason.is_some() || response.message.to_lowercase().contains("revert") {
        LedgerError::Revert { reason, message }
    } else {
        LedgerError::Execution(message)
    }
}

/// A transport failure is an RPC client error that never produced a JSON-RPC
/// response, or an HTTP level failure.
fn is_transport_failure(err: &ProviderError) -> bool {
    match err {
        ProviderError::HTTPError(_) => true,
        ProviderError::JsonRpcClientError(e) => {
            e.as_error_response().is_none() && e.as_serde_error().is_none()
        }
        _ => false,
    }
}

fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let encoded = data.strip_prefix(&REVERT_SELECTOR)?;
    match abi::decode(&[ParamType::String], encoded).ok()?.pop()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}
