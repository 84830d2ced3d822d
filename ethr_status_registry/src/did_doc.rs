use std::collections::BTreeSet;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Distinct ledger addresses allowed to revoke a credential.
pub type RevokerSet = BTreeSet<Address>;

/// The subset of a DID document this crate reads: its verification keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub public_key: Option<Vec<VerificationKeyEntry>>,
    #[serde(default)]
    pub verification_method: Option<Vec<VerificationKeyEntry>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationKeyEntry {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub kind: VerificationKeyKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationKeyKind {
    #[serde(rename_all = "camelCase")]
    Secp256k1VerificationKey2018 {
        #[serde(default)]
        ethereum_address: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    EcdsaSecp256k1RecoveryMethod2020 {
        #[serde(default)]
        blockchain_account_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl VerificationKeyKind {
    /// The ledger address carried by this key, if it is of a kind that can
    /// carry one and the field is non-empty.
    pub fn ledger_address(&self) -> Option<&str> {
        let address = match self {
            VerificationKeyKind::Secp256k1VerificationKey2018 { ethereum_address } => {
                ethereum_address.as_deref()?
            }
            // CAIP-10 account ids are `eip155:<chain id>:0x..`
            VerificationKeyKind::EcdsaSecp256k1RecoveryMethod2020 {
                blockchain_account_id,
            } => blockchain_account_id.as_deref()?.rsplit(':').next()?,
            VerificationKeyKind::Other => return None,
        };
        (!address.is_empty()).then_some(address)
    }
}

impl KeyDocument {
    /// Entries of both `publicKey` and `verificationMethod`.
    pub fn keys(&self) -> impl Iterator<Item = &VerificationKeyEntry> {
        self.public_key
            .iter()
            .chain(self.verification_method.iter())
            .flatten()
    }

    /// Collects the revokers declared by this document. Only the document is
    /// consulted; the credential issuer is not added implicitly.
    pub fn revokers(&self) -> RevokerSet {
        self.keys()
            .filter_map(|entry| {
                let address = entry.kind.ledger_address()?;
                match address.parse::<Address>() {
                    Ok(address) => Some(address),
                    Err(e) => {
                        tracing::warn!(key = %entry.id, address, error = %e, "skipping key with malformed ledger address");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reference_doc() -> KeyDocument {
        serde_json::from_value(json!({
            "@context": "https://w3id.org/did/v1",
            "id": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229",
            "authentication": [
                {
                    "type": "Secp256k1SignatureAuthentication2018",
                    "publicKey": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229#owner"
                }
            ],
            "publicKey": [
                {
                    "id": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229#owner",
                    "type": "Secp256k1VerificationKey2018",
                    "ethereumAddress": "0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229",
                    "owner": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229"
                },
                {
                    "id": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229#key-1",
                    "type": "Secp256k1VerificationKey2018",
                    "ethereumAddress": "0x34015abcb36d716610d69cf036f29882909bdae3",
                    "owner": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229"
                },
                {
                    "id": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229#key-2",
                    "type": "Secp256k1VerificationKey2018",
                    "publicKeyHex": "0x02abc15abcb36d716610d69cf036f29882909bdae310d69cf036f29882909bdae3",
                    "owner": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229"
                },
                {
                    "id": "did:ethr:0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229#key-3",
                    "type": "Ed25519VerificationKey2018",
                    "publicKeyBase58": "H3C2AVvLMv6gmMNam3uVAjZpfkcJCwDwnZn6z3wXmqPV"
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_extracts_addresses_from_did_doc() {
        let revokers = reference_doc().revokers();
        let expected: RevokerSet = [
            "0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229",
            "0x34015abcb36d716610d69cf036f29882909bdae3",
        ]
        .iter()
        .map(|a| a.parse().unwrap())
        .collect();
        assert_eq!(revokers, expected);
    }

    #[test]
    fn test_duplicates_collapse_case_insensitively() {
        let doc: KeyDocument = serde_json::from_value(json!({
            "publicKey": [
                { "id": "#a", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "0x34015abcb36d716610d69cf036f29882909bdae3" },
                { "id": "#b", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "0x34015ABCB36D716610D69CF036F29882909BDAE3" },
                { "id": "#c", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "" },
                { "id": "#d", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "not an address" }
            ]
        }))
        .unwrap();
        assert_eq!(doc.revokers().len(), 1);
    }

    #[test]
    fn test_reads_verification_method_accounts() {
        let doc: KeyDocument = serde_json::from_value(json!({
            "id": "did:ethr:0x1:0xb9c5714089478a327f09197987f16f9e5d936e8a",
            "verificationMethod": [
                {
                    "id": "did:ethr:0x1:0xb9c5714089478a327f09197987f16f9e5d936e8a#controller",
                    "type": "EcdsaSecp256k1RecoveryMethod2020",
                    "controller": "did:ethr:0x1:0xb9c5714089478a327f09197987f16f9e5d936e8a",
                    "blockchainAccountId": "eip155:1:0xb9c5714089478a327f09197987f16f9e5d936e8a"
                }
            ]
        }))
        .unwrap();
        let expected: Address = "0xb9c5714089478a327f09197987f16f9e5d936e8a".parse().unwrap();
        assert_eq!(doc.revokers().into_iter().collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn test_reads_both_key_lists() {
        let doc: KeyDocument = serde_json::from_value(json!({
            "publicKey": [],
            "verificationMethod": [
                {
                    "type": "EcdsaSecp256k1RecoveryMethod2020",
                    "blockchainAccountId": "eip155:4:0xb9c5714089478a327f09197987f16f9e5d936e8a"
                },
                {
                    "id": "#delegate",
                    "type": "Secp256k1VerificationKey2018",
                    "ethereumAddress": "0x34015abcb36d716610d69cf036f29882909bdae3"
                }
            ]
        }))
        .unwrap();
        assert_eq!(doc.keys().count(), 2);
        assert_eq!(doc.revokers().len(), 2);

        let doc: KeyDocument = serde_json::from_value(json!({
            "publicKey": [
                { "id": "#owner", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229" }
            ],
            "verificationMethod": [
                { "id": "#delegate", "type": "Secp256k1VerificationKey2018", "ethereumAddress": "0x34015abcb36d716610d69cf036f29882909bdae3" }
            ]
        }))
        .unwrap();
        assert_eq!(doc.revokers().len(), 2);
    }

    #[test]
    fn test_no_eligible_keys() {
        assert!(KeyDocument::default().revokers().is_empty());

        let doc: KeyDocument = serde_json::from_value(json!({
            "publicKey": [
                { "id": "#key-3", "type": "Ed25519VerificationKey2018", "publicKeyBase58": "H3C2AVvLMv6gmMNam3uVAjZpfkcJCwDwnZn6z3wXmqPV" }
            ]
        }))
        .unwrap();
        assert!(doc.revokers().is_empty());
    }
}
