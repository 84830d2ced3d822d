use std::{collections::HashMap, env, fmt, sync::Arc};

use ethers::{
    providers::{Http, Provider},
    types::Address,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    contracts::revocation_registry::EthersRegistryClient,
    error::{Result, StatusRegistryError},
    ledger::RevocationRegistryClient,
    registry_id::DEFAULT_NETWORK,
};

const INFURA_PROJECT_ID_ENV_VAR: &str = "INFURA_PROJECT_ID";
const RPC_URL_ENV_VAR: &str = "RPC_URL";
const CHAIN_ID_ENV_VAR: &str = "CHAIN_ID";
const NETWORK_NAME_ENV_VAR: &str = "NETWORK_NAME";
const SENDER_ADDRESS_ENV_VAR: &str = "SENDER_ADDRESS";

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545/";

// (network tag, infura subdomain, chain id)
const INFURA_NETWORKS: [(&str, &str, u64); 10] = [
    ("mainnet", "mainnet", 1),
    ("0x1", "mainnet", 1),
    ("ropsten", "ropsten", 3),
    ("0x3", "ropsten", 3),
    ("rinkeby", "rinkeby", 4),
    ("0x4", "rinkeby", 4),
    ("goerli", "goerli", 5),
    ("0x5", "goerli", 5),
    ("kovan", "kovan", 42),
    ("0x2a", "kovan", 42),
];

/// One named JSON-RPC endpoint. `from` is the node-managed account that
/// revocations without an explicit signer are sent from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfiguration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub from: Option<Address>,
}

/// How to reach the networks credentials may point at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkConfiguration {
    /// The well known public networks through Infura.
    #[serde(rename_all = "camelCase")]
    Infura { infura_project_id: String },
    /// `mainnet` at `rpc_url` (or a local node) plus any named networks.
    #[serde(rename_all = "camelCase")]
    MultiProvider {
        #[serde(default)]
        rpc_url: Option<String>,
        #[serde(default)]
        chain_id: Option<u64>,
        #[serde(default)]
        from: Option<Address>,
        #[serde(default)]
        networks: Vec<ProviderConfiguration>,
    },
}

impl Default for NetworkConfiguration {
    fn default() -> Self {
        NetworkConfiguration::MultiProvider {
            rpc_url: None,
            chain_id: None,
            from: None,
            networks: Vec::new(),
        }
    }
}

impl NetworkConfiguration {
    pub fn single(rpc_url: &str) -> Self {
        NetworkConfiguration::MultiProvider {
            rpc_url: Some(rpc_url.to_owned()),
            chain_id: None,
            from: None,
            networks: Vec::new(),
        }
    }

    /// Infura when `INFURA_PROJECT_ID` is set, otherwise a single provider at
    /// `RPC_URL`, registered as `mainnet` and, if set, as `NETWORK_NAME`.
    /// `SENDER_ADDRESS` names the node account used when no signer is given.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        if let Ok(infura_project_id) = env::var(INFURA_PROJECT_ID_ENV_VAR) {
            return Ok(NetworkConfiguration::Infura { infura_project_id });
        }

        let rpc_url = env::var(RPC_URL_ENV_VAR).ok();
        let chain_id = match env::var(CHAIN_ID_ENV_VAR) {
            Ok(chain_id) => Some(chain_id.parse().map_err(|e| {
                StatusRegistryError::InvalidConfiguration(format!(
                    "{CHAIN_ID_ENV_VAR} ({chain_id}): {e}"
                ))
            })?),
            Err(_) => None,
        };
        let from = match env::var(SENDER_ADDRESS_ENV_VAR) {
            Ok(from) => Some(from.parse().map_err(|e| {
                StatusRegistryError::InvalidConfiguration(format!(
                    "{SENDER_ADDRESS_ENV_VAR} ({from}): {e}"
                ))
            })?),
            Err(_) => None,
        };

        let networks = match env::var(NETWORK_NAME_ENV_VAR) {
            Ok(name) => vec![ProviderConfiguration {
                name: Some(name),
                rpc_url: rpc_url.clone(),
                chain_id,
                from,
            }],
            Err(_) => Vec::new(),
        };

        Ok(NetworkConfiguration::MultiProvider {
            rpc_url,
            chain_id,
            from,
            networks,
        })
    }

    /// Resolves this configuration to endpoints, in registration order.
    fn endpoints(&self) -> Vec<Endpoint> {
        match self {
            NetworkConfiguration::Infura { infura_project_id } => INFURA_NETWORKS
                .iter()
                .map(|(tag, subdomain, chain_id)| Endpoint {
                    tag: tag.to_string(),
                    rpc_url: format!("https://{subdomain}.infura.io/v3/{infura_project_id}"),
                    chain_id: Some(*chain_id),
                    from: None,
                })
                .collect(),
            NetworkConfiguration::MultiProvider {
                rpc_url,
                chain_id,
                from,
                networks,
            } => {
                let mainnet = Endpoint {
                    tag: DEFAULT_NETWORK.to_owned(),
                    rpc_url: rpc_url.clone().unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
                    chain_id: *chain_id,
                    from: *from,
                };
                std::iter::once(mainnet)
                    .chain(networks.iter().map(|net| Endpoint {
                        tag: net.name.clone().unwrap_or_default(),
                        rpc_url: net
                            .rpc_url
                            .clone()
                            .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned()),
                        chain_id: net.chain_id,
                        from: net.from,
                    }))
                    .collect()
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Endpoint {
    tag: String,
    rpc_url: String,
    chain_id: Option<u64>,
    from: Option<Address>,
}

/// Network tag to registry client. Built once and shared between resolvers
/// and revokers; never mutated after construction.
#[derive(Clone, Default)]
pub struct Networks {
    clients: HashMap<String, Arc<dyn RevocationRegistryClient>>,
}

impl Networks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects an HTTP provider for every network in `conf`. Later entries
    /// with the same tag replace earlier ones.
    pub fn configure(conf: &NetworkConfiguration) -> Result<Self> {
        let mut networks = Networks::new();
        for Endpoint {
            tag,
            rpc_url,
            chain_id,
            from,
        } in conf.endpoints()
        {
            let url = Url::parse(&rpc_url).map_err(|e| {
                StatusRegistryError::InvalidConfiguration(format!(
                    "rpc url ({rpc_url}) for network ({tag}): {e}"
                ))
            })?;

            let mut provider = Provider::new(Http::new(url));
            if let Some(from) = from {
                provider = provider.with_sender(from);
            }
            let mut client = EthersRegistryClient::new(provider);
            if let Some(chain_id) = chain_id {
                client = client.with_chain_id(chain_id);
            }
            tracing::debug!(network = %tag, chain_id = ?chain_id, from = ?from, "configured network");
            networks.insert(tag, Arc::new(client));
        }
        Ok(networks)
    }

    pub fn insert(&mut self, tag: impl Into<String>, client: Arc<dyn RevocationRegistryClient>) {
        self.clients.insert(tag.into(), client);
    }

    pub fn with(mut self, tag: impl Into<String>, client: Arc<dyn RevocationRegistryClient>) -> Self {
        self.insert(tag, client);
        self
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn RevocationRegistryClient>> {
        self.clients.get(tag).cloned()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.clients.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }
}

impl fmt::Debug for Networks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.tags().collect();
        tags.sort_unstable();
        f.debug_struct("Networks").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_infura_networks() {
        let conf: NetworkConfiguration =
            serde_json::from_value(json!({ "infuraProjectId": "none" })).unwrap();
        let networks = Networks::configure(&conf).unwrap();

        let mut tags: Vec<_> = networks.tags().collect();
        tags.sort_unstable();
        assert_eq!(
            tags,
            vec![
                "0x1", "0x2a", "0x3", "0x4", "0x5", "goerli", "kovan", "mainnet", "rinkeby",
                "ropsten"
            ]
        );

        let endpoints = conf.endpoints();
        assert!(endpoints.contains(&Endpoint {
            tag: "0x2a".to_owned(),
            rpc_url: "https://kovan.infura.io/v3/none".to_owned(),
            chain_id: Some(42),
            from: None,
        }));
        assert_eq!(networks.get("mainnet").unwrap().sender(), None);
    }

    #[test]
    fn test_single_network() {
        let conf: NetworkConfiguration =
            serde_json::from_value(json!({ "rpcUrl": "http://example.com" })).unwrap();
        let networks = Networks::configure(&conf).unwrap();
        assert_eq!(networks.tags().collect::<Vec<_>>(), vec!["mainnet"]);
    }

    #[test]
    fn test_default_is_local_mainnet() {
        let endpoints = NetworkConfiguration::default().endpoints();
        assert_eq!(
            endpoints,
            vec![Endpoint {
                tag: "mainnet".to_owned(),
                rpc_url: DEFAULT_RPC_URL.to_owned(),
                chain_id: None,
                from: None,
            }]
        );
    }

    #[test]
    fn test_multiple_networks() {
        let conf: NetworkConfiguration = serde_json::from_value(json!({
            "networks": [
                { "name": "mainnet", "rpcUrl": "http://example.com" },
                { "name": "rinkeby", "rpcUrl": "http://rinkeby.example.com", "chainId": 4 },
                { "name": "local", "rpcUrl": "http://localhost:8545" }
            ]
        }))
        .unwrap();
        let networks = Networks::configure(&conf).unwrap();

        assert!(networks.contains("mainnet"));
        assert!(networks.contains("rinkeby"));
        assert!(networks.contains("local"));
        assert!(!networks.contains("kovan"));

        // the named mainnet entry overrides the implicit default one
        let endpoints = conf.endpoints();
        assert_eq!(
            endpoints.iter().rev().find(|e| e.tag == "mainnet").unwrap().rpc_url,
            "http://example.com"
        );
    }

    #[test]
    fn test_default_sender_per_network() {
        let conf: NetworkConfiguration = serde_json::from_value(json!({
            "rpcUrl": "http://localhost:8545",
            "from": "0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229",
            "networks": [
                { "name": "ganache", "rpcUrl": "http://localhost:7545", "from": "0x34015abcb36d716610d69cf036f29882909bdae3" },
                { "name": "rinkeby", "rpcUrl": "http://rinkeby.example.com" }
            ]
        }))
        .unwrap();
        let networks = Networks::configure(&conf).unwrap();

        let address = |a: &str| a.parse::<Address>().unwrap();
        assert_eq!(
            networks.get("mainnet").unwrap().sender(),
            Some(address("0x1fcf8ff78ac5117d9c99b830c74b6668d6ac3229"))
        );
        assert_eq!(
            networks.get("ganache").unwrap().sender(),
            Some(address("0x34015abcb36d716610d69cf036f29882909bdae3"))
        );
        assert_eq!(networks.get("rinkeby").unwrap().sender(), None);
    }

    #[test]
    fn test_rejects_invalid_rpc_url() {
        let err = Networks::configure(&NetworkConfiguration::single("example.com")).unwrap_err();
        assert!(matches!(err, StatusRegistryError::InvalidConfiguration(_)));
    }
}
