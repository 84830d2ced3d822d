use std::error::Error;

use ethr_status_registry::NetworkConfiguration;

const MNEMONIC_ENV_VAR: &str = "MNEMONIC";
const SIGNER_INDEX_ENV_VAR: &str = "SIGNER_INDEX";

const DEFAULT_SIGNER_INDEX: u32 = 0;

pub struct DemoConfig {
    pub networks: NetworkConfiguration,
    pub mnemonic: Option<String>,
    pub signer_index: u32,
}

impl DemoConfig {
    /// load from env, else local
    pub fn load() -> Self {
        match Self::try_from_env() {
            Ok(c) => {
                tracing::info!("Loaded config from env");
                c
            }
            Err(e) => {
                tracing::warn!("Failed to load config from env: {}", e);
                tracing::info!("Loading local config");
                Self::local()
            }
        }
    }

    fn local() -> Self {
        Self {
            networks: NetworkConfiguration::default(),
            mnemonic: None,
            signer_index: DEFAULT_SIGNER_INDEX,
        }
    }

    fn try_from_env() -> Result<Self, Box<dyn Error>> {
        dotenv::dotenv().ok();

        let networks = NetworkConfiguration::from_env()?;
        let mnemonic = std::env::var(MNEMONIC_ENV_VAR).ok();
        let signer_index = match std::env::var(SIGNER_INDEX_ENV_VAR) {
            Ok(index) => index.parse()?,
            Err(_) => DEFAULT_SIGNER_INDEX,
        };

        Ok(Self {
            networks,
            mnemonic,
            signer_index,
        })
    }
}
