pub mod config;
pub mod contracts;
pub mod credential;
pub mod did_doc;
pub mod error;
pub mod fingerprint;
pub mod ledger;
pub mod registry_id;
pub mod resolver;
pub mod revoker;
pub mod signer;
pub mod status;

pub use config::{NetworkConfiguration, Networks};
pub use error::{Result, StatusRegistryError};
pub use resolver::EthrStatusResolver;
pub use revoker::EthrCredentialRevoker;
pub use status::StatusVerdict;
