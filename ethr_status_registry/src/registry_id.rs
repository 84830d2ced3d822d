use std::fmt;

use ethers::types::Address;

use crate::error::{Result, StatusRegistryError};

pub const DEFAULT_NETWORK: &str = "mainnet";

/// Where revocations for a credential are recorded: a network tag and the
/// registry contract deployed on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryCoordinates {
    pub network_tag: String,
    pub registry_address: Address,
}

impl fmt::Display for RegistryCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // debug fmt of an address is the full '0x..' hex encoding
        write!(f, "{}:{:?}", self.network_tag, self.registry_address)
    }
}

impl std::str::FromStr for RegistryCoordinates {
    type Err = StatusRegistryError;

    fn from_str(s: &str) -> Result<Self> {
        parse_registry_id(s)
    }
}

/// Parses `[networkTag:]0xADDRESS`.
///
/// The address is always the segment after the last colon and must be exactly
/// 40 hex digits. Everything before that colon is the network tag, verbatim.
pub fn parse_registry_id(id: &str) -> Result<RegistryCoordinates> {
    let invalid = || StatusRegistryError::InvalidRegistryId(id.to_owned());

    let (network_tag, address) = match id.rsplit_once(':') {
        Some((tag, address)) => (tag, address),
        None => (DEFAULT_NETWORK, id),
    };

    if !is_hex_address(address) {
        return Err(invalid());
    }
    let registry_address = address.parse::<Address>().map_err(|_| invalid())?;

    Ok(RegistryCoordinates {
        network_tag: network_tag.to_owned(),
        registry_address,
    })
}

fn is_hex_address(s: &str) -> bool {
    match s.strip_prefix("0x") {
        Some(digits) => digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
