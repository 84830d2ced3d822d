use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatusRegistryError};

/// Status method identifier handled by this crate.
pub const METHOD_NAME: &str = "EthrStatusRegistry2019";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    #[serde(rename = "type")]
    pub method: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct CredentialPayload {
    iss: Option<String>,
    status: Option<StatusEntry>,
    #[serde(rename = "credentialStatus")]
    credential_status: Option<StatusEntry>,
}

/// The parts of a JWT credential needed for status checks. The signature is
/// not verified here.
#[derive(Clone, Debug)]
pub struct DecodedCredential<'a> {
    pub issuer: Option<String>,
    pub status: Option<StatusEntry>,
    pub raw: &'a str,
}

impl<'a> DecodedCredential<'a> {
    pub fn decode(token: &'a str) -> Result<Self> {
        let malformed = |reason: &str| StatusRegistryError::MalformedCredential(reason.to_owned());

        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(malformed("expected three JWT segments"));
        };

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| malformed(&format!("payload is not base64url: {e}")))?;
        let payload: CredentialPayload = serde_json::from_slice(&payload_bytes)
            .map_err(|e| malformed(&format!("payload is not a JSON object: {e}")))?;

        Ok(Self {
            issuer: payload.iss,
            status: payload.status.or(payload.credential_status),
            raw: token,
        })
    }
}
