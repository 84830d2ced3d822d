pub mod issuer;
pub mod verifier;
