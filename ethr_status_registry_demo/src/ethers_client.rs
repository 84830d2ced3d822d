use anyhow::Context;
use ethers::{
    core::k256::ecdsa::SigningKey,
    signers::{coins_bip39::English, MnemonicBuilder, Wallet},
};

use crate::config::DemoConfig;

pub fn get_writer_wallet(config: &DemoConfig) -> anyhow::Result<Wallet<SigningKey>> {
    let seed = config
        .mnemonic
        .as_deref()
        .context("MNEMONIC must be set to revoke")?;

    let wallet = MnemonicBuilder::<English>::default()
        .phrase(seed)
        .index(config.signer_index)?
        .build()?;

    Ok(wallet)
}
