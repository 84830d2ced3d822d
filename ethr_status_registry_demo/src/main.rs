mod config;
mod ethers_client;
mod roles;

use std::{env, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use ethr_status_registry::{did_doc::KeyDocument, Networks};
use tracing_subscriber::EnvFilter;

use crate::{
    config::DemoConfig,
    ethers_client::get_writer_wallet,
    roles::{issuer::Issuer, verifier::Verifier},
};

const USAGE: &str = "usage: ethr_status_registry_demo <check|revoke|round-trip> <jwt> [did-doc.json]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (Some(command), Some(token)) = (args.first(), args.get(1)) else {
        bail!(USAGE);
    };

    let config = DemoConfig::load();
    let networks = Arc::new(Networks::configure(&config.networks)?);
    tracing::info!(?networks, "networks configured");

    match command.as_str() {
        "check" => {
            let doc = load_key_document(args.get(2))?;
            Verifier::bootstrap(networks)
                .check_credential(token, &doc)
                .await?;
        }
        "revoke" => {
            let wallet = config.mnemonic.as_ref().map(|_| get_writer_wallet(&config)).transpose()?;
            Issuer::bootstrap(networks, wallet)
                .revoke_credential(token)
                .await?;
        }
        "round-trip" => round_trip(&config, networks, token, args.get(2)).await?,
        _ => bail!(USAGE),
    }

    Ok(())
}

async fn round_trip(
    config: &DemoConfig,
    networks: Arc<Networks>,
    token: &str,
    doc_path: Option<&String>,
) -> anyhow::Result<()> {
    println!("\n########## STATUS BEFORE ###########\n");
    let doc = load_key_document(doc_path)?;
    let verifier = Verifier::bootstrap(networks.clone());
    verifier.check_credential(token, &doc).await?;

    println!("\n########## REVOCATION ###########\n");
    let issuer = Issuer::bootstrap(networks, Some(get_writer_wallet(config)?));
    issuer.revoke_credential(token).await?;

    // give the node a moment to mine the transaction
    tokio::time::sleep(Duration::from_secs(5)).await;

    println!("\n########## STATUS AFTER ###########\n");
    let verdict = verifier.check_credential(token, &doc).await?;
    if !verdict.is_revoked() {
        println!("Verifier: revocation not visible yet, is the signer listed in the DID document?");
    }

    Ok(())
}

fn load_key_document(path: Option<&String>) -> anyhow::Result<KeyDocument> {
    let path = path.context("a DID document (JSON file) is required to check status")?;
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing DID document {path}"))
}
