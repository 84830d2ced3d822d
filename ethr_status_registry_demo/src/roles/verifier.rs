use std::sync::Arc;

use ethr_status_registry::{
    did_doc::KeyDocument, status::StatusDispatcher, EthrStatusResolver, Networks, StatusVerdict,
};

pub struct Verifier {
    status_checker: StatusDispatcher,
}

impl Verifier {
    pub fn bootstrap(networks: Arc<Networks>) -> Self {
        let resolver = EthrStatusResolver::new(networks);

        Verifier {
            status_checker: StatusDispatcher::new().register(resolver.as_status_method()),
        }
    }

    pub async fn check_credential(
        &self,
        token: &str,
        issuer_doc: &KeyDocument,
    ) -> anyhow::Result<StatusVerdict> {
        println!("Verifier: checking credential status...");
        let verdict = self.status_checker.check_status(token, issuer_doc).await?;
        println!("Verifier: {}", serde_json::to_string(&verdict)?);
        Ok(verdict)
    }
}
