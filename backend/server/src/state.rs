use std::sync::Arc;

use super::{config::Config, ledger::Ledger};

pub struct State {
    pub config: Config,
    pub ledger: Ledger,
}

impl State {
    pub async fn new(config: Config) -> Arc<Self> {
        let ledger = Ledger::open(&config.ledger_path).await;

        Arc::new(Self { config, ledger })
    }
}
