use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, FeedbackService, LogMailer, Mailer, SeaOrmAccountService, SeaOrmFeedbackService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub accounts: Arc<dyn AccountService>,

    pub feedback: Arc<dyn FeedbackService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer: Arc<dyn Mailer> =
            Arc::new(LogMailer::new(config.mail.from_address.clone()));

        let accounts = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            mailer.clone(),
            config.security.clone(),
            config.mail.clone(),
        )) as Arc<dyn AccountService + Send + Sync + 'static>;

        let feedback = Arc::new(SeaOrmFeedbackService::new(store.clone()))
            as Arc<dyn FeedbackService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            accounts,
            feedback,
        })
    }
}
