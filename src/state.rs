use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, AuthService, SeaOrmAccountService, SeaOrmAuthService, SeaOrmSettingsService,
    SettingsService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub account_service: Arc<dyn AccountService>,

    pub settings_service: Arc<dyn SettingsService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Builds the services over an already-migrated store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let account_service = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AccountService>;

        let settings_service =
            Arc::new(SeaOrmSettingsService::new(store.clone())) as Arc<dyn SettingsService>;

        Self {
            config: Arc::new(config),
            store,
            auth_service,
            account_service,
            settings_service,
        }
    }
}
