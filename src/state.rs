use std::sync::Arc;

use crate::{
    auth::repo::UserRepo, comments::repo::CommentRepo, config::AppConfig, db::PgStore,
    memory::MemoryStore, schedules::repo::ScheduleRepo,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub schedules: Arc<dyn ScheduleRepo>,
    pub comments: Arc<dyn CommentRepo>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        match config.database_url.as_deref() {
            Some(url) => {
                let store = PgStore::connect(url, config.db_max_connections).await?;
                store.migrate().await?;
                tracing::info!("using postgres store");
                Ok(Self::from_store(config, store))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; data lives in memory and is lost on exit");
                Ok(Self::from_store(config, MemoryStore::new()))
            }
        }
    }

    /// One backing store serving every repository.
    pub fn from_store<S>(config: Arc<AppConfig>, store: S) -> Self
    where
        S: UserRepo + ScheduleRepo + CommentRepo + Clone + 'static,
    {
        Self {
            config,
            users: Arc::new(store.clone()),
            schedules: Arc::new(store.clone()),
            comments: Arc::new(store),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_store(Arc::new(config), MemoryStore::new())
    }
}
