use mongodb::bson::doc;
use mongodb::{Client, Database, options::ClientOptions};
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument};

use super::MongoConfig;
use crate::common::{DatabaseError, DatabaseResult, Readiness, RetryConfig};

/// Build driver options from a MongoConfig without touching the network
/// beyond SRV resolution for `mongodb+srv://` strings.
async fn client_options(config: &MongoConfig) -> DatabaseResult<ClientOptions> {
    let mut options = ClientOptions::parse(&config.url)
        .await
        .map_err(|e| DatabaseError::ConfigError(format!("invalid MongoDB URL: {e}")))?;

    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));

    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    Ok(options)
}

/// Round-trip a `ping` command against the database
pub async fn ping(db: &Database) -> DatabaseResult<()> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// A lazily connected client paired with its readiness flag
///
/// Constructing the handle performs no I/O against the server, so the HTTP
/// listener can start while [`MongoHandle::establish`] runs in the background.
#[derive(Clone, Debug)]
pub struct MongoHandle {
    client: Client,
    database: Database,
    readiness: Readiness,
    retry: RetryConfig,
}

impl MongoHandle {
    pub async fn new(config: &MongoConfig) -> DatabaseResult<Self> {
        let client = Client::with_options(client_options(config).await?)?;
        let database = client.database(&config.database);

        Ok(Self {
            client,
            database,
            readiness: Readiness::new(),
            retry: config.retry_config(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Shared readiness flag, flipped by [`MongoHandle::establish`]
    pub fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }

    /// Ping and run `init` until both succeed, publishing progress through
    /// the readiness flag.
    ///
    /// `retry` overrides the policy derived from the config. Each exhausted
    /// round marks the handle `Failed`; retries continue at the capped delay,
    /// so the future only completes once the store is `Connected`. `init` must
    /// be idempotent since it may run once per attempt.
    #[instrument(skip_all, fields(database = %self.database.name()))]
    pub async fn establish<F, Fut>(self, retry: Option<RetryConfig>, mut init: F)
    where
        F: FnMut(Database) -> Fut,
        Fut: Future<Output = DatabaseResult<()>>,
    {
        let policy = retry.unwrap_or_else(|| self.retry.clone());
        let db = self.database.clone();

        self.readiness
            .supervise(policy, || {
                let db = db.clone();
                let initialized = init(db.clone());
                async move {
                    ping(&db).await?;
                    initialized.await
                }
            })
            .await;

        info!("MongoDB connection established");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ConnectionState;

    fn unreachable_config() -> MongoConfig {
        let mut config = MongoConfig::new("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=100");
        config.server_selection_timeout_secs = 1;
        config.connect_timeout_secs = 1;
        config
    }

    #[tokio::test]
    async fn test_handle_starts_connecting() {
        let handle = MongoHandle::new(&MongoConfig::default()).await.unwrap();
        assert_eq!(handle.readiness().state(), ConnectionState::Connecting);
        assert_eq!(handle.database().name(), "inventory");
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let err = MongoHandle::new(&MongoConfig::new("not-a-url"))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_establish_marks_failed_and_keeps_retrying() {
        let handle = MongoHandle::new(&unreachable_config()).await.unwrap();
        let readiness = handle.readiness();

        let retry = RetryConfig::new()
            .with_max_retries(0)
            .with_initial_delay(1)
            .with_max_delay(10)
            .without_jitter();
        let task = tokio::spawn(handle.establish(Some(retry), |_| async { Ok(()) }));

        let failed = tokio::time::timeout(Duration::from_secs(10), async {
            while readiness.state() != ConnectionState::Failed {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        assert!(failed.is_ok());
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_establish_runs_init_and_marks_connected() {
        let url = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let handle = MongoHandle::new(&MongoConfig::with_database(url, "inventory_test"))
            .await
            .unwrap();
        let readiness = handle.readiness();

        handle
            .establish(None, |db| async move { ping(&db).await })
            .await;

        assert!(readiness.is_ready());
    }
}
