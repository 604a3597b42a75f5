use std::sync::{Arc, RwLock};

use anyhow::Context;
use sqlx::SqlitePool;

use crate::auth::audit::AuditLog;
use crate::classifier::CxrModel;
use crate::config::AppConfig;
use crate::records::InferenceLog;
use crate::session::SessionStore;
use crate::storage::{ArtifactStore, Storage};

/// Owned, lock-guarded classifier handle. `None` until `/model/load` runs;
/// replaced wholesale on reload, so in-flight inferences keep their own `Arc`.
pub type ModelHandle = Arc<RwLock<Option<Arc<CxrModel>>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ArtifactStore>,
    pub model: ModelHandle,
    pub sessions: Arc<SessionStore>,
    pub audit_log: Arc<AuditLog>,
    pub inference_log: Arc<InferenceLog>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("create data dir {}", config.data_dir.display()))?;

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage = Arc::new(
            Storage::new(
                &config.s3.endpoint,
                &config.s3.bucket,
                &config.s3.access_key,
                &config.s3.secret_key,
                &config.s3.region,
            )
            .await?,
        ) as Arc<dyn ArtifactStore>;

        Ok(Self::from_parts(db, config, storage))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            audit_log: Arc::new(AuditLog::new(config.audit_csv.clone())),
            inference_log: Arc::new(InferenceLog::new(config.inference_csv.clone())),
            db,
            config,
            storage,
            model: Arc::new(RwLock::new(None)),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    pub fn fake() -> Self {
        use axum::async_trait;
        use bytes::Bytes;

        #[derive(Clone)]
        struct FakeStorage;
        #[async_trait]
        impl ArtifactStore for FakeStorage {
            async fn save_artifact(
                &self,
                _filename: &str,
                _body: Bytes,
                _content_type: &str,
            ) -> anyhow::Result<String> {
                Ok("1".to_string())
            }
            async fn presign_get(&self, filename: &str, _seconds: u64) -> anyhow::Result<String> {
                Ok(format!("https://fake.local/{}", filename))
            }
        }

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy("sqlite::memory:")
            .expect("lazy pool ok");

        let tmp =
            std::env::temp_dir().join(format!("lungsight-test-{}", uuid::Uuid::new_v4()));
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            data_dir: tmp.clone(),
            weights_path: tmp.join("model").join("vgg_cxr.safetensors"),
            image_dir: tmp.join("cxr_images"),
            inference_csv: tmp.join("csv").join("user_inferences.csv"),
            audit_csv: tmp.join("csv").join("user_details.csv"),
            s3: crate::config::S3Config {
                endpoint: "fake".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
            },
        });

        Self::from_parts(db, config, Arc::new(FakeStorage))
    }
}
