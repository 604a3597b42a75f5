use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Base data directory; created at startup if missing.
    pub data_dir: PathBuf,
    pub weights_path: PathBuf,
    pub image_dir: PathBuf,
    pub inference_csv: PathBuf,
    pub audit_csv: PathBuf,
    pub s3: S3Config,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".into()));
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| format!("sqlite://{}/users.db?mode=rwc", data_dir.display()));

        let weights_path = std::env::var("WEIGHTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("model").join("vgg_cxr.safetensors"));
        let image_dir = std::env::var("IMAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("cxr_images"));
        let inference_csv = std::env::var("INFERENCE_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("csv").join("user_inferences.csv"));
        let audit_csv = std::env::var("AUDIT_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("csv").join("user_details.csv"));

        let s3 = S3Config {
            endpoint: std::env::var("S3_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:9000".into()),
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "lungsight-reports".into()),
            access_key: std::env::var("S3_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".into()),
            secret_key: std::env::var("S3_SECRET_KEY").unwrap_or_else(|_| "minioadmin".into()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
        };

        Ok(Self {
            database_url,
            data_dir,
            weights_path,
            image_dir,
            inference_csv,
            audit_csv,
            s3,
        })
    }
}
