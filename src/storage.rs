use anyhow::Context;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    presigning::PresigningConfig,
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use axum::async_trait;
use bytes::Bytes;

/// External artifact store: accepts (filename, bytes, mime type), returns a
/// version token per save. Generated reports are persisted here, never on
/// local disk.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn save_artifact(
        &self,
        filename: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String>;
    async fn presign_get(&self, filename: &str, seconds: u64) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

impl Storage {
    pub async fn new(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                access_key, secret_key, None, None, "static",
            ))
            .endpoint_url(endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: bucket.to_string(),
        })
    }
}

#[async_trait]
impl ArtifactStore for Storage {
    async fn save_artifact(
        &self,
        filename: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let out = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(filename)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;

        // Version id when the bucket is versioned, etag otherwise.
        let version = out
            .version_id()
            .map(|v| v.to_string())
            .or_else(|| out.e_tag().map(|v| v.trim_matches('"').to_string()))
            .unwrap_or_else(|| "0".to_string());
        Ok(version)
    }

    async fn presign_get(&self, filename: &str, seconds: u64) -> anyhow::Result<String> {
        let req = self.client.get_object().bucket(&self.bucket).key(filename);
        let presigned = req
            .presigned(PresigningConfig::expires_in(
                std::time::Duration::from_secs(seconds),
            )?)
            .await
            .context("s3 presign_get")?;
        Ok(presigned.uri().to_string())
    }
}
