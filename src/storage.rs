use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Bucket holding thread attachments.
pub const THREAD_IMAGES_BUCKET: &str = "thread-images";

#[derive(Debug, Clone, Deserialize)]
pub struct BucketInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketConfig {
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
}

/// The object-storage collaborator boundary. Uploads produce durable public
/// URLs; removal is best-effort during edits.
pub trait MediaStorage: Send + Sync {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], mime: &str) -> Result<()>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
    fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;
    fn list_buckets(&self) -> Result<Vec<BucketInfo>>;
    fn create_bucket(&self, name: &str, config: &BucketConfig) -> Result<()>;
}

/// Blocking client for the hosted object-storage service.
pub struct StorageClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl StorageClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        let _ = Url::parse(&base).context("invalid storage base URL")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base,
            api_key: api_key.into(),
            client,
        })
    }

    fn object_url(&self, suffix: &str) -> String {
        format!("{}/storage/v1/{}", self.base_url, suffix)
    }
}

impl MediaStorage for StorageClient {
    fn upload(&self, bucket: &str, path: &str, bytes: &[u8], mime: &str) -> Result<()> {
        let url = self.object_url(&format!("object/{bucket}/{path}"));
        self.client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", mime)
            .body(bytes.to_vec())
            .send()?
            .error_for_status()
            .with_context(|| format!("upload of {path} rejected"))?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_url(&format!("object/public/{bucket}/{path}"))
    }

    fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        let url = self.object_url(&format!("object/{bucket}"));
        self.client
            .delete(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "prefixes": paths }))
            .send()?
            .error_for_status()
            .context("storage removal rejected")?;
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let url = self.object_url("bucket");
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()?
            .error_for_status()?;
        Ok(response.json()?)
    }

    fn create_bucket(&self, name: &str, config: &BucketConfig) -> Result<()> {
        let url = self.object_url("bucket");
        self.client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "name": name,
                "id": name,
                "public": config.public,
                "allowed_mime_types": config.allowed_mime_types,
                "file_size_limit": config.file_size_limit,
            }))
            .send()?
            .error_for_status()
            .with_context(|| format!("creating bucket {name} failed"))?;
        Ok(())
    }
}

/// Recovers the in-bucket object path from a durable public URL, so images
/// marked for removal during an edit can be deleted from storage. Returns
/// `None` when the URL does not point into `bucket`.
pub fn storage_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.collect();
    let bucket_idx = segments.iter().position(|s| *s == bucket)?;
    if bucket_idx + 1 >= segments.len() {
        return None;
    }
    Some(segments[bucket_idx + 1..].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn storage_path_round_trips_through_public_url() {
        let client = StorageClient::new("https://abc.example.co/", "key").unwrap();
        let url = client.public_url(THREAD_IMAGES_BUCKET, "u1/170000-abc-pic.png");
        assert_eq!(
            storage_path_from_url(&url, THREAD_IMAGES_BUCKET).as_deref(),
            Some("u1/170000-abc-pic.png")
        );
    }

    #[test]
    fn storage_path_rejects_foreign_urls() {
        assert_eq!(
            storage_path_from_url("https://example.com/other/u1/pic.png", THREAD_IMAGES_BUCKET),
            None
        );
        assert_eq!(storage_path_from_url("not a url", THREAD_IMAGES_BUCKET), None);
    }
}
