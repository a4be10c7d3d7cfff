use serde::{Deserialize, Serialize};
use std::env;

/// Object storage settings, read from `S3_*` variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for MinIO or another S3-compatible gateway
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Static credentials; the default AWS provider chain is used when unset
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bucket = env::var("S3_BUCKET").unwrap_or_else(|_| "vstage-images".to_string());
        if bucket.trim().is_empty() {
            anyhow::bail!("S3_BUCKET cannot be empty");
        }

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            bucket,
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .ok()
                .filter(|s| !s.is_empty()),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .ok()
                .filter(|s| !s.is_empty()),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            bucket: bucket.into(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
        }
    }

    /// Both halves of a static key pair, if configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(access), Some(secret)) => Some((access, secret)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_for_minio() {
        let config = StorageConfig::for_minio("http://localhost:9000", "uploads");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "uploads");
        assert!(config.path_style);
        assert_eq!(config.static_credentials(), Some(("minioadmin", "minioadmin")));
    }

    #[test]
    fn test_partial_credentials_fall_back_to_chain() {
        let mut config = StorageConfig::for_minio("http://localhost:9000", "uploads");
        config.secret_key = None;
        assert!(config.static_credentials().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var("S3_BUCKET", "staged");
        env::set_var("S3_PATH_STYLE", "true");
        env::remove_var("S3_ACCESS_KEY");
        env::remove_var("AWS_ACCESS_KEY_ID");
        env::remove_var("S3_ENDPOINT");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.bucket, "staged");
        assert!(config.path_style);
        assert!(config.endpoint.is_none());
        assert!(config.static_credentials().is_none());

        env::set_var("S3_BUCKET", " ");
        assert!(StorageConfig::from_env().is_err());

        env::remove_var("S3_BUCKET");
        env::remove_var("S3_PATH_STYLE");
    }
}
