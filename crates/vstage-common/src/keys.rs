//! Storage key extraction
//!
//! Image rows store full object URLs. Two addressing styles are in use:
//!
//! - virtual-hosted: `https://<bucket>.s3.<region>.amazonaws.com/<key>`
//! - path-style (MinIO, local S3 gateways): `http://host:9000/<bucket>/<key>`
//!
//! A host containing `s3` is treated as virtual-hosted.

use url::Url;

use crate::error::{Result, VstageError};

/// Extract the object key from a stored image URL.
///
/// # Examples
///
/// ```
/// use vstage_common::keys::extract_key;
///
/// assert_eq!(
///     extract_key("https://bucket.s3.us-west-2.amazonaws.com/path/to/file.png").unwrap(),
///     "path/to/file.png"
/// );
/// ```
pub fn extract_key(raw_url: &str) -> Result<String> {
    let url = Url::parse(raw_url).map_err(|e| VstageError::InvalidUrl(e.to_string()))?;

    let path = urlencoding::decode(url.path())
        .map_err(|e| VstageError::InvalidUrl(e.to_string()))?;
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(VstageError::EmptyUrlPath);
    }

    let host = url.host_str().unwrap_or_default();
    if host.contains("s3") {
        return Ok(path.to_string());
    }

    // First segment is the bucket
    match path.split_once('/') {
        Some((_bucket, key)) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(VstageError::PathStyleKey),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_hosted_style() {
        assert_eq!(
            extract_key("https://bucket.s3.us-west-2.amazonaws.com/path/to/file.png").unwrap(),
            "path/to/file.png"
        );
        assert_eq!(
            extract_key("https://bucket.s3.amazonaws.com/file.png").unwrap(),
            "file.png"
        );
    }

    #[test]
    fn test_path_style() {
        assert_eq!(
            extract_key("http://localhost:9000/bucket/uploads/test.jpg").unwrap(),
            "uploads/test.jpg"
        );
        assert_eq!(
            extract_key("http://minio.internal/staging/p/1/staged/room.webp").unwrap(),
            "p/1/staged/room.webp"
        );
    }

    #[test]
    fn test_empty_path() {
        let err = extract_key("https://bucket.s3.amazonaws.com/").unwrap_err();
        assert_eq!(err, VstageError::EmptyUrlPath);
        assert_eq!(err.to_string(), "empty path in URL");
    }

    #[test]
    fn test_path_style_without_key() {
        let err = extract_key("http://localhost:9000/bucket").unwrap_err();
        assert_eq!(err, VstageError::PathStyleKey);
        assert_eq!(err.to_string(), "cannot extract key from path-style URL");

        assert_eq!(
            extract_key("http://localhost:9000/bucket/").unwrap_err(),
            VstageError::PathStyleKey
        );
    }

    #[test]
    fn test_percent_encoded_key_is_decoded() {
        assert_eq!(
            extract_key("http://localhost:9000/bucket/uploads/living%20room.jpg").unwrap(),
            "uploads/living room.jpg"
        );
    }

    #[test]
    fn test_unparseable_url() {
        let err = extract_key("not a url").unwrap_err();
        assert!(matches!(err, VstageError::InvalidUrl(_)));
    }

    #[test]
    fn test_query_string_is_not_part_of_key() {
        assert_eq!(
            extract_key("https://bucket.s3.amazonaws.com/a/b.png?X-Amz-Expires=60").unwrap(),
            "a/b.png"
        );
    }
}
