//! Object storage for uploaded media.
//!
//! Objects live under `<root>/<bucket>/<key>` on the local filesystem. Public
//! buckets are served as-is; private objects are reachable only through
//! time-limited signed URLs (HMAC-SHA256 over `bucket/key:expires`).

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::PathBuf;
use thiserror::Error;

pub const AVATARS_BUCKET: &str = "avatars";
pub const RESUMES_BUCKET: &str = "resumes";
pub const BLOG_COVERS_BUCKET: &str = "blog-covers";

pub const RESUME_KEY: &str = "resume.pdf";

/// Avatar key for an image of the given extension, e.g. `profile.png`.
pub fn profile_image_key(extension: &str) -> String {
    format!("profile.{}", extension)
}

/// Buckets whose objects are served without a signature.
pub const PUBLIC_BUCKETS: &[&str] = &[AVATARS_BUCKET, BLOG_COVERS_BUCKET];

pub fn is_known_bucket(bucket: &str) -> bool {
    matches!(bucket, AVATARS_BUCKET | RESUMES_BUCKET | BLOG_COVERS_BUCKET)
}

pub fn is_public_bucket(bucket: &str) -> bool {
    PUBLIC_BUCKETS.contains(&bucket)
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("signing error: {0}")]
    Signing(String),
}

/// A stored object and the content type inferred from its key.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, replacing any existing one under the same key.
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<(), StorageError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError>;
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;
    fn public_url(&self, bucket: &str, key: &str) -> String;
    /// True when `url` points into this store (public or signed form).
    fn owns_url(&self, url: &str) -> bool;
    /// Key of the object `url` names in `bucket`, if it is one of our public URLs.
    fn key_from_public_url(&self, bucket: &str, url: &str) -> Option<String>;
    fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError>;
    fn verify_signature(
        &self,
        bucket: &str,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool;
}

/// Reject traversal and anything that would escape the bucket directory.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
    secret: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: &str, secret: &str) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.trim_end_matches('/').to_string(),
            secret: secret.to_string(),
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        if !is_known_bucket(bucket) {
            return Err(StorageError::UnknownBucket(bucket.to_string()));
        }
        validate_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }

    fn sign(&self, bucket: &str, key: &str, expires: i64) -> Result<Vec<u8>, StorageError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(format!("{}/{}:{}", bucket, key, expires).as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(bucket, key, size = bytes.len(), "object stored");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(StoredObject {
                bytes: Bytes::from(bytes),
                content_type: mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string(),
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(bucket, key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base, bucket, key)
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/storage/", self.public_base))
    }

    fn key_from_public_url(&self, bucket: &str, url: &str) -> Option<String> {
        let key = url.strip_prefix(&format!("{}/storage/{}/", self.public_base, bucket))?;
        validate_key(key).ok()?;
        Some(key.to_string())
    }

    fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        self.object_path(bucket, key)?;
        let expires = (now + ttl).timestamp();
        let sig = hex::encode(self.sign(bucket, key, expires)?);
        Ok(format!(
            "{}/storage/signed/{}/{}?expires={}&sig={}",
            self.public_base, bucket, key, expires, sig
        ))
    }

    fn verify_signature(
        &self,
        bucket: &str,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        let Ok(computed) = self.sign(bucket, key, expires) else {
            return false;
        };
        expected.len() == computed.len() && constant_time_eq(&computed, &expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LocalObjectStore {
        let root = std::env::temp_dir().join(format!("storage-test-{}", uuid::Uuid::new_v4()));
        LocalObjectStore::new(root, "https://portfolio.test/", "secret")
    }

    fn query_param<'a>(url: &'a str, name: &str) -> &'a str {
        let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
            .unwrap_or("")
    }

    #[tokio::test]
    async fn test_put_overwrites_and_get_reads_back() {
        let store = store();
        let key = profile_image_key("jpg");
        store
            .put(AVATARS_BUCKET, &key, Bytes::from_static(b"one"))
            .await
            .unwrap();
        store
            .put(AVATARS_BUCKET, &key, Bytes::from_static(b"two"))
            .await
            .unwrap();

        let object = store.get(AVATARS_BUCKET, &key).await.unwrap().unwrap();
        assert_eq!(&object.bytes[..], b"two");
        assert_eq!(object.content_type, "image/jpeg");
        assert!(store.exists(AVATARS_BUCKET, &key).await.unwrap());
        assert!(store.get(RESUMES_BUCKET, RESUME_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_traversal_and_unknown_bucket_rejected() {
        let store = store();
        let err = store
            .put(AVATARS_BUCKET, "../escape.txt", Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = store.get("secrets", "a.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownBucket(_)));
    }

    #[test]
    fn test_signed_url_verifies_until_expiry() {
        let store = store();
        let now = Utc::now();
        let url = store
            .signed_url(RESUMES_BUCKET, RESUME_KEY, Duration::seconds(3600), now)
            .unwrap();
        assert!(url.starts_with("https://portfolio.test/storage/signed/resumes/resume.pdf?"));

        let expires: i64 = query_param(&url, "expires").parse().unwrap();
        let sig = query_param(&url, "sig");
        assert_eq!(expires, now.timestamp() + 3600);

        assert!(store.verify_signature(RESUMES_BUCKET, RESUME_KEY, expires, sig, now));
        assert!(!store.verify_signature(
            RESUMES_BUCKET,
            RESUME_KEY,
            expires,
            sig,
            now + Duration::seconds(3601)
        ));
        assert!(!store.verify_signature(AVATARS_BUCKET, RESUME_KEY, expires, sig, now));
        assert!(!store.verify_signature(RESUMES_BUCKET, RESUME_KEY, expires + 1, sig, now));
        assert!(!store.verify_signature(RESUMES_BUCKET, RESUME_KEY, expires, "zz", now));
    }

    #[test]
    fn test_owns_url() {
        let store = store();
        assert!(store.owns_url(&store.public_url(RESUMES_BUCKET, RESUME_KEY)));
        assert!(!store.owns_url("https://cdn.example.com/resume.pdf"));
    }

    #[test]
    fn test_key_from_public_url() {
        let store = store();
        let url = store.public_url(AVATARS_BUCKET, &profile_image_key("webp"));
        assert_eq!(
            store.key_from_public_url(AVATARS_BUCKET, &url),
            Some("profile.webp".to_string())
        );
        assert_eq!(store.key_from_public_url(BLOG_COVERS_BUCKET, &url), None);
        assert_eq!(
            store.key_from_public_url(AVATARS_BUCKET, "https://portfolio.test/storage/avatars/../x"),
            None
        );
        assert_eq!(
            store.key_from_public_url(AVATARS_BUCKET, "https://cdn.example.com/me.png"),
            None
        );
    }

    #[tokio::test]
    async fn test_content_type_follows_key_extension() {
        let store = store();
        let key = profile_image_key("png");
        store
            .put(AVATARS_BUCKET, &key, Bytes::from_static(b"\x89PNG"))
            .await
            .unwrap();
        let object = store.get(AVATARS_BUCKET, &key).await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/png");
    }
}
