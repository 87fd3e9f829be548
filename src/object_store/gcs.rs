use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ObjectStore, ObjectStoreError};
use crate::storage::models::{content_type_for, StorageLocator};

const API_BASE: &str = "https://storage.googleapis.com";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
const SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
/// Refresh this long before the token actually expires.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

/// Google Cloud Storage backend. Objects are publicly addressable by URL,
/// but reads go through the authenticated JSON API.
pub struct GcsStore {
    bucket: String,
    client: Client,
    credentials_file: Option<String>,
    token: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

impl GcsStore {
    /// Build the store and fetch a first token so misconfiguration fails at startup.
    pub async fn new(bucket: &str, credentials_file: Option<&str>) -> Result<Self, anyhow::Error> {
        let store = Self {
            bucket: bucket.to_string(),
            client: Client::builder().build()?,
            credentials_file: credentials_file.map(|s| s.to_string()),
            token: RwLock::new(None),
        };

        store.access_token().await?;
        Ok(store)
    }

    async fn access_token(&self) -> Result<String, anyhow::Error> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() + TOKEN_SLACK {
                    return Ok(token.value.clone());
                }
            }
        }

        let fresh = match self.credentials_file {
            Some(ref path) => self.token_from_service_account(path).await?,
            None => self.token_from_metadata_server().await?,
        };
        tracing::debug!(expires_in = fresh.expires_in, "Refreshed GCS access token");

        let value = fresh.access_token.clone();
        *self.token.write().await = Some(CachedToken {
            value: fresh.access_token,
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        });
        Ok(value)
    }

    async fn token_from_service_account(&self, path: &str) -> Result<TokenResponse, anyhow::Error> {
        let key: ServiceAccountKey =
            serde_json::from_str(&tokio::fs::read_to_string(path).await?)?;

        let now = chrono::Utc::now().timestamp();
        let header = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
            "alg": "RS256",
            "typ": "JWT"
        }))?);
        let claims = base64_url_encode(&serde_json::to_vec(&serde_json::json!({
            "iss": key.client_email,
            "scope": SCOPE,
            "aud": key.token_uri,
            "iat": now,
            "exp": now + 3600,
        }))?);
        let unsigned = format!("{header}.{claims}");
        let signature = sign_rs256(unsigned.as_bytes(), &key.private_key)?;
        let assertion = format!("{unsigned}.{}", base64_url_encode(&signature));

        let resp = self
            .client
            .post(&key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn token_from_metadata_server(&self) -> Result<TokenResponse, anyhow::Error> {
        let resp = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{API_BASE}/storage/v1/b/{}/o/{}",
            self.bucket,
            encode_object_name(key)
        )
    }

    fn upload_url(&self, key: &str) -> String {
        format!(
            "{API_BASE}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            encode_object_name(key)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ObjectStoreError> {
        let token = self
            .access_token()
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("GCS auth failed: {e}")))?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }
}

async fn backend_failure(action: &str, resp: Response) -> ObjectStoreError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    ObjectStoreError::Backend(format!("GCS {action} failed ({status}): {body}"))
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        let extension = key.rfind('.').map(|i| &key[i..]).unwrap_or("");
        let request = self
            .client
            .post(self.upload_url(key))
            .header("Content-Type", content_type_for(extension))
            .body(data);

        let resp = self.send(request).await?;
        if !resp.status().is_success() {
            return Err(backend_failure("upload", resp).await);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let request = self
            .client
            .get(format!("{}?alt=media", self.object_url(key)));

        let resp = self.send(request).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        if !resp.status().is_success() {
            return Err(backend_failure("download", resp).await);
        }
        resp.bytes()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let resp = self.send(self.client.delete(self.object_url(key))).await?;

        // Already gone counts as deleted
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(backend_failure("delete", resp).await);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let resp = self.send(self.client.get(self.object_url(key))).await?;
        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(backend_failure("metadata lookup", resp).await),
        }
    }

    fn locate(&self, key: &str) -> StorageLocator {
        StorageLocator::Object {
            key: key.to_string(),
            url: format!("{API_BASE}/{}/{key}", self.bucket),
        }
    }
}

/// Percent-encode an object name for use as a single path segment or query value.
fn encode_object_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for b in name.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn base64_url_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
}

fn sign_rs256(data: &[u8], private_key_pem: &str) -> Result<Vec<u8>, anyhow::Error> {
    use base64::Engine;

    let der_b64: String = private_key_pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("-----"))
        .collect();
    let der = base64::engine::general_purpose::STANDARD.decode(der_b64)?;

    let key_pair = ring::signature::RsaKeyPair::from_pkcs8(&der)
        .map_err(|e| anyhow::anyhow!("Failed to parse RSA key: {e}"))?;

    let mut signature = vec![0u8; key_pair.public().modulus_len()];
    key_pair
        .sign(
            &ring::signature::RSA_PKCS1_SHA256,
            &ring::rand::SystemRandom::new(),
            data,
            &mut signature,
        )
        .map_err(|e| anyhow::anyhow!("Failed to sign: {e}"))?;

    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_names_are_encoded_as_one_segment() {
        assert_eq!(
            encode_object_name("pdfs/abc-1.pdf"),
            "pdfs%2Fabc-1.pdf".to_string()
        );
        assert_eq!(encode_object_name("a b"), "a%20b".to_string());
    }
}
