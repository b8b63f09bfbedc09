//! Google API authentication.
//!
//! Supports the two credential files Google tooling produces (service
//! account keys and authorized-user token caches) plus a pre-issued access
//! token taken straight from the environment.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{IndexError, Result};
use crate::models::{AuthorizedUserCredentials, ServiceAccountCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope needed to enumerate files and read their sharable links.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.metadata.readonly";

/// JWT claims for service account authentication.
#[derive(Debug, Serialize)]
struct Claims {
    iss: String,   // Issuer (service account email)
    scope: String, // OAuth scope
    aud: String,   // Audience (token endpoint)
    exp: u64,      // Expiration time
    iat: u64,      // Issued at
}

/// Cached access token with expiration.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: SystemTime,
}

enum CredentialSource {
    ServiceAccount(ServiceAccountCredentials),
    AuthorizedUser(AuthorizedUserCredentials),
    /// A pre-issued token; never refreshed.
    Static(String),
}

/// Authenticator for Google APIs.
#[derive(Clone)]
pub struct Authenticator {
    source: Arc<CredentialSource>,
    client: Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl Authenticator {
    /// Create an authenticator from a credentials JSON file.
    ///
    /// The file's `type` field selects the flow: `service_account` key
    /// files use the JWT assertion grant, `authorized_user` token caches
    /// use the refresh-token grant.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let cred_type = value
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_string);

        let source = match cred_type.as_deref() {
            Some("authorized_user") => CredentialSource::AuthorizedUser(
                serde_json::from_value::<AuthorizedUserCredentials>(value)?,
            ),
            // Service account key files carry "type": "service_account",
            // but older ones omit the field.
            _ => CredentialSource::ServiceAccount(
                serde_json::from_value::<ServiceAccountCredentials>(value)?,
            ),
        };

        Ok(Self::with_source(source))
    }

    /// Create an authenticator around a pre-issued access token.
    pub fn from_static_token(token: impl Into<String>) -> Self {
        Self::with_source(CredentialSource::Static(token.into()))
    }

    fn with_source(source: CredentialSource) -> Self {
        Self {
            source: Arc::new(source),
            client: Client::new(),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        if let CredentialSource::Static(token) = self.source.as_ref() {
            return Ok(token.clone());
        }

        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                // Add 60 second buffer before expiration
                let buffer = Duration::from_secs(60);
                if token.expires_at > SystemTime::now() + buffer {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let new_token = self.refresh_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(new_token.clone());
        }

        Ok(new_token.access_token)
    }

    async fn refresh_token(&self) -> Result<CachedToken> {
        match self.source.as_ref() {
            CredentialSource::ServiceAccount(creds) => self.refresh_service_account(creds).await,
            CredentialSource::AuthorizedUser(creds) => self.refresh_authorized_user(creds).await,
            CredentialSource::Static(token) => Ok(CachedToken {
                access_token: token.clone(),
                expires_at: SystemTime::now() + Duration::from_secs(3600),
            }),
        }
    }

    /// Exchange a signed JWT assertion for an access token.
    async fn refresh_service_account(
        &self,
        creds: &ServiceAccountCredentials,
    ) -> Result<CachedToken> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| IndexError::TokenRefreshError(e.to_string()))?
            .as_secs();

        let token_uri = creds.token_uri.as_deref().unwrap_or(TOKEN_URI);

        let claims = Claims {
            iss: creds.client_email.clone(),
            scope: DRIVE_SCOPE.to_string(),
            aud: token_uri.to_string(),
            iat: now,
            exp: now + 3600, // 1 hour
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())?;
        let jwt = encode(&header, &claims, &key)?;

        let params = [
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", &jwt),
        ];

        self.request_token(token_uri, &params).await
    }

    /// Exchange a cached refresh token for an access token.
    async fn refresh_authorized_user(
        &self,
        creds: &AuthorizedUserCredentials,
    ) -> Result<CachedToken> {
        let token_uri = creds.token_uri.as_deref().unwrap_or(TOKEN_URI);

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &creds.client_id),
            ("client_secret", &creds.client_secret),
            ("refresh_token", &creds.refresh_token),
        ];

        self.request_token(token_uri, &params).await
    }

    async fn request_token(&self, token_uri: &str, params: &[(&str, &str)]) -> Result<CachedToken> {
        let response = self.client.post(token_uri).form(params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::TokenRefreshError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;

        let expires_at = SystemTime::now() + Duration::from_secs(token_response.expires_in);

        Ok(CachedToken {
            access_token: token_response.access_token,
            expires_at,
        })
    }
}
