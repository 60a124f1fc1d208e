use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::types::IdentityToken;

/// Error type returned by revokers. Only ever logged.
pub type RevocationError = Box<dyn std::error::Error + Send + Sync>;

/// Identity-provider token revocation.
pub trait TokenRevoker: Send + Sync + 'static {
    /// Ask the identity provider to revoke `token`.
    fn revoke(
        &self,
        token: &IdentityToken,
    ) -> impl Future<Output = Result<(), RevocationError>> + Send;
}

/// Revokes tokens through the identity provider's HTTP revocation endpoint.
///
/// Posts `token=<token>` as a form body, as Google's
/// `https://oauth2.googleapis.com/revoke` expects.
#[derive(Debug, Clone)]
pub struct IdentityProviderRevoker {
    revoke_url: Url,
    http: reqwest::Client,
}

impl IdentityProviderRevoker {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            revoke_url: config.revoke_url.clone(),
            http: config.http_client()?,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

impl TokenRevoker for IdentityProviderRevoker {
    async fn revoke(&self, token: &IdentityToken) -> Result<(), RevocationError> {
        let response = self
            .http
            .post(self.revoke_url.clone())
            .form(&[("token", token.as_str())])
            .send()
            .await
            .map_err(|e| Error::from_transport(e, "token revocation"))?;

        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(format!("revocation endpoint returned {status}: {body}").into())
    }
}

/// Revoker for deployments without an identity provider to notify.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRevocation;

impl TokenRevoker for NoRevocation {
    async fn revoke(&self, _token: &IdentityToken) -> Result<(), RevocationError> {
        Ok(())
    }
}

/// Spawn a detached revocation task.
///
/// The outcome is logged and never surfaced: local teardown has already
/// happened and is authoritative. Callers may drop the handle.
pub fn spawn_revocation<R: TokenRevoker>(revoker: Arc<R>, token: IdentityToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match revoker.revoke(&token).await {
            Ok(()) => tracing::debug!("Identity token revoked"),
            Err(e) => tracing::warn!(error = %e, "Identity token revocation failed"),
        }
    })
}
