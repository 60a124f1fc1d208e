use std::sync::Arc;

use crate::authenticator::{ApiClient, RequestAuthenticator};
use crate::config::ClientConfig;
use crate::credential::decode_credential;
use crate::error::Error;
use crate::registration::{NewUser, RegistrationClient, UserRegistry};
use crate::revocation::{IdentityProviderRevoker, TokenRevoker, spawn_revocation};
use crate::session::{Session, SessionStore};
use crate::storage::SessionStorage;
#[cfg(feature = "file-store")]
use crate::storage::FileStorage;
use crate::types::{IdentityToken, UserProfile};

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct LoginSuccess {
    pub redirect_to: String,
}

/// Logout always succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct LogoutOutcome {
    pub redirect_to: String,
}

/// Result of a protected-navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated,
    Unauthenticated {
        redirect_to: String,
        /// Always `true`: an absent session should be torn down client-side.
        logout: bool,
        reason: CheckFailure,
    },
}

impl SessionStatus {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Why a session check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct CheckFailure {
    pub name: String,
    pub message: String,
}

impl CheckFailure {
    fn token_not_found() -> Self {
        Self {
            name: "Token not found".into(),
            message: "Check failed".into(),
        }
    }

    fn storage_unavailable(err: &Error) -> Self {
        Self {
            name: "Storage unavailable".into(),
            message: err.to_string(),
        }
    }
}

/// What to do after an API call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct ErrorDisposition {
    pub logout: bool,
}

/// Owns the session lifecycle: login, logout, checks and identity reads.
///
/// The manager, its [`RequestAuthenticator`] and any [`ApiClient`] built from
/// it share one [`SessionStore`].
pub struct SessionManager<S, U = RegistrationClient, R = IdentityProviderRevoker> {
    config: ClientConfig,
    store: SessionStore<S>,
    registry: U,
    revoker: Arc<R>,
    authenticator: RequestAuthenticator<S>,
}

#[cfg(feature = "file-store")]
impl SessionManager<FileStorage> {
    /// Wire file-backed storage, HTTP registration and revocation from one config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::Http`] if a client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        let storage = FileStorage::new(config.session_file());
        let registry = RegistrationClient::new(&config)?;
        let revoker = IdentityProviderRevoker::new(&config)?;
        Ok(Self::new(config, storage, registry, revoker))
    }
}

impl<S, U, R> SessionManager<S, U, R>
where
    S: SessionStorage,
    U: UserRegistry,
    R: TokenRevoker,
{
    #[must_use]
    pub fn new(config: ClientConfig, storage: S, registry: U, revoker: R) -> Self {
        let store = SessionStore::new(storage);
        Self {
            authenticator: RequestAuthenticator::new(store.clone()),
            config,
            store,
            registry,
            revoker: Arc::new(revoker),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The shared session store.
    #[must_use]
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// The request authenticator bound to this manager's session.
    #[must_use]
    pub fn authenticator(&self) -> &RequestAuthenticator<S> {
        &self.authenticator
    }

    /// Build an API client whose requests carry this manager's session token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn api_client(&self) -> Result<ApiClient<S>, Error> {
        ApiClient::new(self.config.clone(), self.authenticator.clone())
    }

    /// Exchange an identity-provider credential for a session.
    ///
    /// Nothing is persisted unless registration succeeds; then token and
    /// profile are written in one batch.
    ///
    /// # Errors
    ///
    /// - [`Error::CredentialDecode`]: malformed credential (no network call made)
    /// - [`Error::RegistrationRejected`]: backend answered with a non-200 status
    /// - [`Error::Timeout`] / [`Error::Http`]: registration call failed
    /// - [`Error::Storage`]: the session could not be persisted
    pub async fn login(&self, credential: &str) -> Result<LoginSuccess, Error> {
        let claims = decode_credential(credential)?;
        if let Some(expires_at) = claims.expires_at() {
            tracing::debug!(%expires_at, "Identity credential decoded");
        }

        let user_id = self.registry.register(&NewUser::from(&claims)).await?;

        let session = Session {
            token: IdentityToken::from(credential.to_string()),
            profile: UserProfile::from_claims(claims).with_user_id(user_id.clone()),
        };
        self.store.write(&session).await?;

        tracing::info!(user_id = %user_id, "Login successful");

        Ok(LoginSuccess {
            redirect_to: self.config.login_redirect.clone(),
        })
    }

    /// Tear down the local session and revoke the token in the background.
    ///
    /// Both keys are cleared even when no token is found, so a half-written
    /// session never outlives a logout. Idempotent: succeeds with no active
    /// session too.
    pub async fn logout(&self) -> LogoutOutcome {
        let token = match self.store.token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session during logout");
                None
            }
        };

        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "Failed to clear session during logout");
        }
        self.authenticator.clear_default_headers().await;

        if let Some(token) = token {
            spawn_revocation(self.revoker.clone(), token);
            tracing::info!("Logged out");
        }

        LogoutOutcome {
            redirect_to: self.config.logout_redirect.clone(),
        }
    }

    /// Authenticated iff a token is persisted. No expiry check is made.
    pub async fn check_session(&self) -> SessionStatus {
        let reason = match self.store.token().await {
            Ok(Some(_)) => return SessionStatus::Authenticated,
            Ok(None) => CheckFailure::token_not_found(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session during check");
                CheckFailure::storage_unavailable(&e)
            }
        };

        SessionStatus::Unauthenticated {
            redirect_to: self.config.logout_redirect.clone(),
            logout: true,
            reason,
        }
    }

    /// The profile of the persisted session, if any.
    ///
    /// A profile stored without its token is not an identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] or [`Error::Serialization`] if the stored
    /// session cannot be read.
    pub async fn get_identity(&self) -> Result<Option<UserProfile>, Error> {
        Ok(self.store.read().await?.map(|session| session.profile))
    }

    /// There is no permission model: always `None`.
    pub async fn get_permissions(&self) -> Option<serde_json::Value> {
        None
    }

    /// Hook for failed API calls. Logs and keeps the session.
    pub fn on_error(&self, status: u16, message: &str) -> ErrorDisposition {
        tracing::warn!(status, error = message, "API request failed");
        ErrorDisposition { logout: false }
    }
}
