use std::future::Future;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::types::{ProfileClaims, UserId};

/// Registration payload for `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub avatar: String,
}

impl From<&ProfileClaims> for NewUser {
    fn from(claims: &ProfileClaims) -> Self {
        Self {
            name: claims.name.clone(),
            email: claims.email.clone(),
            avatar: claims.picture.clone(),
        }
    }
}

/// Backend user registry: create-or-identify a user by email.
///
/// Registration must be idempotent on the backend: registering the same email
/// twice identifies the existing record instead of creating a duplicate. This
/// makes a failed or timed-out login safe to retry.
pub trait UserRegistry: Send + Sync + 'static {
    /// Register (or identify) the user and return the backend user id.
    fn register(&self, user: &NewUser) -> impl Future<Output = Result<UserId, Error>> + Send;
}

#[derive(Deserialize)]
struct RegisteredUser {
    #[serde(rename = "_id")]
    id: UserId,
}

/// HTTP client for the backend `POST /users` endpoint.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    users_url: Url,
    http: reqwest::Client,
}

impl RegistrationClient {
    /// Create a client targeting `{api_url}/users`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint URL is invalid, or
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        Ok(Self {
            users_url: config.endpoint("users")?,
            http: config.http_client()?,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn users_url(&self) -> &Url {
        &self.users_url
    }
}

impl UserRegistry for RegistrationClient {
    async fn register(&self, user: &NewUser) -> Result<UserId, Error> {
        const OPERATION: &str = "user registration";

        let response = self
            .http
            .post(self.users_url.clone())
            .json(user)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, OPERATION))?;

        // Only 200 counts: 201 or other 2xx codes are not part of the contract
        let status = response.status().as_u16();
        if status != 200 {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status, email = %user.email, "User registration rejected");
            return Err(Error::RegistrationRejected { status, detail });
        }

        let registered = response
            .json::<RegisteredUser>()
            .await
            .map_err(|e| Error::from_transport(e, OPERATION))?;
        Ok(registered.id)
    }
}
