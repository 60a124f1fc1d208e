use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::session::SessionStore;
use crate::storage::SessionStorage;
use crate::types::IdentityToken;

/// Attaches the current session's bearer token to outgoing requests.
///
/// The token is read from the [`SessionStore`] on every call, so a request
/// always carries exactly the token persisted at send time. With no session
/// the `Authorization` header is removed entirely: there is no anonymous
/// placeholder value.
pub struct RequestAuthenticator<S> {
    store: SessionStore<S>,
    default_headers: Arc<RwLock<HeaderMap>>,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for RequestAuthenticator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            default_headers: self.default_headers.clone(),
        }
    }
}

impl<S: SessionStorage> RequestAuthenticator<S> {
    #[must_use]
    pub fn new(store: SessionStore<S>) -> Self {
        Self {
            store,
            default_headers: Arc::new(RwLock::new(HeaderMap::new())),
        }
    }

    /// Add a header sent with every request until the next logout.
    pub async fn set_default_header(&self, name: HeaderName, value: HeaderValue) {
        self.default_headers.write().await.insert(name, value);
    }

    /// Drop every default header.
    pub async fn clear_default_headers(&self) {
        self.default_headers.write().await.clear();
    }

    /// Apply default headers and the bearer token to `request`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the token cannot be read.
    pub async fn authenticate(&self, request: &mut reqwest::Request) -> Result<(), Error> {
        {
            let defaults = self.default_headers.read().await;
            for (name, value) in defaults.iter() {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }

        let headers = request.headers_mut();
        match self.store.token().await? {
            Some(token) => match bearer_value(&token) {
                Some(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                None => {
                    tracing::warn!("Stored token is not a valid header value, sending without it");
                    headers.remove(AUTHORIZATION);
                }
            },
            None => {
                headers.remove(AUTHORIZATION);
            }
        }
        Ok(())
    }
}

fn bearer_value(token: &IdentityToken) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// REST client for the Yariga API whose every request is authenticated.
pub struct ApiClient<S> {
    config: ClientConfig,
    http: reqwest::Client,
    authenticator: RequestAuthenticator<S>,
}

impl<S: SessionStorage> ApiClient<S> {
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, authenticator: RequestAuthenticator<S>) -> Result<Self, Error> {
        let http = config.http_client()?;
        Ok(Self {
            config,
            http,
            authenticator,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn authenticator(&self) -> &RequestAuthenticator<S> {
        &self.authenticator
    }

    /// Send an authenticated request to `{api_url}/{path}`.
    ///
    /// The response is returned whatever its status: rejecting unauthenticated
    /// calls is the backend's job.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid path, [`Error::Storage`] if the
    /// token cannot be read, or [`Error::Http`]/[`Error::Timeout`] on transport
    /// failure.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let mut builder = self.http.request(method, self.config.endpoint(path)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let mut request = builder.build()?;

        self.authenticator.authenticate(&mut request).await?;

        self.http
            .execute(request)
            .await
            .map_err(|e| Error::from_transport(e, "API request"))
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.send::<()>(Method::GET, path, None).await
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Error> {
        self.send(Method::POST, path, Some(body)).await
    }

    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response, Error> {
        self.send::<()>(Method::DELETE, path, None).await
    }
}
