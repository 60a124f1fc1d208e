use std::sync::Arc;

use crate::error::Error;
use crate::storage::{SessionStorage, StorageBatch};
use crate::types::{IdentityToken, UserProfile};

/// Storage key holding the raw identity token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-serialized [`UserProfile`].
pub const USER_KEY: &str = "user";

/// An established session: token and profile, always together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: IdentityToken,
    pub profile: UserProfile,
}

/// Single owner of persisted session state.
///
/// Cloning is cheap and every clone shares the same storage, so one store can
/// be handed to the session manager and the request authenticator alike.
pub struct SessionStore<S> {
    storage: Arc<S>,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: SessionStorage> SessionStore<S> {
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::from_shared(Arc::new(storage))
    }

    #[must_use]
    pub fn from_shared(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Underlying storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Read the persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backend read fails.
    pub async fn token(&self) -> Result<Option<IdentityToken>, Error> {
        Ok(self.get(TOKEN_KEY).await?.map(IdentityToken::from))
    }

    /// Read the persisted profile, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backend read fails, or
    /// [`Error::Serialization`] if the stored profile is not valid JSON.
    pub async fn profile(&self) -> Result<Option<UserProfile>, Error> {
        match self.get(USER_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read the full session from one storage snapshot.
    ///
    /// A token without a profile (or the reverse) is reported as no session.
    ///
    /// # Errors
    ///
    /// Same as [`token`](Self::token) and [`profile`](Self::profile).
    pub async fn read(&self) -> Result<Option<Session>, Error> {
        let values = self
            .storage
            .snapshot(&[TOKEN_KEY, USER_KEY])
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        let mut values = values.into_iter();
        let token = values.next().flatten();
        let user = values.next().flatten();

        match (token, user) {
            (Some(token), Some(user)) => Ok(Some(Session {
                token: IdentityToken::from(token),
                profile: serde_json::from_str(&user)?,
            })),
            (None, None) => Ok(None),
            (token, _) => {
                tracing::warn!(
                    has_token = token.is_some(),
                    "Half-written session in storage, treating as absent"
                );
                Ok(None)
            }
        }
    }

    /// Persist token and profile in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the profile cannot be encoded, or
    /// [`Error::Storage`] if the backend write fails. Nothing is written in
    /// either case.
    pub async fn write(&self, session: &Session) -> Result<(), Error> {
        let user = serde_json::to_string(&session.profile)?;
        let batch = StorageBatch::new()
            .set(USER_KEY, user)
            .set(TOKEN_KEY, session.token.as_str());
        self.apply(batch).await
    }

    /// Remove both keys in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the backend write fails.
    pub async fn clear(&self) -> Result<(), Error> {
        self.apply(StorageBatch::new().remove(TOKEN_KEY).remove(USER_KEY))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.storage
            .get(key)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    async fn apply(&self, batch: StorageBatch) -> Result<(), Error> {
        self.storage
            .apply(batch)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }
}
