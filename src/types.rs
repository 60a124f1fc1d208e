use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use time::OffsetDateTime;

/// Backend-assigned user identifier (the `_id` of the user record).
///
/// Returned by [`UserRegistry::register`](crate::registration::UserRegistry::register)
/// and stored in the profile as `userid`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Opaque bearer credential issued by the identity provider.
///
/// Stored verbatim under the `token` key and sent as `Authorization: Bearer <token>`.
/// There are no local expiry semantics.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct IdentityToken(pub String);

impl IdentityToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityToken(..)")
    }
}

/// Profile claims decoded from an identity-provider credential.
///
/// `name`, `email` and `picture` are required. Any other claim (`sub`, `exp`,
/// `iss`, ...) is kept as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ProfileClaims {
    pub name: String,
    pub email: String,
    pub picture: String,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl ProfileClaims {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        picture: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            picture: picture.into(),
            extra: Map::new(),
        }
    }

    /// Credential expiry (`exp` claim). Informational only, never enforced.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.timestamp_claim("exp")
    }

    /// Credential issue time (`iat` claim).
    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        self.timestamp_claim("iat")
    }

    fn timestamp_claim(&self, key: &str) -> Option<OffsetDateTime> {
        let seconds = self.extra.get(key)?.as_i64()?;
        OffsetDateTime::from_unix_timestamp(seconds).ok()
    }
}

/// Persisted user profile (the `user` key).
///
/// Serialized as the decoded claims plus `avatar` (copy of `picture`) and,
/// once registered, the backend `userid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub picture: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<UserId>,
    #[serde(flatten)]
    pub claims: Map<String, JsonValue>,
}

impl UserProfile {
    /// Build a profile from decoded claims, without a backend user id.
    #[must_use]
    pub fn from_claims(claims: ProfileClaims) -> Self {
        Self {
            avatar: claims.picture.clone(),
            name: claims.name,
            email: claims.email,
            picture: claims.picture,
            userid: None,
            claims: claims.extra,
        }
    }

    /// Set the backend-assigned user id.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.userid = Some(user_id);
        self
    }
}
