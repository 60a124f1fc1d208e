#![doc = include_str!("../README.md")]

pub mod authenticator;
pub mod config;
pub mod credential;
pub mod error;
pub mod manager;
pub mod registration;
pub mod revocation;
pub mod session;
pub mod storage;
pub mod types;

// Re-exports for convenient access
pub use authenticator::{ApiClient, RequestAuthenticator};
pub use config::ClientConfig;
pub use credential::decode_credential;
pub use error::Error;
pub use manager::{
    CheckFailure, ErrorDisposition, LoginSuccess, LogoutOutcome, SessionManager, SessionStatus,
};
pub use registration::{NewUser, RegistrationClient, UserRegistry};
pub use revocation::{IdentityProviderRevoker, NoRevocation, TokenRevoker, spawn_revocation};
pub use session::{Session, SessionStore};
#[cfg(feature = "file-store")]
pub use storage::FileStorage;
pub use storage::{MemoryStorage, SessionStorage, StorageBatch};
pub use types::{IdentityToken, ProfileClaims, UserId, UserProfile};
