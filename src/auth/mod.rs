//! Credentials, their storage, and account flows.

pub mod credential;
pub mod error;
pub mod service;
pub mod storage;
pub mod store;

pub use credential::{jwt_expiry, Credential, Identity};
pub use error::AuthError;
pub use service::AuthService;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{CredentialStore, IDENTITY_KEY, TOKEN_KEY};
