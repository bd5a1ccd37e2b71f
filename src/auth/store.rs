//! Credential store: token + identity with defensive reads.

use std::sync::{Arc, RwLock};

use super::credential::{Credential, Identity};
use super::storage::{MemoryStorage, StorageBackend};

/// Storage key for the raw access token.
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key for the serialized identity.
pub const IDENTITY_KEY: &str = "user_data";

/// Holds the current access token and identity.
///
/// Never fails towards the caller: storage and parsing errors are logged and
/// read as "no credential", so a corrupt record degrades to logged-out.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use pagedash::auth::{CredentialStore, Identity, MemoryStorage};
///
/// let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
/// store.set_credential("token-1", &Identity::new(1, "ana@example.com", "Admin", "Ana"));
/// assert!(store.is_authenticated());
/// store.clear();
/// assert!(store.get_token().is_none());
/// ```
pub struct CredentialStore {
    backend: Arc<dyn StorageBackend>,
    // Serializes writes against reads so no reader sees a half-applied update.
    lock: RwLock<()>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            lock: RwLock::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Persist a token and identity together.
    ///
    /// Ignored (with a warning) when the token is blank or the identity has
    /// no email.
    pub fn set_credential(&self, token: &str, identity: &Identity) {
        if token.trim().is_empty() || !identity.is_well_formed() {
            tracing::warn!("refusing to store incomplete credential");
            return;
        }
        let serialized = match serde_json::to_string(&stored_identity(identity)) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize identity");
                return;
            }
        };
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self
            .backend
            .set_items(&[(TOKEN_KEY, token), (IDENTITY_KEY, &serialized)])
        {
            tracing::warn!(error = %err, "failed to persist credential");
        }
    }

    /// Swap the token, keeping the stored identity.
    pub fn replace_token(&self, token: &str) {
        if token.trim().is_empty() {
            tracing::warn!("refusing to store empty token");
            return;
        }
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self.backend.set_item(TOKEN_KEY, token) {
            tracing::warn!(error = %err, "failed to persist token");
        }
    }

    /// Replace the stored identity (e.g. after a profile update), keeping the token.
    pub fn update_identity(&self, identity: &Identity) {
        if !identity.is_well_formed() {
            tracing::warn!("refusing to store identity without email");
            return;
        }
        let serialized = match serde_json::to_string(identity) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize identity");
                return;
            }
        };
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self.backend.set_item(IDENTITY_KEY, &serialized) {
            tracing::warn!(error = %err, "failed to persist identity");
        }
    }

    /// Current token, or `None` when missing or stored as `"undefined"`/`"null"`.
    pub fn get_token(&self) -> Option<String> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        self.read_token()
    }

    /// Current identity, or `None`. Unparseable records are purged.
    pub fn get_identity(&self) -> Option<Identity> {
        let guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        match self.read_identity() {
            IdentityRead::Valid(identity) => Some(identity),
            IdentityRead::Absent => None,
            IdentityRead::Corrupt => {
                drop(guard);
                self.purge_identity();
                None
            }
        }
    }

    /// Token and identity, when both are present.
    pub fn credential(&self) -> Option<Credential> {
        let token = self.get_token()?;
        let identity = self.get_identity()?;
        Some(Credential::new(token, identity))
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some() && self.get_identity().is_some()
    }

    /// Remove token and identity. Idempotent.
    pub fn clear(&self) {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = self.backend.remove_items(&[TOKEN_KEY, IDENTITY_KEY]) {
            tracing::warn!(error = %err, "failed to clear credential");
        }
    }

    fn read_token(&self) -> Option<String> {
        let raw = match self.backend.get_item(TOKEN_KEY) {
            Ok(value) => value?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read token");
                return None;
            }
        };
        if is_placeholder(&raw) {
            return None;
        }
        Some(raw)
    }

    fn read_identity(&self) -> IdentityRead {
        let raw = match self.backend.get_item(IDENTITY_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return IdentityRead::Absent,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read identity");
                return IdentityRead::Absent;
            }
        };
        if raw.trim().is_empty() {
            return IdentityRead::Absent;
        }
        if is_placeholder(&raw) {
            return IdentityRead::Corrupt;
        }
        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "stored identity is not valid JSON");
                return IdentityRead::Corrupt;
            }
        };
        let has_email = value
            .get("email")
            .and_then(|email| email.as_str())
            .is_some_and(|email| !email.trim().is_empty());
        if !value.is_object() || !has_email {
            tracing::warn!("stored identity is missing an email");
            return IdentityRead::Corrupt;
        }
        match serde_json::from_value::<Identity>(value) {
            Ok(identity) => IdentityRead::Valid(identity),
            Err(err) => {
                tracing::warn!(error = %err, "stored identity has an unexpected shape");
                IdentityRead::Corrupt
            }
        }
    }

    fn purge_identity(&self) {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock: a concurrent login may have replaced it.
        if matches!(self.read_identity(), IdentityRead::Corrupt) {
            if let Err(err) = self.backend.remove_item(IDENTITY_KEY) {
                tracing::warn!(error = %err, "failed to purge corrupt identity");
            }
        }
    }
}

enum IdentityRead {
    Valid(Identity),
    Absent,
    Corrupt,
}

fn is_placeholder(raw: &str) -> bool {
    raw == "undefined" || raw == "null"
}

/// The login payload carries extra profile fields; only the core ones are kept.
fn stored_identity(identity: &Identity) -> Identity {
    Identity::new(
        identity.user_id,
        identity.email.clone(),
        identity.role.clone(),
        identity.full_name.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(backend: Arc<MemoryStorage>) -> CredentialStore {
        CredentialStore::new(backend)
    }

    fn ana() -> Identity {
        Identity::new(7, "ana@example.com", "Admin", "Ana Pérez")
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = CredentialStore::in_memory();
        store.set_credential("tok-1", &ana());
        assert_eq!(store.get_token().as_deref(), Some("tok-1"));
        assert_eq!(store.get_identity(), Some(ana()));
        assert!(store.is_authenticated());
    }

    #[test]
    fn clear_is_idempotent() {
        let store = CredentialStore::in_memory();
        store.set_credential("tok-1", &ana());
        store.clear();
        store.clear();
        assert!(store.get_token().is_none());
        assert!(store.get_identity().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn empty_inputs_are_ignored() {
        let store = CredentialStore::in_memory();
        store.set_credential("", &ana());
        assert!(store.get_token().is_none());
        store.set_credential("tok", &Identity::new(1, "", "User", "x"));
        assert!(store.get_token().is_none());
        assert!(store.get_identity().is_none());
    }

    #[test]
    fn placeholder_tokens_read_as_absent() {
        let backend = Arc::new(MemoryStorage::new());
        let store = store_with(backend.clone());
        backend.set_item(TOKEN_KEY, "undefined").unwrap();
        assert!(store.get_token().is_none());
        backend.set_item(TOKEN_KEY, "null").unwrap();
        assert!(store.get_token().is_none());
    }

    #[test]
    fn undefined_identity_is_purged() {
        let backend = Arc::new(MemoryStorage::new());
        let store = store_with(backend.clone());
        backend.set_item(IDENTITY_KEY, "undefined").unwrap();
        assert!(store.get_identity().is_none());
        assert!(backend.get_item(IDENTITY_KEY).unwrap().is_none());
        assert!(store.get_identity().is_none());
    }

    #[test]
    fn malformed_json_identity_is_purged() {
        let backend = Arc::new(MemoryStorage::new());
        let store = store_with(backend.clone());
        backend.set_item(IDENTITY_KEY, "{not json").unwrap();
        assert!(store.get_identity().is_none());
        assert!(backend.get_item(IDENTITY_KEY).unwrap().is_none());
    }

    #[test]
    fn identity_without_email_is_purged() {
        let backend = Arc::new(MemoryStorage::new());
        let store = store_with(backend.clone());
        backend
            .set_item(IDENTITY_KEY, r#"{"idUsuario":1,"fullName":"x"}"#)
            .unwrap();
        assert!(store.get_identity().is_none());
        assert!(backend.get_item(IDENTITY_KEY).unwrap().is_none());

        backend.set_item(IDENTITY_KEY, "[1,2,3]").unwrap();
        assert!(store.get_identity().is_none());
        assert!(backend.get_item(IDENTITY_KEY).unwrap().is_none());
    }

    #[test]
    fn token_without_identity_is_not_authenticated() {
        let backend = Arc::new(MemoryStorage::new());
        let store = store_with(backend.clone());
        backend.set_item(TOKEN_KEY, "tok").unwrap();
        assert_eq!(store.get_token().as_deref(), Some("tok"));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn stored_identity_drops_profile_extras() {
        let store = CredentialStore::in_memory();
        let mut identity = ana();
        identity.telephone = Some("+34 600".to_string());
        store.set_credential("tok", &identity);
        assert_eq!(store.get_identity(), Some(ana()));
    }

    #[test]
    fn update_identity_keeps_token() {
        let store = CredentialStore::in_memory();
        store.set_credential("tok", &ana());
        let mut updated = ana();
        updated.full_name = "Ana María".to_string();
        updated.avatar_url = Some("https://cdn/x.png".to_string());
        store.update_identity(&updated);
        assert_eq!(store.get_token().as_deref(), Some("tok"));
        assert_eq!(store.get_identity(), Some(updated));
    }
}
