//! Durable credential storage

use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

/// Storage key names shared with the page scripts
pub struct StorageKeys;

impl StorageKeys {
    pub const ACCESS_TOKEN: &'static str = "accessToken";
    pub const ID_TOKEN: &'static str = "idToken";
    pub const REFRESH_TOKEN: &'static str = "refreshToken";
    pub const USER_EMAIL: &'static str = "userEmail";
    /// Latest activity seen by any tab, RFC 3339
    pub const LAST_ACTIVITY: &'static str = "lastActivityAt";
}

/// Key-value persistence that survives page reloads.
///
/// There is no locking: every caller runs on the page's single event thread,
/// so a read-modify-write sequence is atomic as long as it does not await in
/// between.
pub trait CredentialStore {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every value
    fn clear(&self) -> Result<()>;
}

/// Signed-in user's tokens and identity
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub user_email: String,
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_email", &self.user_email)
            .finish()
    }
}

/// Typed credential access on top of any [`CredentialStore`]
pub trait CredentialStoreExt: CredentialStore {
    /// The full credential pair, if every field is present
    fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.get(StorageKeys::ACCESS_TOKEN)?,
            id_token: self.get(StorageKeys::ID_TOKEN)?,
            refresh_token: self.get(StorageKeys::REFRESH_TOKEN)?,
            user_email: self.get(StorageKeys::USER_EMAIL)?,
        })
    }

    /// Current refresh token
    fn refresh_token(&self) -> Option<String> {
        self.get(StorageKeys::REFRESH_TOKEN)
            .filter(|token| !token.is_empty())
    }

    /// Persist a freshly issued credential pair
    fn save_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.set(StorageKeys::ACCESS_TOKEN, &pair.access_token)?;
        self.set(StorageKeys::ID_TOKEN, &pair.id_token)?;
        self.set(StorageKeys::REFRESH_TOKEN, &pair.refresh_token)?;
        self.set(StorageKeys::USER_EMAIL, &pair.user_email)
    }

    /// Latest activity recorded by any tab sharing this store
    fn last_activity(&self) -> Option<DateTime<Utc>> {
        let raw = self.get(StorageKeys::LAST_ACTIVITY)?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    fn record_activity(&self, at: DateTime<Utc>) -> Result<()> {
        self.set(
            StorageKeys::LAST_ACTIVITY,
            &at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    }

    /// Overwrite the access and ID tokens, leaving the refresh token in place
    fn write_tokens(&self, access_token: &str, id_token: &str) -> Result<()> {
        let previous = self.get(StorageKeys::ACCESS_TOKEN);
        self.set(StorageKeys::ACCESS_TOKEN, access_token)?;
        if let Err(err) = self.set(StorageKeys::ID_TOKEN, id_token) {
            // never leave a mismatched pair behind
            match previous {
                Some(previous) => self.set(StorageKeys::ACCESS_TOKEN, &previous)?,
                None => self.remove(StorageKeys::ACCESS_TOKEN)?,
            }
            return Err(err);
        }
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStoreExt for S {}

/// In-process store, used off the browser and in tests
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RefCell<BTreeMap<String, String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.borrow_mut().clear();
        Ok(())
    }
}
