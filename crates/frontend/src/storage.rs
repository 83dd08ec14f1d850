//! `localStorage` credential store

use bankscope_core::{CredentialStore, Result, SessionError};
use wasm_bindgen::JsValue;

/// Credentials kept in the page origin's `localStorage`, shared by all tabs
pub struct LocalStorageCredentialStore {
    storage: web_sys::Storage,
}

impl LocalStorageCredentialStore {
    /// Open the origin's storage area
    ///
    /// # Errors
    ///
    /// [`SessionError::Storage`] when the browser disables `localStorage`
    /// (private mode, blocked cookies).
    pub fn open() -> Result<Self> {
        let storage = gloo::utils::window()
            .local_storage()
            .map_err(storage_error)?
            .ok_or_else(|| SessionError::storage("localStorage is not available"))?;
        Ok(Self { storage })
    }
}

fn storage_error(err: JsValue) -> SessionError {
    SessionError::storage(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl CredentialStore for LocalStorageCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set_item(key, value).map_err(storage_error)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(storage_error)
    }

    fn clear(&self) -> Result<()> {
        self.storage.clear().map_err(storage_error)
    }
}
