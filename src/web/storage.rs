// localStorage-backed single-blob store.

use web_sys::{Storage, window};

use crate::persist::KeyValueStore;

pub struct LocalStorageStore {
    key: String,
}

impl LocalStorageStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Option<Storage> {
        match window()?.local_storage() {
            Ok(s) => s,
            Err(err) => {
                log::warn!("localStorage unavailable: {err:?}");
                None
            }
        }
    }
}

impl KeyValueStore for LocalStorageStore {
    fn load(&self) -> Option<String> {
        match Self::storage()?.get_item(&self.key) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("could not read '{}': {err:?}", self.key);
                None
            }
        }
    }

    fn save(&mut self, blob: &str) {
        let Some(storage) = Self::storage() else {
            return;
        };
        if let Err(err) = storage.set_item(&self.key, blob) {
            log::warn!("could not write '{}': {err:?}", self.key);
        }
    }
}
